use super::*;
use crate::cli_test_support::*;
use pw_runtime::NodeId;
use std::path::Path;

fn user_args() -> UserArgs {
    UserArgs {
        user: "alice".to_string(),
        permissions: vec!["Builder".to_string()],
        location: Some("#2".to_string()),
    }
}

#[test]
fn agent_start_and_input_paths_are_covered() {
    let catalog = demo_catalog_copy("run-agent");
    let start_state = temp_path("run-start-state.json");
    let input_state = temp_path("run-input-state.json");

    let start_code = run(Cli {
        command: Mode::Agent(AgentArgs {
            command: AgentCommand::Start(StartArgs {
                catalog: catalog.clone(),
                user: user_args(),
                template: Some("goblin_grunt".to_string()),
                seed: Some(4),
                state_out: start_state.to_string_lossy().to_string(),
            }),
        }),
    })
    .expect("agent start should pass");
    assert_eq!(start_code, 0);

    let input_code = run_agent(AgentArgs {
        command: AgentCommand::Input(InputArgs {
            state_in: start_state.to_string_lossy().to_string(),
            text: "4".to_string(),
            state_out: input_state.to_string_lossy().to_string(),
        }),
    })
    .expect("agent input should pass");
    assert_eq!(input_code, 0);

    let (_, wizard) =
        load_session_from_state_for_ref(&input_state).expect("saved state should resume");
    assert_eq!(wizard.current_node(), NodeId::Name);
    assert_eq!(wizard.template().key(), Some("goblin_grunt"));
}

#[test]
fn agent_quit_leaves_no_state_behind() {
    let catalog = demo_catalog_copy("run-agent-quit");
    let start_state = temp_path("run-quit-start.json");
    let quit_state = temp_path("run-quit-end.json");

    agent::run_start(StartArgs {
        catalog,
        user: user_args(),
        template: None,
        seed: None,
        state_out: start_state.to_string_lossy().to_string(),
    })
    .expect("start should pass");
    let code = agent::run_input(InputArgs {
        state_in: start_state.to_string_lossy().to_string(),
        text: "quit".to_string(),
        state_out: quit_state.to_string_lossy().to_string(),
    })
    .expect("quit should pass");
    assert_eq!(code, 0);
    assert!(!quit_state.exists());
}

#[test]
fn agent_start_reports_missing_catalog_and_template() {
    let error = agent::run_start(StartArgs {
        catalog: temp_path("no-catalog").to_string_lossy().to_string(),
        user: user_args(),
        template: None,
        seed: None,
        state_out: temp_path("unused.json").to_string_lossy().to_string(),
    })
    .expect_err("missing catalog should fail");
    assert_eq!(error.code, "CLI_CATALOG_NOT_FOUND");

    let error = agent::run_start(StartArgs {
        catalog: demo_catalog_copy("run-missing-template"),
        user: user_args(),
        template: Some("dragon".to_string()),
        seed: None,
        state_out: temp_path("unused.json").to_string_lossy().to_string(),
    })
    .expect_err("unknown template should fail");
    assert_eq!(error.code, "API_TEMPLATE_NOT_FOUND");
}

#[test]
fn parse_errors_and_missing_state_exit_non_zero() {
    let parse_code = run_cli_from_args(["pw-cli", "agent", "unknown"]);
    assert_ne!(parse_code, 0);

    let missing = temp_path("missing-state.json").to_string_lossy().to_string();
    let code = run_cli_from_args([
        "pw-cli",
        "agent",
        "input",
        "--state-in",
        missing.as_str(),
        "--text",
        "1",
        "--state-out",
        "unused.json",
    ]);
    assert_eq!(code, 1);
    assert!(!Path::new("unused.json").exists());
}
