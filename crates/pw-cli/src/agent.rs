use std::path::Path;

use pw_core::WizardError;
use pw_runtime::{PrototypeWizard, TurnOutput};

use crate::{
    emit_turn_with_saved_state, load_catalog_by_dir, load_session_from_state_for_ref,
    start_session, user_from_args, AgentArgs, AgentCommand, InputArgs, StartArgs,
};

pub(super) fn run_agent(args: AgentArgs) -> Result<i32, WizardError> {
    match args.command {
        AgentCommand::Start(args) => run_start(args),
        AgentCommand::Input(args) => run_input(args),
    }
}

pub(super) fn run_start(args: StartArgs) -> Result<i32, WizardError> {
    let catalog = load_catalog_by_dir(&args.catalog)?;
    let user = user_from_args(&args.user);
    let mut wizard = start_session(&catalog, &user, args.template.as_deref(), args.seed)?;

    let output = wizard.look();
    emit_turn_with_saved_state(&wizard, &output, &args.state_out, &catalog.id)
}

pub(super) fn run_input(args: InputArgs) -> Result<i32, WizardError> {
    run_state_transition(&args.state_in, &args.state_out, |wizard| {
        wizard.enter(&args.text)
    })
}

fn run_state_transition(
    state_in: &str,
    state_out: &str,
    transition: impl FnOnce(&mut PrototypeWizard) -> TurnOutput,
) -> Result<i32, WizardError> {
    let (catalog, mut wizard) = load_session_from_state_for_ref(Path::new(state_in))?;
    let output = transition(&mut wizard);
    emit_turn_with_saved_state(&wizard, &output, state_out, &catalog.id)
}
