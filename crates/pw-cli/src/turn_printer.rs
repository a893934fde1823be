use pw_runtime::TurnOutput;

fn json_line(value: &str) -> String {
    serde_json::to_string(value).expect("string json")
}

/// Agent protocol lines for one turn. Keys are typed back verbatim through
/// `agent input --text`.
pub(crate) fn format_turn(output: &TurnOutput, state_out: Option<&str>) -> Vec<String> {
    let mut lines = vec!["RESULT:OK".to_string()];
    if output.exited {
        lines.push("EVENT:EXIT".to_string());
    } else {
        lines.push("EVENT:INPUT".to_string());
    }
    lines.push(format!("NODE:{}", output.node));

    for message in &output.messages {
        lines.push(format!("MESSAGE_JSON:{}", json_line(message)));
    }
    lines.push(format!("TEXT_JSON:{}", json_line(&output.text)));

    for option in output.options() {
        lines.push(format!("OPTION:{}|{}", option.key, json_line(&option.text)));
    }

    lines.push(format!("STATE_OUT:{}", state_out.unwrap_or("NONE")));
    lines
}

pub(crate) fn emit_turn(output: &TurnOutput, state_out: Option<&str>) {
    for line in format_turn(output, state_out) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod turn_printer_tests {
    use super::*;
    use crate::cli_test_support::*;
    use crate::{load_catalog_by_dir, start_session};

    #[test]
    fn format_turn_lists_node_text_and_options() {
        let catalog = load_catalog_by_dir(&demo_catalog_copy("printer")).expect("catalog");
        let mut wizard = start_session(&catalog, &builder(), None, Some(1)).expect("start");
        let lines = format_turn(&wizard.look(), Some("/tmp/state.json"));

        assert_eq!(lines[0], "RESULT:OK");
        assert_eq!(lines[1], "EVENT:INPUT");
        assert_eq!(lines[2], "NODE:index");
        assert!(lines.iter().any(|line| line.starts_with("TEXT_JSON:\"")));
        assert!(lines.iter().any(|line| line.starts_with("OPTION:1|")));
        assert!(lines.iter().any(|line| line.starts_with("OPTION:sa|")));
        assert_eq!(lines.last().map(String::as_str), Some("STATE_OUT:/tmp/state.json"));
    }

    #[test]
    fn format_turn_after_quit_reports_exit_without_state() {
        let catalog = load_catalog_by_dir(&demo_catalog_copy("printer-quit")).expect("catalog");
        let mut wizard = start_session(&catalog, &builder(), None, None).expect("start");
        let lines = format_turn(&wizard.enter("q"), None);

        assert_eq!(lines[1], "EVENT:EXIT");
        assert!(!lines.iter().any(|line| line.starts_with("OPTION:")));
        assert_eq!(lines.last().map(String::as_str), Some("STATE_OUT:NONE"));
    }
}
