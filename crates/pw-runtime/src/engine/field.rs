use pw_core::PwValue;
use tracing::debug;

use super::node::{NodeId, Transition, Turn};

/// Turns raw user input into a field value, or explains why it can't.
pub type Processor = dyn Fn(&str) -> Result<PwValue, String>;

pub mod processors {
    use pw_core::PwValue;

    pub fn strip(raw: &str) -> Result<PwValue, String> {
        Ok(PwValue::string(raw.trim()))
    }

    pub fn template_key(raw: &str) -> Result<PwValue, String> {
        Ok(PwValue::string(raw.trim().to_lowercase()))
    }

    pub fn comma_list(raw: &str) -> Result<PwValue, String> {
        split_list(raw, false)
    }

    pub fn lower_comma_list(raw: &str) -> Result<PwValue, String> {
        split_list(raw, true)
    }

    fn split_list(raw: &str, lowercase: bool) -> Result<PwValue, String> {
        if raw.trim().is_empty() {
            return Ok(PwValue::Array(Vec::new()));
        }
        let mut parts = Vec::new();
        for part in raw.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err("empty entry between commas".to_string());
            }
            parts.push(if lowercase {
                part.to_lowercase()
            } else {
                part.to_string()
            });
        }
        Ok(PwValue::string_list(parts))
    }

    /// Accepts any non-empty kind when `known` is empty.
    pub fn kind(raw: &str, known: &[String]) -> Result<PwValue, String> {
        let kind = raw.trim();
        if kind.is_empty() || known.is_empty() {
            return Ok(PwValue::string(kind));
        }
        known
            .iter()
            .find(|candidate| candidate.eq_ignore_ascii_case(kind))
            .map(|candidate| PwValue::string(candidate.as_str()))
            .ok_or_else(|| format!("unknown kind '{}'", kind))
    }
}

/// Writes one field of the in-progress template and moves on to `next`.
/// Blank input skips the field; a processor failure stays on the node.
pub fn set_field(
    turn: &mut Turn<'_>,
    raw: &str,
    field: &str,
    processor: Option<&Processor>,
    next: NodeId,
) -> Transition {
    let value = match processor {
        Some(processor) => match processor(raw) {
            Ok(value) => value,
            Err(reason) => {
                turn.msg(format!(
                    "Could not set {} to '{}' ({}).",
                    field,
                    raw.trim(),
                    reason
                ));
                return Transition::Stay;
            }
        },
        None => PwValue::string(raw),
    };
    if value.is_blank() {
        return Transition::goto(next);
    }

    let shown = serde_json::to_string(&value).unwrap_or_else(|_| value.to_text());
    debug!(field, value = %shown, "field set");
    turn.state.template.set(field, value.clone());

    let mut lines = vec![format!(" Set {} to {}.", field, shown)];
    if turn.options.test_parse {
        lines.push(" Simulating expression parsing ...".to_string());
        let resolved = turn.services.resolver.resolve(&value, true);
        match resolved.warning {
            Some(warning) => lines.push(format!(" Parse warning: {}", warning)),
            None if resolved.value != value => lines.push(format!(
                " (Example) value when parsed: {}",
                resolved.value.to_text()
            )),
            None => lines.push(" No change when parsed.".to_string()),
        }
    }
    turn.msg(lines.join("\n"));
    Transition::goto(next)
}

#[cfg(test)]
mod field_tests {
    use super::processors::*;
    use super::*;
    use crate::engine::session::SessionState;
    use crate::engine::WizardOptions;
    use crate::test_support::{services_for, world_with};
    use pw_core::UserContext;

    fn run(
        state: &mut SessionState,
        options: &WizardOptions,
        raw: &str,
        field: &str,
        processor: Option<&Processor>,
    ) -> (Transition, Vec<String>) {
        let (services, _) = services_for(world_with(Vec::new(), Vec::new()));
        let mut outbox = Vec::new();
        let mut turn = Turn::new(state, &services, options, &mut outbox);
        let transition = set_field(&mut turn, raw, field, processor, NodeId::Aliases);
        (transition, outbox)
    }

    #[test]
    fn writes_value_and_reports_preview() {
        let mut state = SessionState::new(UserContext::new("alice"), None, 1);
        let options = WizardOptions::default();
        let (transition, messages) = run(&mut state, &options, "  Goblin ", "name", Some(&strip));
        assert_eq!(transition, Transition::goto(NodeId::Aliases));
        assert_eq!(state.template.get_str("name"), Some("Goblin"));
        assert_eq!(
            messages[0],
            " Set name to \"Goblin\".\n Simulating expression parsing ...\n No change when parsed."
        );
    }

    #[test]
    fn expression_preview_shows_example() {
        let mut state = SessionState::new(UserContext::new("alice"), None, 1);
        let options = WizardOptions::default();
        let (_, messages) = run(&mut state, &options, "${3 * 4}", "hp", None);
        assert!(messages[0].ends_with(" (Example) value when parsed: 12"));
        let (_, messages) = run(&mut state, &options, "${nope}", "hp", None);
        assert!(messages[0].contains(" Parse warning: "));
        assert_eq!(state.template.get_str("hp"), Some("${nope}"));
    }

    #[test]
    fn blank_input_skips_without_mutation() {
        let mut state = SessionState::new(UserContext::new("alice"), None, 1);
        let options = WizardOptions::default();
        let (transition, messages) = run(&mut state, &options, "   ", "aliases", Some(&comma_list));
        assert_eq!(transition, Transition::goto(NodeId::Aliases));
        assert!(messages.is_empty());
        assert!(state.template.is_empty());
    }

    #[test]
    fn processor_failure_stays_and_keeps_template() {
        let mut state = SessionState::new(UserContext::new("alice"), None, 1);
        let options = WizardOptions::default();
        let (transition, messages) =
            run(&mut state, &options, "gob,,lin", "aliases", Some(&comma_list));
        assert_eq!(transition, Transition::Stay);
        assert!(messages[0].contains("empty entry between commas"));
        assert!(state.template.is_empty());
    }

    #[test]
    fn repeating_the_same_input_is_idempotent() {
        let options = WizardOptions {
            test_parse: false,
            ..WizardOptions::default()
        };
        for (raw, field, processor) in [
            ("Goblin", "name", strip as fn(&str) -> Result<PwValue, String>),
            ("gob, grunt", "aliases", comma_list),
            ("Mob,Evil", "template_tags", lower_comma_list),
            (" GOBLIN ", "key", template_key),
        ] {
            let mut state = SessionState::new(UserContext::new("alice"), None, 1);
            run(&mut state, &options, raw, field, Some(&processor));
            let once = state.template.clone();
            run(&mut state, &options, raw, field, Some(&processor));
            assert_eq!(state.template, once, "{}", field);
        }
    }

    #[test]
    fn list_processors_split_and_lowercase() {
        assert_eq!(
            comma_list(" gob , grunt ").expect("list"),
            PwValue::string_list(["gob", "grunt"])
        );
        assert_eq!(
            lower_comma_list("Mob,EVIL").expect("list"),
            PwValue::string_list(["mob", "evil"])
        );
        assert_eq!(template_key(" Goblin ").expect("key"), PwValue::string("goblin"));
    }

    #[test]
    fn kind_processor_checks_known_kinds() {
        let known = vec!["Monster".to_string()];
        assert_eq!(kind("monster", &known).expect("kind"), PwValue::string("Monster"));
        assert_eq!(
            kind("Dragon", &known).expect_err("unknown"),
            "unknown kind 'Dragon'"
        );
        assert_eq!(kind("Dragon", &[]).expect("free"), PwValue::string("Dragon"));
    }
}
