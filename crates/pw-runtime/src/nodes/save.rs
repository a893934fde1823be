use pw_core::WizardError;
use tracing::info;

use super::update::begin_update;
use super::{describe_template, validate_current};
use crate::engine::navigation::navigation_options;
use crate::engine::node::{
    callback, MenuOption, NodeArgs, NodeContent, NodeId, NodeView, Transition, Turn,
};

fn save_navigation() -> Vec<MenuOption> {
    navigation_options(Some(NodeId::Save), Some(NodeId::Index), Some(NodeId::Spawn))
}

pub(crate) fn save_node(turn: &mut Turn<'_>, args: &NodeArgs) -> Result<NodeView, WizardError> {
    if args.contains_key("saved") {
        if let Some(key) = turn.state.template.key().map(str::to_lowercase) {
            return saved_view(turn, &key);
        }
    }

    let report = validate_current(turn)?;
    let mut options = Vec::new();
    let body = if report.is_fatal() {
        format!(
            "{}\n\n{}\n\nThe errors above need to be corrected before the template can be saved.",
            describe_template(&turn.state.template),
            report.to_text()
        )
    } else if let Some(key) = turn.state.template.key().map(str::to_lowercase) {
        let exists = !turn.services.registry.search(Some(&key))?.is_empty();
        options.push(
            MenuOption::invoke("Yes", callback(accept_save)).with_keys(["y", "yes"]),
        );
        options.push(MenuOption::goto("No", NodeId::Index).with_keys(["n", "no"]));
        let question = if exists {
            format!("Template '{}' already exists. Overwrite it?", key)
        } else {
            format!("Save template '{}' to the catalog?", key)
        };
        format!(
            "{}\n\n{}\n\n{}",
            describe_template(&turn.state.template),
            report.to_text(),
            question
        )
    } else {
        options.push(MenuOption::goto("Set the key", NodeId::Key));
        "The template needs a key before it can be saved.".to_string()
    };
    options.extend(save_navigation());
    Ok(NodeView::new(NodeContent::text(body), options))
}

fn saved_view(turn: &mut Turn<'_>, key: &str) -> Result<NodeView, WizardError> {
    let count = turn.services.registry.objects_using(key)?.len();
    let mut options = Vec::new();
    let body = if count > 0 {
        options.push(
            MenuOption::invoke("Yes", callback(begin_update))
                .with_keys(["y", "yes"])
                .with_arg("back", NodeId::Index.as_str()),
        );
        options.push(MenuOption::goto("No", NodeId::Spawn).with_keys(["n", "no"]));
        format!(
            "{} existing instances were spawned from '{}'. Review changes to them now?",
            count, key
        )
    } else {
        options.push(MenuOption::goto("Spawn an instance", NodeId::Spawn));
        format!("Template '{}' is in the catalog.", key)
    };
    options.extend(save_navigation());
    Ok(NodeView::new(NodeContent::text(body), options))
}

fn accept_save(turn: &mut Turn<'_>, _raw: &str, _args: &NodeArgs) -> Result<Transition, WizardError> {
    let key = turn.state.template.key().map(str::to_lowercase).ok_or_else(|| {
        WizardError::input("TEMPLATE_KEY_MISSING", "A template needs a key to be saved.")
    })?;
    let report = validate_current(turn)?;
    if report.is_fatal() {
        return Err(WizardError::validation(
            "TEMPLATE_INVALID",
            report.fatal_messages().join(" "),
        ));
    }
    if let Some(existing) = turn.services.registry.search(Some(&key))?.into_iter().next() {
        if !turn.services.access.can_edit(&turn.state.user, &existing) {
            return Err(WizardError::permission(
                "TEMPLATE_EDIT_DENIED",
                format!("You don't have permission to overwrite template '{}'.", key),
            ));
        }
    }
    turn.services.registry.save(&turn.state.template)?;
    turn.state.is_new = false;
    info!(key = %key, user = %turn.state.user.name, "template saved from wizard");
    turn.msg(format!("Template '{}' saved.", key));
    Ok(Transition::goto_with(
        NodeId::Save,
        NodeArgs::from([("saved".to_string(), "true".to_string())]),
    ))
}
