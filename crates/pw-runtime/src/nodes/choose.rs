use pw_core::{crop_text, fields, Template, WizardError};
use tracing::info;

use super::{current_value_line, describe_template, flat_template};
use crate::engine::field::{processors, set_field};
use crate::engine::list::{items_fn, select_fn, with_list_selection, ListItem};
use crate::engine::navigation::{field_navigation, navigation_options};
use crate::engine::node::{
    callback, node_handler, MenuOption, NodeArgs, NodeContent, NodeHandler, NodeId, NodeView,
    Transition, Turn,
};

fn template_item(template: &Template, crop_width: usize) -> Option<ListItem> {
    let key = template.key()?;
    let label = match template.get_str(fields::TEMPLATE_DESC) {
        Some(desc) => format!("{} - {}", key, crop_text(desc, crop_width * 3)),
        None => key.to_string(),
    };
    Some(ListItem::new(key, label))
}

fn examine_template(turn: &mut Turn<'_>, raw: &str, _args: &NodeArgs) -> Result<Transition, WizardError> {
    let key = raw.trim();
    match turn.services.registry.search(Some(key))?.into_iter().next() {
        Some(template) => turn.msg(describe_template(&template)),
        None => turn.msg(format!("No template named '{}' was found.", key)),
    }
    Ok(Transition::Stay)
}

const PARENT_HELP: &str = "\
A parent template supplies every field this template does not set itself. \
Parents can have parents of their own. Values set here override inherited \
ones. Type the key of a listed template to examine it.";

pub(crate) fn parent_node() -> NodeHandler {
    with_list_selection(
        items_fn(|turn| {
            let own_key = turn.state.template.key().map(str::to_lowercase);
            Ok(turn
                .services
                .registry
                .search(None)?
                .iter()
                .filter(|template| template.key().map(str::to_lowercase) != own_key)
                .filter_map(|template| template_item(template, turn.options.crop_width))
                .collect())
        }),
        select_fn(|turn, key| {
            Ok(set_field(
                turn,
                key,
                fields::PARENT,
                Some(&processors::strip),
                NodeId::Kind,
            ))
        }),
        node_handler(|turn, _args| {
            let mut body = format!(
                "Select a parent template to inherit from.\n\n{}",
                current_value_line(turn, fields::PARENT)
            );
            if let Some(parent) = turn.state.template.parent() {
                if turn.services.registry.search(Some(parent))?.is_empty() {
                    body.push_str(&format!("\nParent '{}' is not registered.", parent));
                }
            }
            let mut options = field_navigation(NodeId::Parent);
            options.push(MenuOption::fallback(callback(examine_template)));
            Ok(NodeView::new(NodeContent::with_help(body, PARENT_HELP), options))
        }),
    )
}

const KIND_HELP: &str = "\
The kind decides what sort of entity is spawned. It must be set here or by a \
parent template before the template can be saved or spawned. Pick one from the \
list or type its name.";

pub(crate) fn kind_node() -> NodeHandler {
    with_list_selection(
        items_fn(|turn| {
            let instantiation = &turn.services.instantiation;
            Ok(instantiation
                .available_kinds()
                .into_iter()
                .map(|kind| match instantiation.describe_kind(&kind) {
                    Some(desc) => ListItem::new(kind.clone(), format!("{} - {}", kind, desc)),
                    None => ListItem::plain(kind),
                })
                .collect())
        }),
        select_fn(|turn, kind| {
            Ok(set_field(
                turn,
                kind,
                fields::KIND,
                Some(&processors::strip),
                NodeId::Name,
            ))
        }),
        node_handler(|turn, _args| {
            let mut body = format!(
                "Select the kind of entity to spawn.\n\n{}",
                current_value_line(turn, fields::KIND)
            );
            if flat_template(turn).kind().is_none() {
                body.push_str("\nA kind is required, here or in a parent template.");
            }
            let mut options = field_navigation(NodeId::Kind);
            options.push(MenuOption::fallback(callback(|turn, raw, _args| {
                let known = turn.services.instantiation.available_kinds();
                let processor = move |raw: &str| processors::kind(raw, &known);
                Ok(set_field(turn, raw, fields::KIND, Some(&processor), NodeId::Name))
            })));
            Ok(NodeView::new(NodeContent::with_help(body, KIND_HELP), options))
        }),
    )
}

fn load_template(turn: &mut Turn<'_>, key: &str) -> Result<Transition, WizardError> {
    let Some(template) = turn.services.registry.search(Some(key))?.into_iter().next() else {
        turn.msg(format!("Could not find template '{}'.", key));
        return Ok(Transition::Stay);
    };
    if !turn.services.access.can_edit(&turn.state.user, &template) {
        return Err(WizardError::permission(
            "TEMPLATE_EDIT_DENIED",
            format!("You don't have permission to edit template '{}'.", key),
        ));
    }
    turn.state.template = template;
    turn.state.is_new = false;
    turn.state.update = None;
    info!(key = %key, "template loaded");
    turn.msg(format!("Loaded template '{}'.", key));
    Ok(Transition::goto(NodeId::Index))
}

pub(crate) fn load_node() -> NodeHandler {
    with_list_selection(
        items_fn(|turn| {
            Ok(turn
                .services
                .registry
                .search(None)?
                .iter()
                .filter_map(|template| template_item(template, turn.options.crop_width))
                .collect())
        }),
        select_fn(load_template),
        node_handler(|turn, _args| {
            let mut body = "Select a template to load. Type a key to examine it first.".to_string();
            if !turn.state.template.is_empty() {
                body.push_str("\nLoading replaces the template you are editing now.");
            }
            let mut options = navigation_options(Some(NodeId::Load), None, None);
            options.push(MenuOption::fallback(callback(examine_template)));
            Ok(NodeView::new(NodeContent::text(body), options))
        }),
    )
}
