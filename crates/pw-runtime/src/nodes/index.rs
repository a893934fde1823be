use pw_core::{crop_text, fields, WizardError};

use super::{describe_template, summary, validate_current};
use crate::engine::navigation::navigation_options;
use crate::engine::node::{MenuOption, NodeArgs, NodeContent, NodeId, NodeView, Turn};

const INDEX_ENTRIES: [(NodeId, &str); 15] = [
    (NodeId::Key, fields::KEY),
    (NodeId::Parent, fields::PARENT),
    (NodeId::Kind, fields::KIND),
    (NodeId::Name, fields::NAME),
    (NodeId::Aliases, fields::ALIASES),
    (NodeId::Attrs, fields::ATTRS),
    (NodeId::Tags, fields::TAGS),
    (NodeId::Locks, fields::LOCKS),
    (NodeId::Permissions, fields::PERMISSIONS),
    (NodeId::Location, fields::LOCATION),
    (NodeId::Home, fields::HOME),
    (NodeId::Destination, fields::DESTINATION),
    (NodeId::TemplateDesc, fields::TEMPLATE_DESC),
    (NodeId::TemplateTags, fields::TEMPLATE_TAGS),
    (NodeId::TemplateLocks, fields::TEMPLATE_LOCKS),
];

const INDEX_HELP: &str = "\
A template describes how to build a new entity. Edit it field by field, \
validate it, then save it to the catalog or spawn an entity from it.

A key is needed to save the template. A kind must be set, either here or \
through a parent template, before the template can be saved or spawned. \
Inherited values show up on each field page.

Use Back/Forward to walk through the fields in order, or pick one directly.";

pub(crate) fn index_node(turn: &mut Turn<'_>, _args: &NodeArgs) -> Result<NodeView, WizardError> {
    let template = &turn.state.template;
    let title = match template.key() {
        Some(key) => format!("Template wizard: '{}'", key),
        None => "Template wizard: (new template)".to_string(),
    };
    let body = format!(
        "{}\n\nSelect a field to edit it, or validate, save, spawn or load a template.",
        title
    );

    let kind_unresolved = template.parent().is_none() && template.kind().is_none();
    let mut options = Vec::with_capacity(INDEX_ENTRIES.len() + 7);
    for (node, field) in INDEX_ENTRIES {
        let required = match node {
            NodeId::Key => template.key().is_none(),
            NodeId::Parent | NodeId::Kind => kind_unresolved,
            _ => false,
        };
        let option = MenuOption::goto(node.label(), node);
        let option = match template.get(field).filter(|value| !value.is_blank()) {
            Some(value) => option.with_desc(crop_text(&summary(field, value), turn.options.crop_width)),
            None if required => option.with_desc("required"),
            None => option,
        };
        options.push(option);
    }
    options.extend(navigation_options(
        Some(NodeId::Index),
        Some(NodeId::TemplateLocks),
        Some(NodeId::Key),
    ));
    options.push(MenuOption::goto("Save", NodeId::Save).with_keys(["sa", "save"]).nav());
    options.push(MenuOption::goto("Spawn", NodeId::Spawn).with_keys(["sp", "spawn"]).nav());
    options.push(MenuOption::goto("Load", NodeId::Load).with_keys(["lo", "load"]).nav());

    Ok(NodeView::new(NodeContent::with_help(body, INDEX_HELP), options))
}

pub(crate) fn validate_node(turn: &mut Turn<'_>, args: &NodeArgs) -> Result<NodeView, WizardError> {
    let back = args
        .get("back")
        .and_then(|node| node.parse::<NodeId>().ok())
        .unwrap_or(NodeId::Index);
    let report = validate_current(turn)?;
    let body = format!(
        "{}\n\n{}",
        describe_template(&turn.state.template),
        report.to_text()
    );
    let options = navigation_options(None, Some(back), None);
    Ok(NodeView::new(NodeContent::text(body), options))
}
