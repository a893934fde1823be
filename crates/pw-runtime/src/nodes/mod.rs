mod attrs;
mod choose;
mod fields;
mod index;
mod save;
mod spawn;
mod tags;
mod update;

pub use attrs::{format_attr, parse_attr, upsert_attr};
pub use tags::{format_tag, parse_tag, rename_tag};

use pw_core::{fields as f, PwValue, Template, ValidationReport, WizardError};

use crate::engine::node::{node_handler, NodeId, NodeRegistry, Turn};
use crate::flatten::flatten_template;

/// Every wizard node, keyed by its identifier.
pub fn standard_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    registry
        .register(NodeId::Index, node_handler(index::index_node))
        .register(NodeId::Validate, node_handler(index::validate_node))
        .register(NodeId::Key, node_handler(fields::key_node))
        .register(NodeId::Parent, choose::parent_node())
        .register(NodeId::Kind, choose::kind_node())
        .register(NodeId::Attrs, attrs::attrs_node())
        .register(NodeId::Tags, tags::tags_node())
        .register(NodeId::Save, node_handler(save::save_node))
        .register(NodeId::Spawn, node_handler(spawn::spawn_node))
        .register(NodeId::Load, choose::load_node())
        .register(NodeId::UpdateInstances, node_handler(update::update_node));
    for field_node in fields::FIELD_NODES {
        registry.register(field_node.node, fields::field_node(field_node));
    }
    registry
}

/// The in-progress template with inherited values filled in. Falls back to
/// the raw template when the parent chain is broken.
pub(crate) fn flat_template(turn: &Turn<'_>) -> Template {
    flatten_template(&turn.state.template, turn.services.registry.as_ref())
        .unwrap_or_else(|_| turn.state.template.clone())
}

pub(crate) fn validate_current(turn: &Turn<'_>) -> Result<ValidationReport, WizardError> {
    Ok(turn
        .services
        .instantiation
        .instantiate(&turn.state.template, None, true)?
        .report)
}

pub(crate) fn current_value_line(turn: &Turn<'_>, field: &str) -> String {
    if let Some(value) = turn.state.template.get(field).filter(|v| !v.is_blank()) {
        return format!("Current {}: {}", field, summary(field, value));
    }
    match flat_template(turn).get(field).filter(|v| !v.is_blank()) {
        Some(value) => format!("Current {} (inherited): {}", field, summary(field, value)),
        None => format!("[No {} set]", field),
    }
}

/// One-line form of a field value; attribute and tag rows show names only.
pub(crate) fn summary(field: &str, value: &PwValue) -> String {
    match field {
        f::ATTRS | f::TAGS => value
            .as_array()
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| row.as_array()?.first()?.as_str().map(str::to_string))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default(),
        _ => value.to_text(),
    }
}

const DISPLAY_ORDER: [&str; 15] = [
    f::KEY,
    f::PARENT,
    f::KIND,
    f::NAME,
    f::ALIASES,
    f::ATTRS,
    f::TAGS,
    f::LOCKS,
    f::PERMISSIONS,
    f::LOCATION,
    f::HOME,
    f::DESTINATION,
    f::TEMPLATE_DESC,
    f::TEMPLATE_TAGS,
    f::TEMPLATE_LOCKS,
];

/// Multi-line listing of a template for validation and examine output.
pub fn describe_template(template: &Template) -> String {
    if template.is_empty() {
        return "(empty template)".to_string();
    }
    let extra = template
        .fields()
        .keys()
        .filter(|field| !DISPLAY_ORDER.contains(&field.as_str()))
        .map(String::as_str)
        .collect::<Vec<_>>();

    let mut lines = Vec::new();
    for field in DISPLAY_ORDER.iter().copied().chain(extra) {
        let Some(value) = template.get(field) else {
            continue;
        };
        match field {
            f::ATTRS => {
                lines.push("attrs:".to_string());
                lines.extend(template.attrs().iter().map(|attr| format!("  {}", format_attr(attr))));
            }
            f::TAGS => {
                lines.push("tags:".to_string());
                lines.extend(template.tags().iter().map(|tag| format!("  {}", format_tag(tag))));
            }
            _ => lines.push(format!("{}: {}", field, value.to_text())),
        }
    }
    lines.join("\n")
}
