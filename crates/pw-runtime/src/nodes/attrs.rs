use pw_core::{AttrEntry, PwValue, WizardError};

use crate::engine::list::{items_fn, select_fn, with_list_selection, ListItem};
use crate::engine::navigation::field_navigation;
use crate::engine::node::{
    callback, node_handler, MenuOption, NodeArgs, NodeContent, NodeHandler, NodeId, NodeView,
    Transition, Turn,
};

const ATTR_SYNTAX: &str = "Attribute must be given as 'attrname[;category;locks] = <value>'.";

const ATTRS_HELP: &str = "\
Attributes hold arbitrary data on the spawned entity. Give them as

    attrname[;category[;locks]] = value

e.g. 'str;physical;attrread:perm(Builder) = 12'. Only the name is lowercased. \
Adding an attribute with an existing name replaces it. Values may embed \
expressions such as ${random(6) + 1}.";

/// Parses `name[;category[;locks]] = value`.
pub fn parse_attr(raw: &str) -> Result<AttrEntry, String> {
    let Some((lhs, value)) = raw.split_once('=') else {
        return Err(ATTR_SYNTAX.to_string());
    };
    let mut parts = lhs.splitn(3, ';');
    let name = parts.next().unwrap_or_default().trim().to_lowercase();
    if name.is_empty() {
        return Err(ATTR_SYNTAX.to_string());
    }
    let category = parts
        .next()
        .map(str::trim)
        .filter(|category| !category.is_empty())
        .map(str::to_string);
    let locks = parts.next().map(str::trim).unwrap_or_default().to_string();
    Ok(AttrEntry {
        name,
        value: PwValue::string(value.trim()),
        category,
        locks,
    })
}

/// Replaces the entry with the same name in place, or appends. Returns
/// whether an entry was replaced.
pub fn upsert_attr(attrs: &mut Vec<AttrEntry>, entry: AttrEntry) -> bool {
    match attrs.iter_mut().find(|existing| existing.name == entry.name) {
        Some(existing) => {
            *existing = entry;
            true
        }
        None => {
            attrs.push(entry);
            false
        }
    }
}

pub fn format_attr(attr: &AttrEntry) -> String {
    let mut out = format!("{} = {}", attr.name, attr.value.to_text());
    if let Some(category) = &attr.category {
        out.push_str(&format!(" [{}]", category));
    }
    if !attr.locks.is_empty() {
        out.push_str(&format!(" (locks: {})", attr.locks));
    }
    out
}

fn preview_line(turn: &Turn<'_>, value: &PwValue) -> Option<String> {
    let resolved = turn.services.resolver.resolve(value, true);
    match resolved.warning {
        Some(warning) => Some(format!(" Parse warning: {}", warning)),
        None if &resolved.value != value => Some(format!(
            " (Example) value when parsed: {}",
            resolved.value.to_text()
        )),
        None => None,
    }
}

fn add_attr(turn: &mut Turn<'_>, raw: &str, _args: &NodeArgs) -> Result<Transition, WizardError> {
    let entry = parse_attr(raw).map_err(|message| WizardError::input("ATTR_SYNTAX", message))?;
    let mut attrs = turn.state.template.attrs();
    let shown = format_attr(&entry);
    let value = entry.value.clone();
    let replaced = upsert_attr(&mut attrs, entry);
    turn.state.template.set_attrs(&attrs);

    let mut lines = vec![format!(
        "{} attribute {}.",
        if replaced { "Replaced" } else { "Added" },
        shown
    )];
    if turn.options.test_parse {
        lines.extend(preview_line(turn, &value));
    }
    turn.msg(lines.join("\n"));
    Ok(Transition::Stay)
}

fn examine_attr(turn: &mut Turn<'_>, name: &str) -> Result<Transition, WizardError> {
    let Some(attr) = turn
        .state
        .template
        .attrs()
        .into_iter()
        .find(|attr| attr.name == name)
    else {
        turn.msg(format!("Attribute '{}' not found.", name));
        return Ok(Transition::Stay);
    };
    let mut lines = vec![
        format!("Attribute: {}", attr.name),
        format!("Category: {}", attr.category.as_deref().unwrap_or("(none)")),
        format!(
            "Locks: {}",
            if attr.locks.is_empty() { "(none)" } else { attr.locks.as_str() }
        ),
        format!("Value: {}", attr.value.to_text()),
    ];
    lines.extend(preview_line(turn, &attr.value));
    turn.msg(lines.join("\n"));
    Ok(Transition::Stay)
}

pub(crate) fn attrs_node() -> NodeHandler {
    with_list_selection(
        items_fn(|turn| {
            Ok(turn
                .state
                .template
                .attrs()
                .iter()
                .map(|attr| ListItem::new(attr.name.clone(), format_attr(attr)))
                .collect())
        }),
        select_fn(examine_attr),
        node_handler(|turn, _args| {
            let count = turn.state.template.attrs().len();
            let body = format!(
                "Add an attribute as 'attrname[;category;locks] = value', or select one to examine it.\n\n\
                 Current attributes: {}",
                count
            );
            let mut options = field_navigation(NodeId::Attrs);
            options.push(MenuOption::fallback(callback(add_attr)));
            Ok(NodeView::new(NodeContent::with_help(body, ATTRS_HELP), options))
        }),
    )
}
