use pw_core::{TagEntry, WizardError};

use crate::engine::list::{items_fn, select_fn, with_list_selection, ListItem};
use crate::engine::navigation::field_navigation;
use crate::engine::node::{
    callback, node_handler, MenuOption, NodeArgs, NodeContent, NodeHandler, NodeId, NodeView,
    Transition, Turn,
};

const TAG_SYNTAX: &str = "Tag must be given as 'tagname[;category[;data]]'.";

const TAGS_HELP: &str = "\
Tags classify the spawned entity so it can be searched for. Give them as

    tagname[;category[;data]]

The whole tag is lowercased. Select a tag to rename it.";

pub fn parse_tag(raw: &str) -> Result<TagEntry, String> {
    let lowered = raw.trim().to_lowercase();
    let mut parts = lowered.splitn(3, ';');
    let name = parts.next().unwrap_or_default().trim().to_string();
    if name.is_empty() {
        return Err(TAG_SYNTAX.to_string());
    }
    let category = parts
        .next()
        .map(str::trim)
        .filter(|category| !category.is_empty())
        .map(str::to_string);
    let data = parts.next().map(str::trim).unwrap_or_default().to_string();
    Ok(TagEntry {
        name,
        category,
        data,
    })
}

/// Swaps the tag named `old` for `new` at the same position, or appends `new`
/// when `old` is gone.
pub fn rename_tag(tags: &mut Vec<TagEntry>, old: &str, new: TagEntry) {
    match tags.iter().position(|tag| tag.name == old) {
        Some(index) => {
            tags.remove(index);
            tags.retain(|tag| tag.name != new.name);
            tags.insert(index.min(tags.len()), new);
        }
        None => tags.push(new),
    }
}

pub fn format_tag(tag: &TagEntry) -> String {
    let mut out = tag.name.clone();
    if let Some(category) = &tag.category {
        out.push_str(&format!(" [{}]", category));
    }
    if !tag.data.is_empty() {
        out.push_str(&format!(": {}", tag.data));
    }
    out
}

fn tag_input(turn: &mut Turn<'_>, raw: &str, args: &NodeArgs) -> Result<Transition, WizardError> {
    let entry = parse_tag(raw).map_err(|message| WizardError::input("TAG_SYNTAX", message))?;
    let shown = format_tag(&entry);
    let mut tags = turn.state.template.tags();
    let transition = match args.get("edit") {
        Some(old) => {
            rename_tag(&mut tags, old, entry);
            turn.msg(format!("Renamed tag '{}' to {}.", old, shown));
            Transition::goto(NodeId::Tags)
        }
        None => {
            match tags.iter_mut().find(|tag| tag.name == entry.name) {
                Some(existing) => {
                    *existing = entry;
                    turn.msg(format!("Updated tag {}.", shown));
                }
                None => {
                    tags.push(entry);
                    turn.msg(format!("Added tag {}.", shown));
                }
            }
            Transition::Stay
        }
    };
    turn.state.template.set_tags(&tags);
    Ok(transition)
}

pub(crate) fn tags_node() -> NodeHandler {
    with_list_selection(
        items_fn(|turn| {
            Ok(turn
                .state
                .template
                .tags()
                .iter()
                .map(|tag| ListItem::new(tag.name.clone(), format_tag(tag)))
                .collect())
        }),
        select_fn(|turn, name| {
            turn.msg(format!("Enter the replacement for tag '{}'.", name));
            Ok(Transition::goto_with(
                NodeId::Tags,
                NodeArgs::from([("edit".to_string(), name.to_string())]),
            ))
        }),
        node_handler(|turn, args| {
            let count = turn.state.template.tags().len();
            let mut options = field_navigation(NodeId::Tags);
            let (body, fallback) = match args.get("edit") {
                Some(old) => {
                    options.push(
                        MenuOption::goto("Cancel rename", NodeId::Tags).with_keys(["c", "cancel"]),
                    );
                    (
                        format!("Renaming tag '{}'. Enter the new 'tagname[;category[;data]]'.", old),
                        MenuOption::fallback(callback(tag_input)).with_arg("edit", old.as_str()),
                    )
                }
                None => (
                    format!(
                        "Add a tag as 'tagname[;category[;data]]', or select one to rename it.\n\n\
                         Current tags: {}",
                        count
                    ),
                    MenuOption::fallback(callback(tag_input)),
                ),
            };
            options.push(fallback);
            Ok(NodeView::new(NodeContent::with_help(body, TAGS_HELP), options))
        }),
    )
}

#[cfg(test)]
mod tags_tests {
    use super::*;
    use crate::test_support::{wizard_for, world_with};

    #[test]
    fn tag_input_is_lowercased_whole() {
        let tag = parse_tag("Evil;Alignment;Very Bad").expect("parse");
        assert_eq!(tag.name, "evil");
        assert_eq!(tag.category.as_deref(), Some("alignment"));
        assert_eq!(tag.data, "very bad");
        assert_eq!(parse_tag("  ;x").expect_err("empty"), TAG_SYNTAX);
    }

    #[test]
    fn rename_keeps_position() {
        let mut tags = vec![TagEntry::new("a"), TagEntry::new("b"), TagEntry::new("c")];
        rename_tag(&mut tags, "b", TagEntry::new("z"));
        let names = tags.iter().map(|tag| tag.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["a", "z", "c"]);
    }

    #[test]
    fn select_enters_edit_mode_then_renames() {
        let (mut wizard, _) = wizard_for(world_with(Vec::new(), Vec::new()), None);
        wizard.enter("7");
        wizard.enter("evil;alignment");
        wizard.enter("goblinoid");
        let output = wizard.enter("1");
        assert_eq!(output.node, NodeId::Tags);
        assert_eq!(wizard.state().args.get("edit").map(String::as_str), Some("evil"));

        let output = wizard.enter("Chaotic;Alignment");
        assert!(output.messages[0].starts_with("Renamed tag 'evil'"));
        assert!(wizard.state().args.is_empty());
        let names = wizard
            .template()
            .tags()
            .into_iter()
            .map(|tag| tag.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["chaotic", "goblinoid"]);
    }

    #[test]
    fn cancel_leaves_edit_mode() {
        let (mut wizard, _) = wizard_for(world_with(Vec::new(), Vec::new()), None);
        wizard.enter("7");
        wizard.enter("evil");
        wizard.enter("1");
        wizard.enter("c");
        assert!(wizard.state().args.is_empty());
        assert_eq!(wizard.template().tags().len(), 1);
    }
}
