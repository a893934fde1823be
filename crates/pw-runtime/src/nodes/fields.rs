use pw_core::{fields, PwValue, WizardError};
use tracing::info;

use super::current_value_line;
use crate::engine::field::{processors, set_field};
use crate::engine::navigation::{chain_neighbors, field_navigation};
use crate::engine::node::{
    callback, node_handler, MenuOption, NodeArgs, NodeContent, NodeHandler, NodeId, NodeView,
    Transition, Turn,
};

#[derive(Clone, Copy)]
pub(crate) struct FieldNode {
    pub node: NodeId,
    pub field: &'static str,
    pub intro: &'static str,
    pub help: &'static str,
    pub processor: fn(&str) -> Result<PwValue, String>,
}

pub(crate) const FIELD_NODES: [FieldNode; 10] = [
    FieldNode {
        node: NodeId::Name,
        field: fields::NAME,
        intro: "Enter the display name of the spawned entity.",
        help: "The name is what players see. Aliases are set on the next page. \
               Embedded expressions such as ${choice([\"Grik\", \"Snot\"])} are evaluated at spawn.",
        processor: processors::strip,
    },
    FieldNode {
        node: NodeId::Aliases,
        field: fields::ALIASES,
        intro: "Enter alternative names, separated by commas.",
        help: "Aliases let players refer to the entity by other names, e.g. 'gob, grunt'.",
        processor: processors::comma_list,
    },
    FieldNode {
        node: NodeId::Locks,
        field: fields::LOCKS,
        intro: "Enter the lock string of the spawned entity.",
        help: "Locks are written as 'type:func(args);type:func(args)', e.g. \
               'get:false();call:perm(Builder)'.",
        processor: processors::strip,
    },
    FieldNode {
        node: NodeId::Permissions,
        field: fields::PERMISSIONS,
        intro: "Enter the permissions of the spawned entity, separated by commas.",
        help: "Permissions are checked by locks of type perm(...), e.g. 'Builder, Helper'.",
        processor: processors::comma_list,
    },
    FieldNode {
        node: NodeId::Location,
        field: fields::LOCATION,
        intro: "Enter where the entity should appear when spawned.",
        help: "Usually an id like #2. Leave it empty to choose the location when spawning.",
        processor: processors::strip,
    },
    FieldNode {
        node: NodeId::Home,
        field: fields::HOME,
        intro: "Enter the home location of the spawned entity.",
        help: "The home is where the entity goes when its location is removed.",
        processor: processors::strip,
    },
    FieldNode {
        node: NodeId::Destination,
        field: fields::DESTINATION,
        intro: "Enter the destination of the spawned entity.",
        help: "Only exits use a destination. Leave it empty for anything else.",
        processor: processors::strip,
    },
    FieldNode {
        node: NodeId::TemplateDesc,
        field: fields::TEMPLATE_DESC,
        intro: "Enter a short description of this template for the catalog.",
        help: "The description is only shown when browsing templates. It is not copied \
               onto spawned entities.",
        processor: processors::strip,
    },
    FieldNode {
        node: NodeId::TemplateTags,
        field: fields::TEMPLATE_TAGS,
        intro: "Enter catalog tags for this template, separated by commas.",
        help: "Template tags group templates when searching the catalog. They are lowercased.",
        processor: processors::lower_comma_list,
    },
    FieldNode {
        node: NodeId::TemplateLocks,
        field: fields::TEMPLATE_LOCKS,
        intro: "Enter the locks of this template, e.g. 'edit:perm(Builder);spawn:all()'.",
        help: "The 'edit' lock decides who may change or overwrite the template. \
               The 'spawn' lock decides who may spawn from it.",
        processor: processors::strip,
    },
];

pub(crate) fn field_node(def: FieldNode) -> NodeHandler {
    let next = chain_neighbors(def.node)
        .map(|(_, next)| next)
        .unwrap_or(NodeId::Index);
    node_handler(move |turn, _args| {
        let body = format!("{}\n\n{}", def.intro, current_value_line(turn, def.field));
        let mut options = field_navigation(def.node);
        options.push(MenuOption::fallback(callback(move |turn, raw, _args| {
            Ok(set_field(turn, raw, def.field, Some(&def.processor), next))
        })));
        Ok(NodeView::new(NodeContent::with_help(body, def.help), options))
    })
}

const KEY_HELP: &str = "\
The key identifies the template in the catalog and must be unique. It is \
stored lowercase. Entering the key of an existing template while this one is \
new loads that template for editing instead.";

pub(crate) fn key_node(turn: &mut Turn<'_>, _args: &NodeArgs) -> Result<NodeView, WizardError> {
    let body = format!(
        "Enter the unique key of this template.\n\n{}",
        current_value_line(turn, fields::KEY)
    );
    let mut options = field_navigation(NodeId::Key);
    options.push(MenuOption::fallback(callback(accept_key)));
    Ok(NodeView::new(NodeContent::with_help(body, KEY_HELP), options))
}

fn accept_key(turn: &mut Turn<'_>, raw: &str, _args: &NodeArgs) -> Result<Transition, WizardError> {
    let key = raw.trim().to_lowercase();
    if key.is_empty() {
        return Ok(Transition::goto(NodeId::Parent));
    }
    if let Some(existing) = turn.services.registry.search(Some(&key))?.into_iter().next() {
        if !turn.services.access.can_edit(&turn.state.user, &existing) {
            return Err(WizardError::permission(
                "TEMPLATE_EDIT_DENIED",
                format!(
                    "Template '{}' already exists and you don't have permission to edit it.",
                    key
                ),
            ));
        }
        if turn.state.is_new {
            let discarded = !turn.state.template.is_empty();
            turn.state.template = existing;
            turn.state.is_new = false;
            turn.state.update = None;
            info!(key = %key, "existing template reloaded");
            turn.msg(if discarded {
                "Template already exists. Reloading it in place of the new, unsaved template."
            } else {
                "Template already exists. Reloading."
            });
            return Ok(Transition::goto(NodeId::Index));
        }
    }
    Ok(set_field(
        turn,
        &key,
        fields::KEY,
        Some(&processors::template_key),
        NodeId::Parent,
    ))
}

#[cfg(test)]
mod fields_tests {
    use super::*;
    use crate::test_support::{wizard_for, world_with};
    use pw_core::{PwValue, Template};

    #[test]
    fn field_nodes_write_and_advance() {
        let (mut wizard, _) = wizard_for(world_with(Vec::new(), Vec::new()), None);
        wizard.enter("4");
        let output = wizard.enter("Grik the Goblin");
        assert_eq!(output.node, NodeId::Aliases);
        assert!(output.messages[0].starts_with(" Set name to \"Grik the Goblin\"."));
        let output = wizard.enter("grik, gob");
        assert_eq!(output.node, NodeId::Attrs);
        assert_eq!(
            wizard.template().get(fields::ALIASES),
            Some(&PwValue::string_list(["grik", "gob"]))
        );
    }

    #[test]
    fn back_then_forward_keeps_template() {
        let (mut wizard, _) = wizard_for(world_with(Vec::new(), Vec::new()), None);
        wizard.enter("4");
        wizard.enter("Grik");
        let before = wizard.template().clone();
        for node in [NodeId::Aliases, NodeId::Attrs, NodeId::Tags, NodeId::Locks] {
            assert_eq!(wizard.current_node(), node);
            wizard.enter("b");
            assert_eq!(wizard.enter("f").node, node);
            assert_eq!(wizard.template(), &before);
            wizard.enter("f");
        }
    }

    #[test]
    fn inherited_values_are_shown() {
        let base = Template::new()
            .with(fields::KEY, "base")
            .with(fields::KIND, "Monster")
            .with(fields::HOME, "#5");
        let child = Template::new().with(fields::KEY, "gob").with(fields::PARENT, "base");
        let (mut wizard, _) = wizard_for(world_with(vec![base], Vec::new()), Some(child));
        wizard.enter("11");
        let output = wizard.look();
        assert_eq!(output.node, NodeId::Home);
        assert!(output.text.contains("Current home (inherited): #5"));
    }

    #[test]
    fn key_of_existing_template_reloads_new_session() {
        let goblin = Template::new()
            .with(fields::KEY, "goblin")
            .with(fields::KIND, "Monster");
        let (mut wizard, _) = wizard_for(world_with(vec![goblin.clone()], Vec::new()), None);
        wizard.enter("1");
        let output = wizard.enter("Goblin");
        assert_eq!(output.node, NodeId::Index);
        assert_eq!(output.messages[0], "Template already exists. Reloading.");
        assert_eq!(wizard.template(), &goblin);
        assert!(!wizard.state().is_new);
    }

    #[test]
    fn key_of_locked_template_is_refused() {
        let locked = Template::new()
            .with(fields::KEY, "dragon")
            .with(fields::KIND, "Monster")
            .with(fields::TEMPLATE_LOCKS, "edit:id(bob)");
        let (mut wizard, _) = wizard_for(world_with(vec![locked], Vec::new()), None);
        wizard.enter("1");
        let output = wizard.enter("dragon");
        assert_eq!(output.node, NodeId::Key);
        assert!(output.messages[0].contains("don't have permission"));
        assert!(wizard.template().is_empty());
    }

    #[test]
    fn blank_key_skips_to_parent() {
        let (mut wizard, _) = wizard_for(world_with(Vec::new(), Vec::new()), None);
        wizard.enter("1");
        assert_eq!(wizard.enter("").node, NodeId::Parent);
        assert!(wizard.template().is_empty());
    }
}
