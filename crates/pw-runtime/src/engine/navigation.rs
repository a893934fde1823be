use super::node::{MenuOption, NodeId};

/// Field nodes in editing order. The chain wraps around at both ends.
pub const FIELD_CHAIN: [NodeId; 16] = [
    NodeId::Index,
    NodeId::Key,
    NodeId::Parent,
    NodeId::Kind,
    NodeId::Name,
    NodeId::Aliases,
    NodeId::Attrs,
    NodeId::Tags,
    NodeId::Locks,
    NodeId::Permissions,
    NodeId::Location,
    NodeId::Home,
    NodeId::Destination,
    NodeId::TemplateDesc,
    NodeId::TemplateTags,
    NodeId::TemplateLocks,
];

/// `(previous, next)` for a node on the field chain.
pub fn chain_neighbors(node: NodeId) -> Option<(NodeId, NodeId)> {
    let position = FIELD_CHAIN.iter().position(|candidate| *candidate == node)?;
    let len = FIELD_CHAIN.len();
    Some((
        FIELD_CHAIN[(position + len - 1) % len],
        FIELD_CHAIN[(position + 1) % len],
    ))
}

/// Back / Forward / Index / Validate for any node.
pub fn navigation_options(
    current: Option<NodeId>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
) -> Vec<MenuOption> {
    let mut options = Vec::new();
    if let Some(prev) = prev {
        options.push(
            MenuOption::goto("Back", prev)
                .with_keys(["b", "back"])
                .with_desc(prev.as_str().replace('_', "-"))
                .nav(),
        );
    }
    if let Some(next) = next {
        options.push(
            MenuOption::goto("Forward", next)
                .with_keys(["f", "forward"])
                .with_desc(next.as_str().replace('_', "-"))
                .nav(),
        );
    }
    let index_is_neighbor = prev == Some(NodeId::Index) || next == Some(NodeId::Index);
    if !index_is_neighbor && current != Some(NodeId::Index) {
        options.push(
            MenuOption::goto("Index", NodeId::Index)
                .with_keys(["i", "index"])
                .nav(),
        );
    }
    if let Some(current) = current {
        options.push(
            MenuOption::goto("Validate", NodeId::Validate)
                .with_keys(["v", "validate"])
                .with_arg("back", current.as_str())
                .nav(),
        );
    }
    options
}

pub fn field_navigation(node: NodeId) -> Vec<MenuOption> {
    match chain_neighbors(node) {
        Some((prev, next)) => navigation_options(Some(node), Some(prev), Some(next)),
        None => navigation_options(Some(node), None, None),
    }
}

#[cfg(test)]
mod navigation_tests {
    use super::*;
    use crate::engine::node::OptionTarget;

    fn target(option: &MenuOption) -> NodeId {
        match &option.target {
            OptionTarget::Goto { node, .. } => *node,
            OptionTarget::Invoke { .. } => panic!("navigation never invokes"),
        }
    }

    #[test]
    fn chain_wraps_at_both_ends() {
        assert_eq!(
            chain_neighbors(NodeId::Index),
            Some((NodeId::TemplateLocks, NodeId::Key))
        );
        assert_eq!(
            chain_neighbors(NodeId::TemplateLocks),
            Some((NodeId::TemplateTags, NodeId::Index))
        );
        assert_eq!(chain_neighbors(NodeId::Save), None);
    }

    #[test]
    fn back_then_forward_returns_for_every_field_node() {
        for node in FIELD_CHAIN {
            let (prev, _) = chain_neighbors(node).expect("on chain");
            let (_, forward_of_prev) = chain_neighbors(prev).expect("on chain");
            assert_eq!(forward_of_prev, node);
        }
    }

    #[test]
    fn index_option_skipped_when_neighbor() {
        let options = field_navigation(NodeId::Key);
        let labels = options.iter().map(|o| o.label.as_str()).collect::<Vec<_>>();
        assert_eq!(labels, vec!["Back", "Forward", "Validate"]);

        let options = field_navigation(NodeId::Name);
        let labels = options.iter().map(|o| o.label.as_str()).collect::<Vec<_>>();
        assert_eq!(labels, vec!["Back", "Forward", "Index", "Validate"]);
        assert_eq!(target(&options[0]), NodeId::Kind);
        assert_eq!(target(&options[1]), NodeId::Aliases);
    }

    #[test]
    fn validate_remembers_origin() {
        let options = navigation_options(Some(NodeId::Home), None, None);
        let validate = options.last().expect("validate option");
        let OptionTarget::Goto { node, args } = &validate.target else {
            panic!("expected goto");
        };
        assert_eq!(*node, NodeId::Validate);
        assert_eq!(args.get("back").map(String::as_str), Some("home"));
    }
}
