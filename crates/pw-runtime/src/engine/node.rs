use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use pw_core::{Template, WizardError};
use serde::{Deserialize, Serialize};

use super::session::SessionState;
use super::WizardOptions;
use crate::services::Services;

pub type NodeArgs = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeId {
    Index,
    Validate,
    Key,
    Parent,
    Kind,
    Name,
    Aliases,
    Attrs,
    Tags,
    Locks,
    Permissions,
    Location,
    Home,
    Destination,
    TemplateDesc,
    TemplateTags,
    TemplateLocks,
    Save,
    Spawn,
    Load,
    UpdateInstances,
}

impl NodeId {
    pub const ALL: [NodeId; 21] = [
        NodeId::Index,
        NodeId::Validate,
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
        NodeId::Save,
        NodeId::Spawn,
        NodeId::Load,
        NodeId::UpdateInstances,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Validate => "validate",
            Self::Key => "key",
            Self::Parent => "parent",
            Self::Kind => "kind",
            Self::Name => "name",
            Self::Aliases => "aliases",
            Self::Attrs => "attrs",
            Self::Tags => "tags",
            Self::Locks => "locks",
            Self::Permissions => "permissions",
            Self::Location => "location",
            Self::Home => "home",
            Self::Destination => "destination",
            Self::TemplateDesc => "template_desc",
            Self::TemplateTags => "template_tags",
            Self::TemplateLocks => "template_locks",
            Self::Save => "save",
            Self::Spawn => "spawn",
            Self::Load => "load",
            Self::UpdateInstances => "update_instances",
        }
    }

    /// Menu label, e.g. `Template-Desc`.
    pub fn label(self) -> String {
        self.as_str()
            .split('_')
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join("-")
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeId {
    type Err = WizardError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        NodeId::ALL
            .iter()
            .copied()
            .find(|node| node.as_str() == value)
            .ok_or_else(|| {
                WizardError::internal(
                    "WIZARD_NODE_UNKNOWN",
                    format!("Node \"{}\" is not a known wizard node.", value),
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeContent {
    pub body: String,
    pub help: Option<String>,
}

impl NodeContent {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            help: None,
        }
    }

    pub fn with_help(body: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            help: Some(help.into()),
        }
    }
}

pub type Callback =
    Arc<dyn Fn(&mut Turn<'_>, &str, &NodeArgs) -> Result<Transition, WizardError> + Send + Sync>;

pub type NodeHandler =
    Arc<dyn Fn(&mut Turn<'_>, &NodeArgs) -> Result<NodeView, WizardError> + Send + Sync>;

pub fn callback<F>(f: F) -> Callback
where
    F: Fn(&mut Turn<'_>, &str, &NodeArgs) -> Result<Transition, WizardError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

pub fn node_handler<F>(f: F) -> NodeHandler
where
    F: Fn(&mut Turn<'_>, &NodeArgs) -> Result<NodeView, WizardError> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[derive(Clone)]
pub enum OptionTarget {
    Goto { node: NodeId, args: NodeArgs },
    Invoke { handler: Callback, args: NodeArgs },
}

impl fmt::Debug for OptionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Goto { node, args } => f
                .debug_struct("Goto")
                .field("node", node)
                .field("args", args)
                .finish(),
            Self::Invoke { args, .. } => f
                .debug_struct("Invoke")
                .field("args", args)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionRole {
    Plain,
    Nav,
    Item,
}

#[derive(Debug, Clone)]
pub struct MenuOption {
    pub label: String,
    pub keys: Vec<String>,
    pub desc: Option<String>,
    pub target: OptionTarget,
    pub role: OptionRole,
    pub is_default: bool,
}

impl MenuOption {
    pub fn goto(label: impl Into<String>, node: NodeId) -> Self {
        Self {
            label: label.into(),
            keys: Vec::new(),
            desc: None,
            target: OptionTarget::Goto {
                node,
                args: NodeArgs::new(),
            },
            role: OptionRole::Plain,
            is_default: false,
        }
    }

    pub fn invoke(label: impl Into<String>, handler: Callback) -> Self {
        Self {
            label: label.into(),
            keys: Vec::new(),
            desc: None,
            target: OptionTarget::Invoke {
                handler,
                args: NodeArgs::new(),
            },
            role: OptionRole::Plain,
            is_default: false,
        }
    }

    /// Receives any input that matches no other option.
    pub fn fallback(handler: Callback) -> Self {
        Self {
            is_default: true,
            ..Self::invoke("_default", handler)
        }
    }

    pub fn fallback_goto(node: NodeId) -> Self {
        Self {
            is_default: true,
            ..Self::goto("_default", node)
        }
    }

    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    pub fn with_arg(mut self, name: &str, value: impl Into<String>) -> Self {
        match &mut self.target {
            OptionTarget::Goto { args, .. } | OptionTarget::Invoke { args, .. } => {
                args.insert(name.to_string(), value.into());
            }
        }
        self
    }

    pub fn with_role(mut self, role: OptionRole) -> Self {
        self.role = role;
        self
    }

    pub fn nav(self) -> Self {
        self.with_role(OptionRole::Nav)
    }

    pub fn matches_key(&self, input: &str) -> bool {
        self.keys.iter().any(|key| key.eq_ignore_ascii_case(input))
    }
}

/// Visible page of a list sub-flow. Item options come first in `NodeView::options`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListWindow {
    pub total: usize,
    pub page: usize,
    pub pages: usize,
    pub page_size: usize,
}

impl ListWindow {
    pub fn visible_range(&self) -> std::ops::Range<usize> {
        let start = (self.page * self.page_size).min(self.total);
        let end = (start + self.page_size).min(self.total);
        start..end
    }
}

#[derive(Debug, Clone)]
pub struct NodeView {
    pub content: NodeContent,
    pub options: Vec<MenuOption>,
    pub list: Option<ListWindow>,
}

impl NodeView {
    pub fn new(content: NodeContent, options: Vec<MenuOption>) -> Self {
        Self {
            content,
            options,
            list: None,
        }
    }

    pub fn default_option(&self) -> Option<&MenuOption> {
        self.options.iter().find(|option| option.is_default)
    }

    /// Options addressed by position: no keys and not the fallback.
    pub fn numbered_options(&self) -> impl Iterator<Item = &MenuOption> {
        self.options
            .iter()
            .filter(|option| !option.is_default && option.keys.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Goto { node: NodeId, args: NodeArgs },
    /// Re-render the current node.
    Stay,
    Exit,
}

impl Transition {
    pub fn goto(node: NodeId) -> Self {
        Self::Goto {
            node,
            args: NodeArgs::new(),
        }
    }

    pub fn goto_with(node: NodeId, args: NodeArgs) -> Self {
        Self::Goto { node, args }
    }
}

/// Everything a handler may touch during one user turn.
pub struct Turn<'a> {
    pub state: &'a mut SessionState,
    pub services: &'a Services,
    pub options: &'a WizardOptions,
    outbox: &'a mut Vec<String>,
}

impl<'a> Turn<'a> {
    pub fn new(
        state: &'a mut SessionState,
        services: &'a Services,
        options: &'a WizardOptions,
        outbox: &'a mut Vec<String>,
    ) -> Self {
        Self {
            state,
            services,
            options,
            outbox,
        }
    }

    pub fn msg(&mut self, text: impl Into<String>) {
        self.outbox.push(text.into());
    }

    pub fn template(&self) -> &Template {
        &self.state.template
    }
}

#[derive(Clone, Default)]
pub struct NodeRegistry {
    handlers: BTreeMap<NodeId, NodeHandler>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, node: NodeId, handler: NodeHandler) -> &mut Self {
        self.handlers.insert(node, handler);
        self
    }

    pub fn get(&self, node: NodeId) -> Result<NodeHandler, WizardError> {
        self.handlers.get(&node).cloned().ok_or_else(|| {
            WizardError::internal(
                "WIZARD_NODE_UNREGISTERED",
                format!("Node \"{}\" has no registered handler.", node),
            )
        })
    }

    /// Every node identifier must have a handler before a session starts.
    pub fn validate(&self) -> Result<(), WizardError> {
        let missing = NodeId::ALL
            .iter()
            .filter(|node| !self.handlers.contains_key(node))
            .map(|node| node.as_str())
            .collect::<Vec<_>>();
        if missing.is_empty() {
            return Ok(());
        }
        Err(WizardError::internal(
            "WIZARD_NODE_UNREGISTERED",
            format!("Nodes without handlers: {}.", missing.join(", ")),
        ))
    }
}
