use std::collections::BTreeSet;

use pw_core::{DiffRecord, FieldMap, Template, UserContext};
use serde::{Deserialize, Serialize};

use super::node::{NodeArgs, NodeId};

pub(crate) const HISTORY_LIMIT: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub node: NodeId,
    #[serde(default)]
    pub args: NodeArgs,
}

/// One in-flight "update existing instances" review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFlow {
    pub template_key: String,
    pub instance_ids: Vec<String>,
    pub sample_id: Option<String>,
    pub sample_name: Option<String>,
    pub snapshot: FieldMap,
    pub diff: DiffRecord,
    pub overrides: BTreeSet<String>,
    pub back: NodeId,
}

/// Everything a wizard session owns between turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub template: Template,
    pub is_new: bool,
    pub node: NodeId,
    #[serde(default)]
    pub args: NodeArgs,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub help_visible: bool,
    #[serde(default)]
    pub list_page: usize,
    #[serde(default)]
    pub update: Option<UpdateFlow>,
    pub rng_state: u32,
    pub user: UserContext,
}

impl SessionState {
    pub fn new(user: UserContext, existing: Option<Template>, rng_state: u32) -> Self {
        Self {
            is_new: existing.is_none(),
            template: existing.unwrap_or_default(),
            node: NodeId::Index,
            args: NodeArgs::new(),
            history: Vec::new(),
            help_visible: false,
            list_page: 0,
            update: None,
            rng_state,
            user,
        }
    }

    pub(crate) fn push_history(&mut self) {
        self.history.push(HistoryEntry {
            node: self.node,
            args: self.args.clone(),
        });
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
    }
}
