use std::path::PathBuf;

use pw_core::UserContext;
use pw_runtime::{Services, SessionSnapshot};
use serde::{Deserialize, Serialize};

pub(crate) const PLAYER_STATE_SCHEMA: &str = "wizard-player-state.v1";

#[derive(Clone)]
pub(crate) struct LoadedCatalog {
    pub(crate) id: String,
    pub(crate) dir: PathBuf,
    pub(crate) services: Services,
}

/// What the agent CLI keeps between invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlayerState {
    pub(crate) schema_version: String,
    pub(crate) catalog_id: String,
    pub(crate) snapshot: SessionSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TuiCommandAction {
    NotHandled,
    Continue,
    RefreshTurn,
    Quit,
}

/// Everything `:restart` and `:load` need to build a new session.
pub(crate) struct TuiCommandContext<'a> {
    pub(crate) state_file: &'a str,
    pub(crate) catalog: &'a LoadedCatalog,
    pub(crate) user: &'a UserContext,
    pub(crate) template: Option<&'a str>,
    pub(crate) seed: Option<u32>,
}
