use pw_core::WizardError;
use serde::{Deserialize, Serialize};

use super::session::SessionState;
use super::{PrototypeWizard, WizardOptions};
use crate::nodes::standard_registry;
use crate::services::Services;

pub const SESSION_SCHEMA_V1: &str = "wizard-session.v1";

/// Serializable form of a live session, owned by the host between turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub schema_version: String,
    pub session: SessionState,
}

impl PrototypeWizard {
    pub fn snapshot(&self) -> Result<SessionSnapshot, WizardError> {
        if self.exited {
            return Err(WizardError::input(
                "SNAPSHOT_NOT_ALLOWED",
                "snapshot() is not allowed after the session has exited.",
            ));
        }
        Ok(SessionSnapshot {
            schema_version: SESSION_SCHEMA_V1.to_string(),
            session: self.state.clone(),
        })
    }

    pub fn resume(
        snapshot: SessionSnapshot,
        services: Services,
        options: WizardOptions,
    ) -> Result<Self, WizardError> {
        if snapshot.schema_version != SESSION_SCHEMA_V1 {
            return Err(WizardError::input(
                "SNAPSHOT_SCHEMA",
                format!(
                    "Unsupported session schema \"{}\"; expected \"{}\".",
                    snapshot.schema_version, SESSION_SCHEMA_V1
                ),
            ));
        }
        let registry = standard_registry();
        registry.validate()?;
        Ok(Self {
            registry,
            services,
            options,
            state: snapshot.session,
            exited: false,
        })
    }
}
