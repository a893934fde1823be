pub mod field;
pub mod list;
pub mod navigation;
pub mod node;
pub mod session;

mod dispatch;
mod render;
mod snapshot;

pub use dispatch::TurnOutput;
pub use render::{rendered_options, RenderedOption};
pub use snapshot::{SessionSnapshot, SESSION_SCHEMA_V1};

use pw_core::{Template, UserContext, WizardError};
use tracing::debug;

use crate::nodes::standard_registry;
use crate::rng::DEFAULT_SEED;
use crate::services::Services;
use node::{NodeId, NodeRegistry};
use session::SessionState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardOptions {
    pub random_seed: Option<u32>,
    /// Preview every field write through the resolver.
    pub test_parse: bool,
    pub page_size: usize,
    pub crop_width: usize,
}

impl Default for WizardOptions {
    fn default() -> Self {
        Self {
            random_seed: None,
            test_parse: true,
            page_size: 10,
            crop_width: 15,
        }
    }
}

/// One interactive editing session over a single template.
pub struct PrototypeWizard {
    registry: NodeRegistry,
    services: Services,
    options: WizardOptions,
    state: SessionState,
    exited: bool,
}

impl PrototypeWizard {
    pub fn start(
        options: WizardOptions,
        services: Services,
        user: UserContext,
        existing: Option<Template>,
    ) -> Result<Self, WizardError> {
        Self::with_registry(standard_registry(), options, services, user, existing)
    }

    pub fn with_registry(
        registry: NodeRegistry,
        options: WizardOptions,
        services: Services,
        user: UserContext,
        existing: Option<Template>,
    ) -> Result<Self, WizardError> {
        registry.validate()?;
        let seed = options.random_seed.unwrap_or(DEFAULT_SEED);
        let state = SessionState::new(user, existing, seed);
        debug!(user = %state.user.name, is_new = state.is_new, "wizard started");
        Ok(Self {
            registry,
            services,
            options,
            state,
            exited: false,
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn template(&self) -> &Template {
        &self.state.template
    }

    pub fn current_node(&self) -> NodeId {
        self.state.node
    }

    pub fn options(&self) -> &WizardOptions {
        &self.options
    }

    pub fn is_exited(&self) -> bool {
        self.exited
    }
}
