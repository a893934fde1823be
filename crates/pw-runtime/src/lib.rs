pub mod access;
pub mod diff;
pub mod engine;
pub mod flatten;
pub mod nodes;
pub mod resolver;
pub mod services;
pub mod world;

mod rng;
#[cfg(test)]
mod test_support;

pub use access::LockAccessPolicy;
pub use diff::{compute_diff, has_changes, SAMPLING_NOTICE};
pub use engine::node::{NodeArgs, NodeId};
pub use engine::{
    PrototypeWizard, RenderedOption, SessionSnapshot, TurnOutput, WizardOptions, SESSION_SCHEMA_V1,
};
pub use flatten::{check_template, flatten_template};
pub use resolver::RhaiFieldResolver;
pub use services::{
    AccessPolicy, AllowAllAccess, FieldResolver, InstantiationService, Resolved, Services,
    TemplateRegistry,
};
pub use world::MemoryWorld;
