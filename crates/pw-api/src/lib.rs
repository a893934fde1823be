use std::path::Path;
use std::sync::Arc;

use pw_core::{Template, UserContext, WizardError};
use pw_runtime::{
    FieldResolver, LockAccessPolicy, MemoryWorld, PrototypeWizard, RhaiFieldResolver,
    SessionSnapshot, Services, WizardOptions,
};

#[derive(Clone)]
pub struct StartWizardOptions {
    pub user: UserContext,
    pub existing_template: Option<Template>,
    pub services: Services,
    pub random_seed: Option<u32>,
    pub test_parse: Option<bool>,
    pub page_size: Option<usize>,
}

#[derive(Clone)]
pub struct ResumeWizardOptions {
    pub snapshot: SessionSnapshot,
    pub services: Services,
    pub options: Option<WizardOptions>,
}

pub fn start_wizard(options: StartWizardOptions) -> Result<PrototypeWizard, WizardError> {
    let defaults = WizardOptions::default();
    let wizard_options = WizardOptions {
        random_seed: options.random_seed,
        test_parse: options.test_parse.unwrap_or(defaults.test_parse),
        page_size: options.page_size.unwrap_or(defaults.page_size).max(1),
        ..defaults
    };
    PrototypeWizard::start(
        wizard_options,
        options.services,
        options.user,
        options.existing_template,
    )
}

pub fn resume_wizard(options: ResumeWizardOptions) -> Result<PrototypeWizard, WizardError> {
    PrototypeWizard::resume(
        options.snapshot,
        options.services,
        options.options.unwrap_or_default(),
    )
}

/// Services backed by a catalog directory. Saves and spawns are written back
/// to it.
pub fn open_catalog(dir: &Path) -> Result<Services, WizardError> {
    let resolver: Arc<dyn FieldResolver> = Arc::new(RhaiFieldResolver::default());
    let world = Arc::new(MemoryWorld::open(dir, resolver.clone())?);
    Ok(Services {
        registry: world.clone(),
        resolver,
        instantiation: world,
        access: Arc::new(LockAccessPolicy),
    })
}

/// Looks up `key` in the catalog behind `services`.
pub fn find_template(services: &Services, key: &str) -> Result<Template, WizardError> {
    services
        .registry
        .search(Some(key))?
        .into_iter()
        .next()
        .ok_or_else(|| {
            WizardError::input(
                "API_TEMPLATE_NOT_FOUND",
                format!("Template \"{}\" is not in the catalog.", key),
            )
        })
}
