use std::sync::Arc;

use pw_core::{DiffRecord, Instance, PwValue, Spawned, Template, UserContext, WizardError};

pub trait TemplateRegistry: Send + Sync {
    /// All templates when `key` is `None`, otherwise the exact (case-insensitive) match.
    fn search(&self, key: Option<&str>) -> Result<Vec<Template>, WizardError>;
    fn save(&self, template: &Template) -> Result<(), WizardError>;
    fn objects_using(&self, key: &str) -> Result<Vec<Instance>, WizardError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub warning: Option<String>,
    pub value: PwValue,
}

impl Resolved {
    pub fn unchanged(value: &PwValue) -> Self {
        Self {
            warning: None,
            value: value.clone(),
        }
    }
}

pub trait FieldResolver: Send + Sync {
    /// Evaluates embedded expressions. `preview` must not consume shared state.
    fn resolve(&self, value: &PwValue, preview: bool) -> Resolved;
}

pub trait InstantiationService: Send + Sync {
    /// `location` places the new entity without becoming part of its origin
    /// snapshot.
    fn instantiate(
        &self,
        template: &Template,
        location: Option<&str>,
        validate_only: bool,
    ) -> Result<Spawned, WizardError>;
    fn bulk_update(
        &self,
        template: &Template,
        diff: &DiffRecord,
        instance_ids: &[String],
    ) -> Result<usize, WizardError>;
    fn diff_against_instance(
        &self,
        template: &Template,
        instance: &Instance,
    ) -> Result<(DiffRecord, Template), WizardError>;
    fn available_kinds(&self) -> Vec<String>;
    fn describe_kind(&self, _kind: &str) -> Option<String> {
        None
    }
}

pub trait AccessPolicy: Send + Sync {
    fn can_edit(&self, user: &UserContext, template: &Template) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAllAccess;

impl AccessPolicy for AllowAllAccess {
    fn can_edit(&self, _user: &UserContext, _template: &Template) -> bool {
        true
    }
}

/// Collaborators shared by every node handler of a session.
#[derive(Clone)]
pub struct Services {
    pub registry: Arc<dyn TemplateRegistry>,
    pub resolver: Arc<dyn FieldResolver>,
    pub instantiation: Arc<dyn InstantiationService>,
    pub access: Arc<dyn AccessPolicy>,
}
