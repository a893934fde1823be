use std::collections::BTreeSet;

use pw_core::{fields, Template, ValidationReport, WizardError};

use crate::services::{FieldResolver, TemplateRegistry};

pub const PARENT_MISSING: &str = "TEMPLATE_PARENT_MISSING";
pub const PARENT_CYCLE: &str = "TEMPLATE_PARENT_CYCLE";

/// Merges the parent chain root-first so child values win. `parent` is dropped
/// from the result.
pub fn flatten_template(
    template: &Template,
    registry: &dyn TemplateRegistry,
) -> Result<Template, WizardError> {
    let mut chain = vec![template.clone()];
    let mut seen = BTreeSet::new();
    if let Some(key) = template.key() {
        seen.insert(key.to_lowercase());
    }

    let mut next_parent = template.parent().map(str::to_string);
    while let Some(parent_key) = next_parent {
        if !seen.insert(parent_key.to_lowercase()) {
            return Err(WizardError::validation(
                PARENT_CYCLE,
                format!(
                    "Parent chain of '{}' loops back to '{}'.",
                    template.key().unwrap_or("(unnamed)"),
                    parent_key
                ),
            ));
        }
        let parent = registry
            .search(Some(&parent_key))?
            .into_iter()
            .next()
            .ok_or_else(|| {
                WizardError::validation(
                    PARENT_MISSING,
                    format!("Parent template '{}' is not registered.", parent_key),
                )
            })?;
        next_parent = parent.parent().map(str::to_string);
        chain.push(parent);
    }

    let mut flat = Template::new();
    for link in chain.into_iter().rev() {
        for (field, value) in link.into_fields() {
            flat.set(&field, value);
        }
    }
    flat.remove(fields::PARENT);
    if let Some(key) = template.get(fields::KEY) {
        flat.set(fields::KEY, key.clone());
    } else {
        flat.remove(fields::KEY);
    }
    Ok(flat)
}

/// Structural checks shared by save, spawn and the validate node. A broken
/// parent chain yields exactly one fatal issue and nothing else.
pub fn check_template(
    template: &Template,
    registry: &dyn TemplateRegistry,
    resolver: &dyn FieldResolver,
) -> Result<(ValidationReport, Option<Template>), WizardError> {
    let mut report = ValidationReport::default();
    let flat = match flatten_template(template, registry) {
        Ok(flat) => flat,
        Err(error) if error.code == PARENT_MISSING || error.code == PARENT_CYCLE => {
            report.fatal(error.message);
            return Ok((report, None));
        }
        Err(error) => return Err(error),
    };

    if flat.kind().is_none() {
        report.fatal("No kind set. A kind must be given by this template or one of its parents.");
    }
    if template.key().is_none() {
        report.warning("No key set. The template can be spawned but not saved.");
    }
    for (field, value) in flat.target_fields() {
        if let Some(warning) = resolver.resolve(value, true).warning {
            report.warning(format!("{}: {}", field, warning));
        }
    }
    Ok((report, Some(flat)))
}
