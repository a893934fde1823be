use std::collections::BTreeSet;

use pw_core::{fields, DiffAction, DiffRecord, Instance, Template};

pub const SAMPLING_NOTICE: &str = "Note that the changes are suggested based on a single, randomly \
selected example instance. Other instances may have been changed individually since they were \
spawned, so the suggestions may not fit all of them.";

/// Classifies every target field of the flattened `template` against the
/// origin snapshot of `instance`. Identical fields are left out. Overrides only
/// downgrade fields already present in the record.
pub fn compute_diff(
    template: &Template,
    instance: &Instance,
    overrides: &BTreeSet<String>,
) -> (DiffRecord, Template) {
    let snapshot = Template::from_fields(
        instance
            .origin
            .iter()
            .filter(|(field, _)| fields::is_target(field))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect(),
    );

    let mut diff = DiffRecord::new();
    for (field, value) in template.target_fields() {
        if snapshot.get(field) == Some(value) {
            continue;
        }
        let action = if instance.has_diverged(field) {
            DiffAction::Replace
        } else {
            DiffAction::Update
        };
        diff.insert(field.clone(), action);
    }
    for field in snapshot.fields().keys() {
        if !template.contains(field) {
            diff.insert(field.clone(), DiffAction::Remove);
        }
    }
    for field in overrides {
        if let Some(action) = diff.get_mut(field) {
            *action = DiffAction::Keep;
        }
    }
    (diff, snapshot)
}

/// True when applying `diff` would change anything.
pub fn has_changes(diff: &DiffRecord) -> bool {
    diff.values().any(|action| *action != DiffAction::Keep)
}
