use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::PwValue;

/// Reserved template keys.
pub mod fields {
    pub const KEY: &str = "key";
    pub const PARENT: &str = "parent";
    pub const KIND: &str = "kind";
    pub const NAME: &str = "name";
    pub const ALIASES: &str = "aliases";
    pub const ATTRS: &str = "attrs";
    pub const TAGS: &str = "tags";
    pub const LOCKS: &str = "locks";
    pub const PERMISSIONS: &str = "permissions";
    pub const LOCATION: &str = "location";
    pub const HOME: &str = "home";
    pub const DESTINATION: &str = "destination";
    pub const TEMPLATE_DESC: &str = "template_desc";
    pub const TEMPLATE_TAGS: &str = "template_tags";
    pub const TEMPLATE_LOCKS: &str = "template_locks";

    pub const META: [&str; 3] = [TEMPLATE_DESC, TEMPLATE_TAGS, TEMPLATE_LOCKS];

    /// Fields that describe the spawned entity rather than the catalog entry.
    pub fn is_target(field: &str) -> bool {
        field != KEY && field != PARENT && !META.contains(&field)
    }
}

pub type FieldMap = BTreeMap<String, PwValue>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Template {
    fields: FieldMap,
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: FieldMap) -> Self {
        Self { fields }
    }

    pub fn with(mut self, field: &str, value: impl Into<PwValue>) -> Self {
        self.set(field, value.into());
        self
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn into_fields(self) -> FieldMap {
        self.fields
    }

    pub fn get(&self, field: &str) -> Option<&PwValue> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(PwValue::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn set(&mut self, field: &str, value: PwValue) {
        self.fields.insert(field.to_string(), value);
    }

    pub fn remove(&mut self, field: &str) -> Option<PwValue> {
        self.fields.remove(field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn key(&self) -> Option<&str> {
        self.get_str(fields::KEY)
    }

    pub fn parent(&self) -> Option<&str> {
        self.get_str(fields::PARENT)
    }

    pub fn kind(&self) -> Option<&str> {
        self.get_str(fields::KIND)
    }

    pub fn target_fields(&self) -> impl Iterator<Item = (&String, &PwValue)> {
        self.fields
            .iter()
            .filter(|(field, _)| fields::is_target(field))
    }

    /// Attribute entries in stored order. Malformed rows are skipped.
    pub fn attrs(&self) -> Vec<AttrEntry> {
        self.get(fields::ATTRS)
            .and_then(PwValue::as_array)
            .map(|rows| rows.iter().filter_map(AttrEntry::from_value).collect())
            .unwrap_or_default()
    }

    pub fn set_attrs(&mut self, attrs: &[AttrEntry]) {
        self.set(
            fields::ATTRS,
            PwValue::Array(attrs.iter().map(AttrEntry::to_value).collect()),
        );
    }

    pub fn tags(&self) -> Vec<TagEntry> {
        self.get(fields::TAGS)
            .and_then(PwValue::as_array)
            .map(|rows| rows.iter().filter_map(TagEntry::from_value).collect())
            .unwrap_or_default()
    }

    pub fn set_tags(&mut self, tags: &[TagEntry]) {
        self.set(
            fields::TAGS,
            PwValue::Array(tags.iter().map(TagEntry::to_value).collect()),
        );
    }
}

fn optional_string(value: Option<&PwValue>) -> Option<Option<String>> {
    match value {
        None | Some(PwValue::Null) => Some(None),
        Some(PwValue::String(text)) if text.is_empty() => Some(None),
        Some(PwValue::String(text)) => Some(Some(text.clone())),
        Some(_) => None,
    }
}

fn optional_to_value(value: &Option<String>) -> PwValue {
    match value {
        Some(text) => PwValue::String(text.clone()),
        None => PwValue::Null,
    }
}

/// `(name, value, category, locks)`; stored as a 4-element array.
#[derive(Debug, Clone, PartialEq)]
pub struct AttrEntry {
    pub name: String,
    pub value: PwValue,
    pub category: Option<String>,
    pub locks: String,
}

impl AttrEntry {
    pub fn new(name: impl Into<String>, value: impl Into<PwValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            category: None,
            locks: String::new(),
        }
    }

    pub fn to_value(&self) -> PwValue {
        PwValue::Array(vec![
            PwValue::String(self.name.clone()),
            self.value.clone(),
            optional_to_value(&self.category),
            PwValue::String(self.locks.clone()),
        ])
    }

    pub fn from_value(value: &PwValue) -> Option<Self> {
        let row = value.as_array()?;
        let name = row.first()?.as_str()?.to_string();
        let value = row.get(1).cloned().unwrap_or(PwValue::Null);
        let category = optional_string(row.get(2))?;
        let locks = row
            .get(3)
            .and_then(PwValue::as_str)
            .unwrap_or_default()
            .to_string();
        Some(Self {
            name,
            value,
            category,
            locks,
        })
    }
}

/// `(name, category, data)`; stored as a 3-element array.
#[derive(Debug, Clone, PartialEq)]
pub struct TagEntry {
    pub name: String,
    pub category: Option<String>,
    pub data: String,
}

impl TagEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: None,
            data: String::new(),
        }
    }

    pub fn to_value(&self) -> PwValue {
        PwValue::Array(vec![
            PwValue::String(self.name.clone()),
            optional_to_value(&self.category),
            PwValue::String(self.data.clone()),
        ])
    }

    pub fn from_value(value: &PwValue) -> Option<Self> {
        let row = value.as_array()?;
        let name = row.first()?.as_str()?.to_string();
        let category = optional_string(row.get(1))?;
        let data = row
            .get(2)
            .and_then(PwValue::as_str)
            .unwrap_or_default()
            .to_string();
        Some(Self {
            name,
            category,
            data,
        })
    }
}

/// A live entity previously spawned from a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: String,
    pub template_key: String,
    /// Raw template values recorded at spawn time.
    pub origin: FieldMap,
    /// Resolved values written onto the entity at spawn time.
    #[serde(default)]
    pub materialized: FieldMap,
    /// Values as they are now; the host may have edited these.
    #[serde(default)]
    pub current: FieldMap,
}

impl Instance {
    pub fn display_name(&self) -> String {
        self.current
            .get(fields::NAME)
            .and_then(PwValue::as_str)
            .map(|name| format!("{} (#{})", name, self.id))
            .unwrap_or_else(|| format!("#{}", self.id))
    }

    /// The value the entity had right after spawning.
    pub fn spawn_value(&self, field: &str) -> Option<&PwValue> {
        self.materialized
            .get(field)
            .or_else(|| self.origin.get(field))
    }

    pub fn has_diverged(&self, field: &str) -> bool {
        self.current.get(field) != self.spawn_value(field)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl UserContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permissions: Vec::new(),
            location: None,
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(permission))
    }
}
