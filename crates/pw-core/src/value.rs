use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PwValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<PwValue>),
    Map(BTreeMap<String, PwValue>),
}

impl PwValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    pub fn string_list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Array(values.into_iter().map(|v| Self::String(v.into())).collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[PwValue]> {
        match self {
            Self::Array(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    /// Null, blank strings and empty collections count as "nothing entered".
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(_) | Self::Number(_) => false,
            Self::String(value) => value.trim().is_empty(),
            Self::Array(values) => values.is_empty(),
            Self::Map(values) => values.is_empty(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }

    /// Plain-text form used in menus. Lists are comma-joined.
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(value) => value.to_string(),
            Self::Number(value) => {
                if value.fract().abs() < f64::EPSILON {
                    (*value as i64).to_string()
                } else {
                    value.to_string()
                }
            }
            Self::String(value) => value.clone(),
            Self::Array(values) => values
                .iter()
                .map(PwValue::to_text)
                .collect::<Vec<_>>()
                .join(", "),
            Self::Map(values) => {
                let entries = values
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key, value.to_text()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{{}}}", entries)
            }
        }
    }
}

impl From<&str> for PwValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PwValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for PwValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for PwValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Shortens `value` to `width` characters, marking the cut with `...`.
pub fn crop_text(value: &str, width: usize) -> String {
    let chars = value.chars().collect::<Vec<_>>();
    if chars.len() <= width {
        return value.to_string();
    }
    if width <= 3 {
        return ".".repeat(width);
    }
    let mut out = chars.into_iter().take(width - 3).collect::<String>();
    out.push_str("...");
    out
}
