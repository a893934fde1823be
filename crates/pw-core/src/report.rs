use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Instance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiffAction {
    Keep,
    Update,
    Replace,
    Remove,
}

impl DiffAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Keep => "KEEP",
            Self::Update => "UPDATE",
            Self::Replace => "REPLACE",
            Self::Remove => "REMOVE",
        }
    }
}

impl fmt::Display for DiffAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field name to required change. Fields that need no change are absent.
pub type DiffRecord = BTreeMap<String, DiffAction>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Warning,
    Fatal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn fatal(&mut self, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity: Severity::Fatal,
            message: message.into(),
        });
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity: Severity::Warning,
            message: message.into(),
        });
    }

    pub fn outcome(&self) -> Outcome {
        match self.issues.iter().map(|issue| issue.severity).max() {
            None => Outcome::Ok,
            Some(Severity::Warning) => Outcome::Warning,
            Some(Severity::Fatal) => Outcome::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.outcome() == Outcome::Fatal
    }

    pub fn fatal_messages(&self) -> Vec<&str> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Fatal)
            .map(|issue| issue.message.as_str())
            .collect()
    }

    pub fn to_text(&self) -> String {
        if self.issues.is_empty() {
            return "No validation errors found. (but errors could still happen at spawn-time)"
                .to_string();
        }
        self.issues
            .iter()
            .map(|issue| match issue.severity {
                Severity::Fatal => format!("Error: {}", issue.message),
                Severity::Warning => format!("Warning: {}", issue.message),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Result of an instantiation request. `instances` is empty for validate-only
/// calls and whenever the report is fatal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spawned {
    pub report: ValidationReport,
    pub instances: Vec<Instance>,
}
