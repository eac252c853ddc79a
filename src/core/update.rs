use serde_json::Value;

use super::task::TaskStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Due,
    Captured,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Title,
    Description,
    Notes,
}

/// A single-field edit. Each variant carries its own coercion rule:
///
/// - `Date`: raw text normalised to a UTC timestamp, blank clears the field
/// - `Status`: `Deleted` also raises the `deleted` flag
/// - `Priority`: clamped to 1..=4, section follows
/// - `Text`: assigned verbatim, tags rederived
/// - `Subtasks`: replaced wholesale
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Date(DateField, String),
    Status(TaskStatus),
    Priority(i64),
    Text(TextField, String),
    Subtasks(Vec<Value>),
}

impl FieldUpdate {
    pub fn title(s: impl Into<String>) -> Self {
        Self::Text(TextField::Title, s.into())
    }

    pub fn description(s: impl Into<String>) -> Self {
        Self::Text(TextField::Description, s.into())
    }

    pub fn notes(s: impl Into<String>) -> Self {
        Self::Text(TextField::Notes, s.into())
    }

    pub fn due(raw: impl Into<String>) -> Self {
        Self::Date(DateField::Due, raw.into())
    }
}
