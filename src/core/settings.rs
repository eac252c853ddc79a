use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::task::Lane;

pub fn default_label(lane: Lane) -> &'static str {
    match lane {
        Lane::Div1 => "Critical",
        Lane::Div2 => "High",
        Lane::Div3 => "Medium",
        Lane::Div4 => "Low",
    }
}

/// User-facing lane labels, persisted independently of the tasks.
///
/// Decoding starts from the default labels and overlays every `div<N>` entry
/// that carries a string; unknown lanes and non-string labels are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct Settings {
    pub sections: BTreeMap<Lane, String>,
}

impl TryFrom<Value> for Settings {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let mut obj = match value {
            Value::Object(obj) => obj,
            other => return Err(format!("settings must be an object, found {other}")),
        };
        let mut settings = Self::default();
        let sections = match obj.remove("sections") {
            None | Some(Value::Null) => return Ok(settings),
            Some(Value::Object(sections)) => sections,
            Some(other) => return Err(format!("sections must be an object, found {other}")),
        };
        for (key, label) in sections {
            match (Lane::parse(&key), label) {
                (Some(lane), Value::String(label)) => {
                    settings.sections.insert(lane, label);
                }
                (_, label) => log::warn!("Ignoring lane label {}: {}", key, label),
            }
        }
        Ok(settings)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sections: Lane::ALL
                .into_iter()
                .map(|lane| (lane, default_label(lane).to_string()))
                .collect(),
        }
    }
}

impl Settings {
    /// Label for a lane, falling back to the built-in name when unset.
    pub fn label(&self, lane: Lane) -> &str {
        self.sections
            .get(&lane)
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| default_label(lane))
    }
}
