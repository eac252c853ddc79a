use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::board::error::TransferError;
use crate::core::settings::Settings;
use crate::core::task::Task;

use super::ImportPayload;

pub const EXPORT_FORMAT: &str = "laneboard";
pub const EXPORT_FORMAT_VERSION: u32 = 1;

/// Full-state export wrapper.
#[derive(Debug, Serialize)]
pub struct ExportDocument<'a> {
    pub format: &'static str,
    pub format_version: u32,
    pub exported_at: DateTime<Utc>,
    pub settings: &'a Settings,
    pub tasks: &'a [Task],
}

pub fn export_json(
    tasks: &[Task],
    settings: &Settings,
    now: DateTime<Utc>,
) -> Result<String, TransferError> {
    let doc = ExportDocument {
        format: EXPORT_FORMAT,
        format_version: EXPORT_FORMAT_VERSION,
        exported_at: now,
        settings,
        tasks,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

#[derive(Deserialize)]
struct Wrapper {
    tasks: Vec<Value>,
    #[serde(default)]
    settings: Option<Value>,
}

/// Accepts the export wrapper (`{ tasks, settings? }`) or a bare task array.
pub fn import_json(text: &str) -> Result<ImportPayload, TransferError> {
    let value: Value = serde_json::from_str(text)?;
    match value {
        Value::Array(records) => Ok(ImportPayload {
            records,
            settings: None,
        }),
        Value::Object(obj) if obj.get("tasks").is_some_and(Value::is_array) => {
            let wrapper: Wrapper = serde_json::from_value(Value::Object(obj))?;
            let settings = wrapper.settings.and_then(|raw| {
                serde_json::from_value::<Settings>(raw)
                    .map_err(|e| log::warn!("Ignoring unreadable imported settings: {}", e))
                    .ok()
            });
            Ok(ImportPayload {
                records: wrapper.tasks,
                settings,
            })
        }
        _ => Err(TransferError::UnrecognizedFormat),
    }
}
