//! Import and export of the whole board.

pub mod csv;
pub mod json;

use serde_json::Value;

use crate::board::error::TransferError;
use crate::board::kv::KeyValueStore;
use crate::board::store::{MigrationReport, TaskStore};
use crate::core::settings::Settings;

/// Decoded import, not yet migrated. Nothing touches the store until
/// [`apply`] runs, so a failed decode leaves the board unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportPayload {
    pub records: Vec<Value>,
    pub settings: Option<Settings>,
}

/// Pick the decoder from the content: JSON starts with `[` or `{`, anything
/// else is read as CSV.
pub fn decode(text: &str) -> Result<ImportPayload, TransferError> {
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        json::import_json(trimmed)
    } else {
        Ok(ImportPayload {
            records: csv::import_csv(trimmed)?,
            settings: None,
        })
    }
}

/// Full-state restore of a decoded import.
pub fn apply<S: KeyValueStore>(store: &mut TaskStore<S>, payload: ImportPayload) -> MigrationReport {
    store.replace_all(&payload.records, payload.settings)
}
