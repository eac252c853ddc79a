use crate::core::task::TaskId;

/// Failure at the key-value persistence boundary.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("quota exceeded writing '{key}' ({needed} bytes, limit {limit})")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("no task with id {0}")]
    NotFound(TaskId),
    #[error("task title cannot be empty")]
    EmptyTitle,
    #[error("lane label cannot be empty")]
    EmptyLaneLabel,
    #[error("cannot read '{0}' as a date")]
    InvalidDate(String),
    #[error("stored '{key}' is not valid JSON: {source}")]
    CorruptData {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("storage: {0}")]
    Storage(#[from] StorageError),
    #[error("serialize: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure decoding an import file. Imports are all-or-nothing.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV line {line}: {reason}")]
    Csv { line: usize, reason: String },
    #[error("unrecognised import format")]
    UnrecognizedFormat,
}
