pub mod drag;
pub mod error;
pub mod kv;
pub mod lanes;
pub mod migrate;
pub mod render;
pub mod store;

pub use error::{StorageError, TaskError, TransferError};
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use store::{MigrationReport, TaskStore, UnmigratedBoard};
