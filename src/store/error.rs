use std::path::PathBuf;

use thiserror::Error;

/// Local store failures. The sync engine surfaces any of these as a
/// seen-set load failure or a commit failure depending on where they occur.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open media store at {path}: {source}")]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },

    #[error("Media store migration failed: {0}")]
    Migration(#[from] rusqlite::Error),

    #[error("Media store query failed: {0}")]
    Query(String),

    /// Another thread panicked while holding the connection.
    #[error("Media store connection poisoned")]
    Poisoned,

    #[error("Store task failed: {0}")]
    Spawn(#[from] tokio::task::JoinError),

    #[error("Media store schema version {found} is newer than supported version {expected}")]
    UnsupportedSchemaVersion { found: i32, expected: i32 },
}

impl StoreError {
    pub fn query(source: rusqlite::Error) -> Self {
        Self::Query(source.to_string())
    }
}
