//! Local media store.
//!
//! Holds every synchronized media row (summary + thumbnail) in SQLite and is
//! the single source of truth for which identifiers are already mirrored.
//! Also keeps a small history of sync runs for `status`.

pub mod db;
pub mod error;
pub mod schema;
pub mod types;

pub use db::{LocalStore, SqliteStore};
pub use error::StoreError;
pub use types::{MediaRow, SyncRunStats};
