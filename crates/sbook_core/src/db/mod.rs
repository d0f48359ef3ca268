//! Local SQLite schema behind `SqliteDocumentStore`.
//!
//! The remote document tree is flattened into one table: a row per document,
//! keyed by its collection path (`subjects/{id}/entities`,
//! `subjects/{id}/attendance`, `subjects`) and document id, with the body kept
//! as a JSON object. Device-only values such as the impersonation token live in
//! `local_kv` and never leave the device.
//!
//! # Invariants
//! - A body is always a JSON object; field paths resolve inside it.
//! - No document or key is touched before the schema reaches
//!   `migrations::latest_version()`.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "local store schema v{db_version} was written by a newer build (this build knows v{latest_supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
