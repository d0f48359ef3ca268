//! Repository layer over the document store.
//!
//! # Responsibility
//! - Map subject-scoped documents to domain types (students, dated records).
//! - Keep document paths and field names inside the persistence boundary.
//!
//! # Invariants
//! - Every operation is scoped by an `EffectiveIdentity`.
//! - Attendance maps are keyed by card number, never by roster index.

use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod attendance_repo;
pub mod roster_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for roster and attendance persistence.
#[derive(Debug)]
pub enum RepoError {
    Store(StoreError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidData(value.to_string())
    }
}
