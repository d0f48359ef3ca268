//! Document-store collaborator contract.
//!
//! # Responsibility
//! - Define the async document API the core needs from its remote store.
//! - Centralize the persisted path layout (`subjects/{id}/...`).
//!
//! # Invariants
//! - `set_document` fully replaces the target document (no merge).
//! - `delete_field` fails with `NotFound` when the document is absent.
//! - Path segments are non-empty and never contain `/`.

use crate::db::DbError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;

/// Document body: top-level JSON object.
pub type Document = Map<String, Value>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store transport and data errors.
#[derive(Debug)]
pub enum StoreError {
    InvalidPath(String),
    NotFound(String),
    Db(DbError),
    Serialization(serde_json::Error),
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPath(path) => write!(f, "invalid document path: {path}"),
            Self::NotFound(path) => write!(f, "document not found: {path}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "document serialization failed: {err}"),
            Self::Unavailable(message) => write!(f, "document store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Slash-joined collection path such as `subjects/u1/attendance`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// Builds a collection path from alternating collection/document segments.
    ///
    /// # Errors
    /// - Returns `InvalidPath` for blank segments, segments containing `/`,
    ///   or an even number of segments (that would name a document).
    pub fn new(segments: &[&str]) -> StoreResult<Self> {
        if segments.len() % 2 == 0 {
            return Err(StoreError::InvalidPath(segments.join("/")));
        }
        validate_segments(segments)?;
        Ok(Self(segments.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Document path for `doc_id` inside this collection.
    pub fn doc(&self, doc_id: &str) -> StoreResult<DocPath> {
        validate_segments(&[doc_id])?;
        Ok(DocPath {
            collection: self.clone(),
            doc_id: doc_id.to_string(),
        })
    }
}

impl Display for CollectionPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Full path of one document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocPath {
    collection: CollectionPath,
    doc_id: String,
}

impl DocPath {
    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }
}

impl Display for DocPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.doc_id)
    }
}

fn validate_segments(segments: &[&str]) -> StoreResult<()> {
    for segment in segments {
        if segment.trim().is_empty() || segment.contains('/') {
            return Err(StoreError::InvalidPath(segments.join("/")));
        }
    }
    Ok(())
}

/// Persisted layout of the attendance data.
pub mod paths {
    use super::{CollectionPath, DocPath, StoreResult};

    pub const SUBJECTS: &str = "subjects";
    pub const ENTITIES: &str = "entities";
    pub const ATTENDANCE: &str = "attendance";

    /// `subjects`
    pub fn subjects() -> StoreResult<CollectionPath> {
        CollectionPath::new(&[SUBJECTS])
    }

    /// `subjects/{subject_id}` (profile document).
    pub fn subject_profile(subject_id: &str) -> StoreResult<DocPath> {
        subjects()?.doc(subject_id)
    }

    /// `subjects/{subject_id}/entities`
    pub fn entities(subject_id: &str) -> StoreResult<CollectionPath> {
        CollectionPath::new(&[SUBJECTS, subject_id, ENTITIES])
    }

    /// `subjects/{subject_id}/attendance`
    pub fn attendance(subject_id: &str) -> StoreResult<CollectionPath> {
        CollectionPath::new(&[SUBJECTS, subject_id, ATTENDANCE])
    }
}

/// Snapshot of one document returned by collection listings.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub id: String,
    pub data: Document,
}

/// Async document-store contract.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_document(&self, path: &DocPath) -> StoreResult<Option<Document>>;

    /// Overwrites the whole document.
    async fn set_document(&self, path: &DocPath, data: Document) -> StoreResult<()>;

    /// Deletes one document; deleting an absent document is a no-op.
    async fn delete_document(&self, path: &DocPath) -> StoreResult<()>;

    /// Lists direct child documents ordered by document id.
    async fn list_documents(&self, collection: &CollectionPath) -> StoreResult<Vec<DocumentSnapshot>>;

    /// Removes one nested field addressed by `field_path` segments.
    async fn delete_field(&self, path: &DocPath, field_path: &[&str]) -> StoreResult<()>;
}

/// Removes a nested field from `data`; missing intermediate objects are a no-op.
pub(crate) fn remove_nested_field(data: &mut Document, field_path: &[&str]) {
    let Some((last, parents)) = field_path.split_last() else {
        return;
    };
    let mut current = data;
    for segment in parents {
        match current.get_mut(*segment) {
            Some(Value::Object(child)) => current = child,
            _ => return,
        }
    }
    current.remove(*last);
}
