//! Roster loading and student document persistence.
//!
//! # Responsibility
//! - Fetch every student of a subject and return them in roster order.
//! - Read, write and delete single student documents.
//!
//! # Invariants
//! - The document id is the card number; a mismatching `identifier` field in
//!   the body is ignored.
//! - Reading a body never fails: mistyped fields fall back to empty values
//!   with a warning, so one bad document cannot hide the rest of the roster.
//! - `createdAt` is read as epoch millis, a `{seconds, nanoseconds}` store
//!   timestamp or an RFC 3339 string.
//! - Rosters are fetched fresh on every call; nothing is cached here.

use super::RepoResult;
use crate::identity::EffectiveIdentity;
use crate::model::student::{Roster, Student};
use crate::store::{paths, DocPath, Document, DocumentStore};
use chrono::DateTime;
use log::{debug, warn};
use serde_json::Value;
use std::sync::Arc;

/// Student repository scoped by effective identity.
#[derive(Clone)]
pub struct RosterRepository {
    store: Arc<dyn DocumentStore>,
}

impl RosterRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Loads all students of the effective subject, sorted for alignment.
    pub async fn load_roster(&self, identity: &EffectiveIdentity) -> RepoResult<Roster> {
        let collection = paths::entities(identity.subject_id())?;
        let snapshots = self.store.list_documents(&collection).await?;
        let students = snapshots
            .into_iter()
            .map(|snapshot| student_from_document(&snapshot.id, &snapshot.data))
            .collect::<Vec<_>>();
        debug!(
            "event=roster_load module=repo status=ok students={}",
            students.len()
        );
        Ok(Roster::from_students(students))
    }

    pub async fn get_student(
        &self,
        identity: &EffectiveIdentity,
        card_number: &str,
    ) -> RepoResult<Option<Student>> {
        let path = student_path(identity, card_number)?;
        Ok(self
            .store
            .get_document(&path)
            .await?
            .map(|data| student_from_document(card_number, &data)))
    }

    /// Writes (overwrites) the student document under its card number.
    pub async fn put_student(&self, identity: &EffectiveIdentity, student: &Student) -> RepoResult<()> {
        let path = student_path(identity, &student.card_number)?;
        let data = match serde_json::to_value(student)? {
            Value::Object(map) => map,
            _ => Document::new(),
        };
        self.store.set_document(&path, data).await?;
        Ok(())
    }

    pub async fn delete_student(&self, identity: &EffectiveIdentity, card_number: &str) -> RepoResult<()> {
        let path = student_path(identity, card_number)?;
        self.store.delete_document(&path).await?;
        Ok(())
    }
}

fn student_path(identity: &EffectiveIdentity, card_number: &str) -> RepoResult<DocPath> {
    Ok(paths::entities(identity.subject_id())?.doc(card_number)?)
}

fn student_from_document(doc_id: &str, data: &Document) -> Student {
    let mut student = Student::new(doc_id, text_field(doc_id, data, "name"));
    student.phone = text_field(doc_id, data, "phone");
    student.gender = text_field(doc_id, data, "gender");
    student.standard = text_field(doc_id, data, "standard");
    student.created_at = match data.get("createdAt") {
        None | Some(Value::Null) => None,
        Some(value) => {
            let millis = created_at_millis(value);
            if millis.is_none() {
                warn_unreadable(doc_id, "createdAt");
            }
            millis
        }
    };
    student
}

fn text_field(doc_id: &str, data: &Document, field: &str) -> String {
    match data.get(field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(_) => {
            warn_unreadable(doc_id, field);
            String::new()
        }
    }
}

fn created_at_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64)),
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|parsed| parsed.timestamp_millis()),
        Value::Object(fields) => {
            let seconds = fields
                .get("seconds")
                .or_else(|| fields.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = fields
                .get("nanoseconds")
                .or_else(|| fields.get("_nanoseconds"))
                .and_then(Value::as_i64)
                .unwrap_or(0);
            seconds
                .checked_mul(1_000)
                .and_then(|millis| millis.checked_add(nanos / 1_000_000))
        }
        _ => None,
    }
}

fn warn_unreadable(doc_id: &str, field: &str) {
    warn!(
        "event=roster_load module=repo status=degraded error_code=unreadable_student_field card={doc_id} field={field}"
    );
}
