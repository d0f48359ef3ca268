//! Dated attendance record persistence.
//!
//! # Responsibility
//! - Read and write `subjects/{id}/attendance/{YYYY-MM-DD}` documents.
//! - Remove one student's field from a single dated record.
//!
//! # Invariants
//! - `put_record` replaces the whole document (`{attendance: {...}}`).
//! - Whole-number doubles read back as integer codes; any other non-integer
//!   value is dropped on read and decodes to `None` either way.

use super::RepoResult;
use crate::identity::EffectiveIdentity;
use crate::store::{paths, DocPath, Document, DocumentStore};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Field holding the card-number → code map.
pub const ATTENDANCE_FIELD: &str = "attendance";

/// Card number → status code map of one date.
pub type AttendanceRecord = BTreeMap<String, i64>;

/// One stored dated record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatedRecord {
    /// Document id, expected to be `YYYY-MM-DD`.
    pub canonical_id: String,
    pub attendance: AttendanceRecord,
}

/// Dated-record repository scoped by effective identity.
#[derive(Clone)]
pub struct AttendanceRepository {
    store: Arc<dyn DocumentStore>,
}

impl AttendanceRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Overwrites the record stored under `canonical_id`.
    pub async fn put_record(
        &self,
        identity: &EffectiveIdentity,
        canonical_id: &str,
        attendance: &AttendanceRecord,
    ) -> RepoResult<()> {
        let path = record_path(identity, canonical_id)?;
        let codes = attendance
            .iter()
            .map(|(card, code)| (card.clone(), Value::from(*code)))
            .collect::<Map<_, _>>();
        let mut data = Document::new();
        data.insert(ATTENDANCE_FIELD.to_string(), Value::Object(codes));
        self.store.set_document(&path, data).await?;
        Ok(())
    }

    pub async fn get_record(
        &self,
        identity: &EffectiveIdentity,
        canonical_id: &str,
    ) -> RepoResult<Option<DatedRecord>> {
        let path = record_path(identity, canonical_id)?;
        Ok(self
            .store
            .get_document(&path)
            .await?
            .map(|data| DatedRecord {
                canonical_id: canonical_id.to_string(),
                attendance: attendance_from_document(&data),
            }))
    }

    /// Lists every dated record of the subject, ordered by id.
    pub async fn list_records(&self, identity: &EffectiveIdentity) -> RepoResult<Vec<DatedRecord>> {
        let collection = paths::attendance(identity.subject_id())?;
        Ok(self
            .store
            .list_documents(&collection)
            .await?
            .into_iter()
            .map(|snapshot| DatedRecord {
                attendance: attendance_from_document(&snapshot.data),
                canonical_id: snapshot.id,
            })
            .collect())
    }

    pub async fn delete_record(&self, identity: &EffectiveIdentity, canonical_id: &str) -> RepoResult<()> {
        let path = record_path(identity, canonical_id)?;
        self.store.delete_document(&path).await?;
        Ok(())
    }

    /// Removes `attendance.{card_number}` from one record.
    pub async fn remove_student_field(
        &self,
        identity: &EffectiveIdentity,
        canonical_id: &str,
        card_number: &str,
    ) -> RepoResult<()> {
        let path = record_path(identity, canonical_id)?;
        self.store
            .delete_field(&path, &[ATTENDANCE_FIELD, card_number])
            .await?;
        Ok(())
    }
}

fn record_path(identity: &EffectiveIdentity, canonical_id: &str) -> RepoResult<DocPath> {
    Ok(paths::attendance(identity.subject_id())?.doc(canonical_id)?)
}

fn attendance_from_document(data: &Document) -> AttendanceRecord {
    data.get(ATTENDANCE_FIELD)
        .and_then(Value::as_object)
        .map(|codes| {
            codes
                .iter()
                .filter_map(|(card, code)| stored_code(code).map(|code| (card.clone(), code)))
                .collect()
        })
        .unwrap_or_default()
}

/// Integer code of one stored value; whole-number doubles count (`1.0` is `1`).
fn stored_code(value: &Value) -> Option<i64> {
    if let Some(code) = value.as_i64() {
        return Some(code);
    }
    let float = value.as_f64()?;
    (float.fract() == 0.0 && float.abs() <= i64::MAX as f64).then_some(float as i64)
}
