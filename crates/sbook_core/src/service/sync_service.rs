//! Save and load of dated attendance records.
//!
//! # Responsibility
//! - Encode an in-session array and overwrite the dated record in full.
//! - Rebuild the `LogCollection` from every dated record of a subject.
//!
//! # Invariants
//! - `load_all` fetches the roster before any dated record, and decodes every
//!   record against that roster.
//! - A record id that is not a calendar date is skipped with a warning.
//! - Saves are last-write-wins on the whole map; nothing is merged.

use crate::attendance::codec::{decode, encode};
use crate::attendance::session::LogCollection;
use crate::identity::EffectiveIdentity;
use crate::model::session_date::SessionDate;
use crate::model::status::AttendanceStatus;
use crate::model::student::Roster;
use crate::repo::attendance_repo::{AttendanceRecord, AttendanceRepository};
use crate::repo::roster_repo::RosterRepository;
use crate::repo::RepoResult;
use crate::store::DocumentStore;
use log::{error, info, warn};
use std::sync::Arc;

/// Result of a full reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedLogs {
    pub roster: Roster,
    pub logs: LogCollection,
    /// Stored record ids that failed to parse as dates.
    pub skipped_ids: Vec<String>,
}

/// Dated-record sync over the document store.
#[derive(Clone)]
pub struct SyncService {
    rosters: RosterRepository,
    records: AttendanceRepository,
}

impl SyncService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            rosters: RosterRepository::new(store.clone()),
            records: AttendanceRepository::new(store),
        }
    }

    /// Encodes `statuses` against `roster` and overwrites the record for `date`.
    ///
    /// Returns the map that was written.
    pub async fn save(
        &self,
        identity: &EffectiveIdentity,
        date: SessionDate,
        statuses: &[AttendanceStatus],
        roster: &Roster,
    ) -> RepoResult<AttendanceRecord> {
        let record = encode(statuses, roster);
        let canonical_id = date.canonical_id();
        if let Err(err) = self
            .records
            .put_record(identity, &canonical_id, &record)
            .await
        {
            error!(
                "event=attendance_save module=sync status=error error_code=store_write_failed date={canonical_id} error={err}"
            );
            return Err(err);
        }
        info!(
            "event=attendance_save module=sync status=ok date={canonical_id} entries={}",
            record.len()
        );
        Ok(record)
    }

    /// Reloads the roster and every dated record, keyed by display key.
    pub async fn load_all(&self, identity: &EffectiveIdentity) -> RepoResult<LoadedLogs> {
        let roster = self.rosters.load_roster(identity).await.map_err(|err| {
            error!("event=attendance_load module=sync status=error error_code=roster_fetch_failed error={err}");
            err
        })?;
        let records = self.records.list_records(identity).await.map_err(|err| {
            error!("event=attendance_load module=sync status=error error_code=records_fetch_failed error={err}");
            err
        })?;

        let mut logs = LogCollection::new();
        let mut skipped_ids = Vec::new();
        for record in records {
            match SessionDate::parse_canonical_id(&record.canonical_id) {
                Ok(date) => logs.insert(date, decode(&record.attendance, &roster)),
                Err(err) => {
                    warn!(
                        "event=attendance_load module=sync status=skipped error_code=invalid_record_id error={err}"
                    );
                    skipped_ids.push(record.canonical_id);
                }
            }
        }

        info!(
            "event=attendance_load module=sync status=ok students={} dates={} skipped={}",
            roster.len(),
            logs.len(),
            skipped_ids.len()
        );
        Ok(LoadedLogs {
            roster,
            logs,
            skipped_ids,
        })
    }
}
