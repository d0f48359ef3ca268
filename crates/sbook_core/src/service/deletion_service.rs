//! Reauthenticated deletes and the student cascade.
//!
//! # Responsibility
//! - Gate dated-record and student deletion behind password reauthentication.
//! - Remove a deleted student's field from every dated record of the subject.
//!
//! # Invariants
//! - A rejected password changes nothing.
//! - Cascade field deletes run concurrently and are awaited as a group; an
//!   individual failure neither aborts the others nor reaches the caller.

use crate::auth::{AuthError, AuthProvider};
use crate::identity::EffectiveIdentity;
use crate::model::session_date::SessionDate;
use crate::repo::attendance_repo::AttendanceRepository;
use crate::repo::roster_repo::RosterRepository;
use crate::service::error::AttendanceError;
use crate::store::DocumentStore;
use futures::future::join_all;
use log::{error, info, warn};
use std::sync::Arc;

/// Outcome of one cascade run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CascadeReport {
    pub attempted: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct DeletionService {
    auth: Arc<dyn AuthProvider>,
    rosters: RosterRepository,
    records: AttendanceRepository,
}

impl DeletionService {
    pub fn new(auth: Arc<dyn AuthProvider>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            auth,
            rosters: RosterRepository::new(store.clone()),
            records: AttendanceRepository::new(store),
        }
    }

    /// Deletes the dated record of `date` after reauthenticating.
    ///
    /// # Errors
    /// - `Auth` when the password is rejected.
    /// - `NotFound` when no record exists for `date`.
    /// - `Sync` on store failure.
    pub async fn delete_dated_record(
        &self,
        identity: &EffectiveIdentity,
        date: SessionDate,
        password: &str,
    ) -> Result<(), AttendanceError> {
        self.reauthenticate(password).await?;

        let canonical_id = date.canonical_id();
        if self.records.get_record(identity, &canonical_id).await?.is_none() {
            warn!("event=record_delete module=deletion status=error error_code=record_not_found date={canonical_id}");
            return Err(AttendanceError::NotFound(date.display_key()));
        }
        self.records.delete_record(identity, &canonical_id).await?;
        info!("event=record_delete module=deletion status=ok date={canonical_id}");
        Ok(())
    }

    /// Deletes one student after reauthenticating, then cascades.
    ///
    /// The cascade outcome is not part of the result.
    pub async fn delete_student(
        &self,
        identity: &EffectiveIdentity,
        card_number: &str,
        password: &str,
    ) -> Result<(), AttendanceError> {
        self.reauthenticate(password).await?;
        self.rosters.delete_student(identity, card_number).await?;
        info!("event=student_delete module=deletion status=ok");
        self.cascade_remove_student(identity, card_number).await;
        Ok(())
    }

    /// Removes `card_number` from every dated record; best effort.
    pub async fn cascade_remove_student(
        &self,
        identity: &EffectiveIdentity,
        card_number: &str,
    ) -> CascadeReport {
        let records = match self.records.list_records(identity).await {
            Ok(records) => records,
            Err(err) => {
                error!("event=cascade_delete module=deletion status=error error_code=records_fetch_failed error={err}");
                return CascadeReport::default();
            }
        };

        let deletes = records.iter().map(|record| {
            self.records
                .remove_student_field(identity, &record.canonical_id, card_number)
        });
        let results = join_all(deletes).await;

        let report = CascadeReport {
            attempted: results.len(),
            failed: results.iter().filter(|result| result.is_err()).count(),
        };
        if report.failed > 0 {
            warn!(
                "event=cascade_delete module=deletion status=partial attempted={} failed={}",
                report.attempted, report.failed
            );
        } else {
            info!(
                "event=cascade_delete module=deletion status=ok attempted={}",
                report.attempted
            );
        }
        report
    }

    async fn reauthenticate(&self, password: &str) -> Result<(), AttendanceError> {
        let principal = self
            .auth
            .current_principal()
            .await
            .ok_or(AuthError::NotSignedIn)?;
        let email = principal.email.ok_or(AuthError::MissingEmail)?;
        if let Err(err) = self.auth.reauthenticate(&email, password).await {
            warn!("event=reauthenticate module=deletion status=error error_code=reauth_failed");
            return Err(err.into());
        }
        Ok(())
    }
}
