//! Attendance screen orchestration.
//!
//! # Responsibility
//! - Resolve identity once per activation and thread it into every load,
//!   save and delete.
//! - Keep the in-session array current while saves are in flight.
//! - Drop results of operations that finish after a deactivation.
//!
//! # Invariants
//! - The state lock is never held across an await.
//! - Gestures mutate the latest array, never a snapshot.
//! - Every store write started is allowed to finish; only its effect on
//!   in-memory state is discarded when the activation has changed.
//! - No roster or record fetch is issued before identity resolution succeeds.

use crate::attendance::gesture::Gesture;
use crate::attendance::overview::{build_overview, AttendanceOverview};
use crate::attendance::session::AttendanceSession;
use crate::auth::AuthProvider;
use crate::identity::{EffectiveIdentity, IdentityResolver, ResolutionError};
use crate::model::session_date::SessionDate;
use crate::model::status::AttendanceStatus;
use crate::model::student::Roster;
use crate::repo::attendance_repo::AttendanceRecord;
use crate::secure_store::KeyValueStore;
use crate::service::deletion_service::DeletionService;
use crate::service::error::AttendanceError;
use crate::service::sync_service::{LoadedLogs, SyncService};
use crate::store::DocumentStore;
use log::{debug, error, info};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Read-only view of the screen state for the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceSnapshot {
    pub subject_id: Option<String>,
    pub selected_date: SessionDate,
    pub display_key: String,
    pub roster: Roster,
    pub statuses: Vec<AttendanceStatus>,
    pub logged_dates: Vec<SessionDate>,
}

struct ScreenState {
    generation: u64,
    identity: Option<EffectiveIdentity>,
    session: AttendanceSession,
}

/// State holder for one attendance screen.
pub struct AttendanceService {
    resolver: IdentityResolver,
    sync: SyncService,
    deletion: DeletionService,
    state: Mutex<ScreenState>,
}

impl AttendanceService {
    /// Builds the screen service positioned on `initial_date`.
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn DocumentStore>,
        secure: Arc<dyn KeyValueStore>,
        initial_date: SessionDate,
    ) -> Self {
        Self {
            resolver: IdentityResolver::new(auth.clone(), store.clone(), secure),
            sync: SyncService::new(store.clone()),
            deletion: DeletionService::new(auth, store),
            state: Mutex::new(ScreenState {
                generation: 0,
                identity: None,
                session: AttendanceSession::new(initial_date),
            }),
        }
    }

    /// Resolves identity and loads roster plus logs for a new activation.
    pub async fn activate(&self) -> Result<EffectiveIdentity, AttendanceError> {
        let generation = {
            let mut state = self.lock_state();
            state.generation += 1;
            state.identity = None;
            state.generation
        };

        let identity = self.resolver.resolve().await.map_err(|err| {
            let err = AttendanceError::from(err);
            log_failure("screen_activate", &err);
            err
        })?;
        let loaded = self.sync.load_all(&identity).await.map_err(|err| {
            let err = AttendanceError::from(err);
            log_failure("screen_activate", &err);
            err
        })?;

        let mut state = self.lock_state();
        if state.generation != generation {
            debug!("event=screen_activate module=service status=discarded reason=stale_generation");
            return Ok(identity);
        }
        state.identity = Some(identity.clone());
        state.session.replace_logs(loaded.roster, loaded.logs);
        info!(
            "event=screen_activate module=service status=ok impersonating={}",
            identity.is_impersonating()
        );
        Ok(identity)
    }

    /// Ends the activation; in-flight results are dropped when they land.
    pub fn deactivate(&self) {
        let mut state = self.lock_state();
        state.generation += 1;
        state.identity = None;
        debug!("event=screen_deactivate module=service status=ok");
    }

    /// Applies one classified gesture to the student at `index`.
    pub fn apply_gesture(
        &self,
        index: usize,
        gesture: Gesture,
    ) -> Result<AttendanceStatus, AttendanceError> {
        let mut state = self.lock_state();
        state
            .session
            .apply_gesture(index, gesture)
            .map_err(AttendanceError::from)
    }

    /// Saves the current array for the selected date.
    pub async fn save(&self) -> Result<AttendanceRecord, AttendanceError> {
        let (identity, generation, date, statuses, roster) = {
            let state = self.lock_state();
            let identity = require_identity(&state)?;
            (
                identity,
                state.generation,
                state.session.selected_date(),
                state.session.statuses().to_vec(),
                state.session.roster().clone(),
            )
        };

        let record = self
            .sync
            .save(&identity, date, &statuses, &roster)
            .await
            .map_err(AttendanceError::from)?;

        let mut state = self.lock_state();
        if state.generation == generation {
            state.session.record_saved(date, statuses);
        }
        Ok(record)
    }

    /// Manual reload of roster and logs.
    pub async fn refresh(&self) -> Result<(), AttendanceError> {
        let (identity, generation) = self.current_identity()?;
        let loaded = self.load_logged(&identity, "screen_refresh").await?;
        let mut state = self.lock_state();
        if state.generation == generation {
            state.session.replace_logs(loaded.roster, loaded.logs);
        }
        Ok(())
    }

    /// Moves to `date`, reloading logs before the selected date changes.
    ///
    /// # Errors
    /// - `InvalidDate` for non-Sundays; state stays untouched and nothing is
    ///   fetched.
    pub async fn select_date(&self, date: SessionDate) -> Result<(), AttendanceError> {
        if !date.is_recording_day() {
            let err = AttendanceError::InvalidDate(date);
            log_failure("date_select", &err);
            return Err(err);
        }

        let (identity, generation) = self.current_identity()?;
        let loaded = self.load_logged(&identity, "date_select").await?;

        let mut state = self.lock_state();
        if state.generation != generation {
            return Ok(());
        }
        state.session.replace_logs(loaded.roster, loaded.logs);
        state.session.select_date(date)?;
        Ok(())
    }

    /// Deletes the dated record of `date` after reauthentication.
    pub async fn delete_log(&self, date: SessionDate, password: &str) -> Result<(), AttendanceError> {
        let (identity, generation) = self.current_identity()?;
        if let Err(err) = self
            .deletion
            .delete_dated_record(&identity, date, password)
            .await
        {
            log_failure("log_delete", &err);
            return Err(err);
        }

        let mut state = self.lock_state();
        if state.generation == generation {
            state.session.record_deleted(date);
        }
        Ok(())
    }

    /// Deletes a student after reauthentication, cascades, then reloads.
    pub async fn delete_student(
        &self,
        card_number: &str,
        password: &str,
    ) -> Result<(), AttendanceError> {
        let (identity, _) = self.current_identity()?;
        if let Err(err) = self
            .deletion
            .delete_student(&identity, card_number, password)
            .await
        {
            log_failure("student_delete", &err);
            return Err(err);
        }
        self.refresh().await
    }

    pub fn snapshot(&self) -> AttendanceSnapshot {
        let state = self.lock_state();
        let session = &state.session;
        AttendanceSnapshot {
            subject_id: state
                .identity
                .as_ref()
                .map(|identity| identity.subject_id().to_string()),
            selected_date: session.selected_date(),
            display_key: session.selected_date().display_key(),
            roster: session.roster().clone(),
            statuses: session.statuses().to_vec(),
            logged_dates: session.logs().dates(),
        }
    }

    /// Per-student overview over every logged date.
    pub fn overview(&self) -> AttendanceOverview {
        let state = self.lock_state();
        build_overview(state.session.roster(), state.session.logs())
    }

    async fn load_logged(
        &self,
        identity: &EffectiveIdentity,
        event: &str,
    ) -> Result<LoadedLogs, AttendanceError> {
        self.sync.load_all(identity).await.map_err(|err| {
            let err = AttendanceError::from(err);
            log_failure(event, &err);
            err
        })
    }

    fn current_identity(&self) -> Result<(EffectiveIdentity, u64), AttendanceError> {
        let state = self.lock_state();
        Ok((require_identity(&state)?, state.generation))
    }

    fn lock_state(&self) -> MutexGuard<'_, ScreenState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn require_identity(state: &ScreenState) -> Result<EffectiveIdentity, AttendanceError> {
    state
        .identity
        .clone()
        .ok_or(AttendanceError::Resolution(ResolutionError::NoPrincipal))
}

fn log_failure(event: &str, err: &AttendanceError) {
    error!(
        "event={event} module=service status=error error_code={} error={err}",
        err.code()
    );
}
