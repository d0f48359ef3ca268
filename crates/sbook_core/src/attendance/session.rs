//! In-session attendance state.
//!
//! # Responsibility
//! - Hold the roster-aligned status array for the selected date.
//! - Hold the `LogCollection` rebuilt from every dated record.
//! - Apply classified gestures to one slot at a time.
//!
//! # Invariants
//! - `statuses.len() == roster.len()` after every public mutation.
//! - Selecting a date swaps the array before the selected date changes.
//! - Non-recording days are rejected without touching any state.

use crate::attendance::gesture::{next_status, Gesture};
use crate::model::session_date::SessionDate;
use crate::model::status::AttendanceStatus;
use crate::model::student::Roster;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Statuses of one logged date, aligned to the roster they were decoded with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedSession {
    pub date: SessionDate,
    pub statuses: Vec<AttendanceStatus>,
}

/// Display key → logged statuses for the active session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogCollection {
    entries: HashMap<String, LoggedSession>,
}

impl LogCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry for `date`.
    pub fn insert(&mut self, date: SessionDate, statuses: Vec<AttendanceStatus>) {
        self.entries
            .insert(date.display_key(), LoggedSession { date, statuses });
    }

    pub fn get(&self, date: SessionDate) -> Option<&LoggedSession> {
        self.entries.get(&date.display_key())
    }

    /// Lookup by human-readable date key.
    pub fn get_by_key(&self, display_key: &str) -> Option<&LoggedSession> {
        self.entries.get(display_key)
    }

    pub fn remove(&mut self, date: SessionDate) -> Option<LoggedSession> {
        self.entries.remove(&date.display_key())
    }

    pub fn contains(&self, date: SessionDate) -> bool {
        self.entries.contains_key(&date.display_key())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Logged dates, ascending.
    pub fn dates(&self) -> Vec<SessionDate> {
        let mut dates = self
            .entries
            .values()
            .map(|entry| entry.date)
            .collect::<Vec<_>>();
        dates.sort();
        dates
    }
}

/// Session state rejections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Gesture targeted an index outside the roster.
    IndexOutOfRange { index: usize, len: usize },
    /// Date is not a recording day.
    NotRecordingDay(SessionDate),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexOutOfRange { index, len } => {
                write!(f, "student index {index} out of range for roster of {len}")
            }
            Self::NotRecordingDay(date) => {
                write!(f, "{} is not a Sunday", date.display_key())
            }
        }
    }
}

impl Error for SessionError {}

/// Attendance state of one screen session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceSession {
    roster: Roster,
    statuses: Vec<AttendanceStatus>,
    selected_date: SessionDate,
    logs: LogCollection,
}

impl AttendanceSession {
    /// Empty session positioned on `selected_date`.
    ///
    /// The initial date is not validated; only picker selections are.
    pub fn new(selected_date: SessionDate) -> Self {
        Self {
            roster: Roster::default(),
            statuses: Vec::new(),
            selected_date,
            logs: LogCollection::new(),
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn statuses(&self) -> &[AttendanceStatus] {
        &self.statuses
    }

    pub fn selected_date(&self) -> SessionDate {
        self.selected_date
    }

    pub fn logs(&self) -> &LogCollection {
        &self.logs
    }

    /// Applies one gesture to one student and returns the new status.
    pub fn apply_gesture(
        &mut self,
        index: usize,
        gesture: Gesture,
    ) -> Result<AttendanceStatus, SessionError> {
        let len = self.statuses.len();
        let slot = self
            .statuses
            .get_mut(index)
            .ok_or(SessionError::IndexOutOfRange { index, len })?;
        *slot = next_status(*slot, gesture);
        Ok(*slot)
    }

    /// Installs a freshly loaded roster and log collection.
    pub fn replace_logs(&mut self, roster: Roster, logs: LogCollection) {
        self.roster = roster;
        self.logs = logs;
        self.statuses = self.statuses_for(self.selected_date);
    }

    /// Moves the session to `date`.
    ///
    /// # Errors
    /// - `NotRecordingDay` for non-Sundays; state is left unchanged.
    pub fn select_date(&mut self, date: SessionDate) -> Result<(), SessionError> {
        if !date.is_recording_day() {
            return Err(SessionError::NotRecordingDay(date));
        }
        self.statuses = self.statuses_for(date);
        self.selected_date = date;
        Ok(())
    }

    /// Records a successful save of `statuses` under `date`.
    pub fn record_saved(&mut self, date: SessionDate, statuses: Vec<AttendanceStatus>) {
        self.logs.insert(date, statuses);
    }

    /// Records deletion of `date`; resets the array if it is the selected date.
    pub fn record_deleted(&mut self, date: SessionDate) {
        self.logs.remove(date);
        if self.selected_date == date {
            self.statuses = vec![AttendanceStatus::None; self.roster.len()];
        }
    }

    fn statuses_for(&self, date: SessionDate) -> Vec<AttendanceStatus> {
        match self.logs.get(date) {
            Some(entry) if entry.statuses.len() == self.roster.len() => entry.statuses.clone(),
            _ => vec![AttendanceStatus::None; self.roster.len()],
        }
    }
}
