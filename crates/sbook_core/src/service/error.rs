//! Service-level attendance error taxonomy.

use crate::auth::AuthError;
use crate::attendance::session::SessionError;
use crate::identity::ResolutionError;
use crate::model::session_date::SessionDate;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Error returned by attendance use-cases.
///
/// Every variant maps to one user-visible message via [`AttendanceError::user_message`].
#[derive(Debug)]
pub enum AttendanceError {
    /// No effective identity; nothing was fetched.
    Resolution(ResolutionError),
    /// Targeted dated record does not exist (display key).
    NotFound(String),
    /// Reauthentication rejected.
    Auth(AuthError),
    /// Store failure on load, save or delete.
    Sync(RepoError),
    /// Picked date is not a recording day.
    InvalidDate(SessionDate),
    /// Session-state rejection such as an out-of-range index.
    Session(SessionError),
}

impl AttendanceError {
    /// Stable code used in `error_code=` log fields.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Resolution(_) => "resolution_failed",
            Self::NotFound(_) => "record_not_found",
            Self::Auth(_) => "reauth_failed",
            Self::Sync(_) => "sync_failed",
            Self::InvalidDate(_) => "invalid_date",
            Self::Session(_) => "session_rejected",
        }
    }

    /// Message suitable for showing to the user as-is.
    pub fn user_message(&self) -> String {
        match self {
            Self::Resolution(ResolutionError::NoPrincipal) => {
                "You are signed out. Please sign in again.".to_string()
            }
            Self::Resolution(_) => "Could not determine whose attendance to show.".to_string(),
            Self::NotFound(display_key) => format!("No attendance log found for {display_key}."),
            Self::Auth(_) => "Authentication failed. Please check your password.".to_string(),
            Self::Sync(_) => {
                "Could not reach attendance storage. Pull to refresh and try again.".to_string()
            }
            Self::InvalidDate(_) => "Please select a Sunday.".to_string(),
            Self::Session(_) => "That student is no longer on the roster.".to_string(),
        }
    }
}

impl Display for AttendanceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolution(err) => write!(f, "{err}"),
            Self::NotFound(display_key) => write!(f, "no dated record for {display_key}"),
            Self::Auth(err) => write!(f, "{err}"),
            Self::Sync(err) => write!(f, "{err}"),
            Self::InvalidDate(date) => {
                write!(f, "{} is not a recording day", date.display_key())
            }
            Self::Session(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AttendanceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Resolution(err) => Some(err),
            Self::Auth(err) => Some(err),
            Self::Sync(err) => Some(err),
            Self::Session(err) => Some(err),
            Self::NotFound(_) | Self::InvalidDate(_) => None,
        }
    }
}

impl From<ResolutionError> for AttendanceError {
    fn from(value: ResolutionError) -> Self {
        Self::Resolution(value)
    }
}

impl From<AuthError> for AttendanceError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl From<RepoError> for AttendanceError {
    fn from(value: RepoError) -> Self {
        Self::Sync(value)
    }
}

impl From<SessionError> for AttendanceError {
    fn from(value: SessionError) -> Self {
        match value {
            SessionError::NotRecordingDay(date) => Self::InvalidDate(date),
            other => Self::Session(other),
        }
    }
}
