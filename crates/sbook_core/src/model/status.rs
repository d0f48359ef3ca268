//! Attendance status values and their persisted codes.
//!
//! # Responsibility
//! - Define the four per-student attendance states of one session.
//! - Own the integer code mapping used at every persistence boundary.
//!
//! # Invariants
//! - Codes are stable: `None=0, Present=1, CardAtHome=2, DifferentLocation=3`.
//! - Unknown codes never fail; callers decide the fallback (`None`).

use serde::{Deserialize, Serialize};

/// Attendance state of one student for the selected date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// Not marked.
    #[default]
    None,
    /// Attended with card.
    Present,
    /// Attended, card left at home.
    CardAtHome,
    /// Attended at a different location.
    DifferentLocation,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 4] = [
        Self::None,
        Self::Present,
        Self::CardAtHome,
        Self::DifferentLocation,
    ];

    /// Integer code written into dated records.
    pub fn code(self) -> i64 {
        match self {
            Self::None => 0,
            Self::Present => 1,
            Self::CardAtHome => 2,
            Self::DifferentLocation => 3,
        }
    }

    /// Maps a persisted code back to a status.
    ///
    /// Returns `None` for codes outside the known set.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Present),
            2 => Some(Self::CardAtHome),
            3 => Some(Self::DifferentLocation),
            _ => None,
        }
    }

    /// Stable label used across the FFI boundary.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Present => "present",
            Self::CardAtHome => "card_at_home",
            Self::DifferentLocation => "different_location",
        }
    }

    /// Parses a stable label produced by [`AttendanceStatus::as_str`].
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "none" => Some(Self::None),
            "present" => Some(Self::Present),
            "card_at_home" => Some(Self::CardAtHome),
            "different_location" => Some(Self::DifferentLocation),
            _ => None,
        }
    }

    /// Whether this is one of the two long-press states.
    pub fn is_away_state(self) -> bool {
        matches!(self, Self::CardAtHome | Self::DifferentLocation)
    }
}
