//! Calendar date of one attendance session.
//!
//! # Responsibility
//! - Derive the canonical record id (`YYYY-MM-DD`) and the human-readable
//!   date key (`Sun Jan 07 2024`) from one date value.
//! - Parse canonical ids read back from storage.
//!
//! # Invariants
//! - Both keys are derived from the wrapped `NaiveDate`; neither is ever
//!   converted into the other by string manipulation.
//! - Only Sundays are recording days.

use chrono::{Datelike, NaiveDate, Weekday};
use std::error::Error;
use std::fmt::{Display, Formatter};

const CANONICAL_ID_FORMAT: &str = "%Y-%m-%d";
const DISPLAY_KEY_FORMAT: &str = "%a %b %d %Y";

/// Weekday on which new sessions may be recorded.
pub const RECORDING_WEEKDAY: Weekday = Weekday::Sun;

/// Date value identifying one dated record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionDate(NaiveDate);

impl SessionDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Builds a date from calendar parts; `None` for impossible dates.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }

    /// Zero-padded `YYYY-MM-DD` id used as the dated record document id.
    pub fn canonical_id(self) -> String {
        self.0.format(CANONICAL_ID_FORMAT).to_string()
    }

    /// Locale-stable long-form key used for same-session lookup.
    pub fn display_key(self) -> String {
        self.0.format(DISPLAY_KEY_FORMAT).to_string()
    }

    /// Whether a new session may be recorded on this date.
    pub fn is_recording_day(self) -> bool {
        self.0.weekday() == RECORDING_WEEKDAY
    }

    /// Parses a stored record id back into a date.
    ///
    /// # Errors
    /// - Returns [`DateParseError`] when `value` is not a valid `YYYY-MM-DD` date.
    pub fn parse_canonical_id(value: &str) -> Result<Self, DateParseError> {
        NaiveDate::parse_from_str(value.trim(), CANONICAL_ID_FORMAT)
            .map(Self)
            .map_err(|_| DateParseError {
                value: value.to_string(),
            })
    }
}

impl Display for SessionDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical_id())
    }
}

impl From<NaiveDate> for SessionDate {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

/// A stored record id that is not a calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParseError {
    pub value: String,
}

impl Display for DateParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid record date id `{}`", self.value)
    }
}

impl Error for DateParseError {}
