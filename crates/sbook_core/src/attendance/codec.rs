//! Status array ⇄ persisted record codec.
//!
//! # Invariants
//! - `encode` emits exactly one entry per roster student; a missing array slot
//!   encodes as `None` (code 0).
//! - `decode` yields one status per roster student; missing or unknown codes
//!   decode to `None`.
//! - Record keys outside the roster are ignored by `decode` and never produced
//!   by `encode`.
//! - `align_marks` places keyed marks by card number only; a mark for a card
//!   that is not on the roster is an error, never a shifted slot.

use crate::model::status::AttendanceStatus;
use crate::model::student::Roster;
use crate::repo::attendance_repo::AttendanceRecord;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Keyed marks that cannot be placed on the current roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkError {
    UnknownCard(String),
    DuplicateCard(String),
}

impl Display for MarkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownCard(card) => write!(f, "card number `{card}` is not on the roster"),
            Self::DuplicateCard(card) => write!(f, "card number `{card}` is marked twice"),
        }
    }
}

impl Error for MarkError {}

/// Encodes a roster-aligned status array into a card-number keyed record.
pub fn encode(statuses: &[AttendanceStatus], roster: &Roster) -> AttendanceRecord {
    roster
        .card_numbers()
        .enumerate()
        .map(|(index, card)| {
            let status = statuses.get(index).copied().unwrap_or_default();
            (card.to_string(), status.code())
        })
        .collect()
}

/// Decodes a record into an array aligned to the current roster.
pub fn decode(record: &AttendanceRecord, roster: &Roster) -> Vec<AttendanceStatus> {
    roster
        .card_numbers()
        .map(|card| {
            record
                .get(card)
                .and_then(|code| AttendanceStatus::from_code(*code))
                .unwrap_or_default()
        })
        .collect()
}

/// Builds a roster-aligned array from card-number keyed marks.
///
/// Roster students without a mark stay `None`.
pub fn align_marks(
    marks: &[(String, AttendanceStatus)],
    roster: &Roster,
) -> Result<Vec<AttendanceStatus>, MarkError> {
    let mut statuses = vec![AttendanceStatus::None; roster.len()];
    let mut placed = vec![false; roster.len()];
    for (card, status) in marks {
        let index = roster
            .position(card)
            .ok_or_else(|| MarkError::UnknownCard(card.clone()))?;
        if std::mem::replace(&mut placed[index], true) {
            return Err(MarkError::DuplicateCard(card.clone()));
        }
        statuses[index] = *status;
    }
    Ok(statuses)
}
