//! Domain model for roster-based attendance.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep persisted encodings (status codes, date ids) next to their types.
//!
//! # Invariants
//! - Every student is identified by a stable card number.
//! - Attendance is keyed by card number at every persistence boundary.

pub mod session_date;
pub mod status;
pub mod student;
