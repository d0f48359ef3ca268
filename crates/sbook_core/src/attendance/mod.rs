//! Attendance recording core.
//!
//! # Responsibility
//! - Gesture classification and the per-student status state machine.
//! - Encoding between roster-aligned arrays and card-number keyed records.
//! - In-session state (selected date, status array, log collection).
//!
//! # Invariants
//! - Array indices are a derived view over the current roster only.
//! - Nothing in this module performs I/O.

pub mod codec;
pub mod gesture;
pub mod overview;
pub mod session;
