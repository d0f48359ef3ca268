//! Gesture classification and the attendance state machine.
//!
//! # Responsibility
//! - Classify one physical interaction (a short list of contacts) into at
//!   most one gesture tag, most specific first.
//! - Map `(current status, gesture)` to the next status.
//!
//! # Invariants
//! - Classification priority: long press, then double tap, then single tap.
//! - A long hold on any contact outranks every other reading.
//! - One interaction yields at most one gesture.
//! - Long press only cycles inside `{CardAtHome, DifferentLocation}`.

use crate::model::status::AttendanceStatus;
use std::time::Duration;

/// Discrete gesture tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gesture {
    SingleTap,
    DoubleTap,
    LongPress,
}

impl Gesture {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SingleTap => "single_tap",
            Self::DoubleTap => "double_tap",
            Self::LongPress => "long_press",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "single_tap" => Some(Self::SingleTap),
            "double_tap" => Some(Self::DoubleTap),
            "long_press" => Some(Self::LongPress),
            _ => None,
        }
    }
}

/// Classification thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureTiming {
    /// Minimum hold for a long press.
    pub long_press_min: Duration,
    /// Maximum gap between the presses of a double tap.
    pub double_tap_window: Duration,
    /// Maximum hold for a single tap.
    pub single_tap_max: Duration,
}

impl Default for GestureTiming {
    fn default() -> Self {
        Self {
            long_press_min: Duration::from_millis(500),
            double_tap_window: Duration::from_millis(300),
            single_tap_max: Duration::from_millis(250),
        }
    }
}

/// One finger contact, as offsets from the start of the interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub pressed_at: Duration,
    pub released_at: Duration,
}

impl Contact {
    pub fn new(pressed_at: Duration, released_at: Duration) -> Self {
        Self {
            pressed_at,
            released_at,
        }
    }

    /// Contact from millisecond offsets.
    pub fn from_millis(pressed_at_ms: u64, released_at_ms: u64) -> Self {
        Self::new(
            Duration::from_millis(pressed_at_ms),
            Duration::from_millis(released_at_ms),
        )
    }

    pub fn held_for(&self) -> Duration {
        self.released_at.saturating_sub(self.pressed_at)
    }
}

/// Classifies one interaction. Returns `None` when nothing qualifies.
///
/// A hold of `long_press_min` on any contact makes the interaction a long
/// press, even when an earlier contact was a quick tap.
pub fn classify(contacts: &[Contact], timing: &GestureTiming) -> Option<Gesture> {
    let first = contacts.first()?;

    if contacts
        .iter()
        .any(|contact| contact.held_for() >= timing.long_press_min)
    {
        return Some(Gesture::LongPress);
    }

    if let Some(second) = contacts.get(1) {
        let gap = second.pressed_at.saturating_sub(first.pressed_at);
        if gap <= timing.double_tap_window {
            return Some(Gesture::DoubleTap);
        }
    }

    if first.held_for() <= timing.single_tap_max {
        return Some(Gesture::SingleTap);
    }
    None
}

/// Transition table of the per-student state machine.
pub fn next_status(current: AttendanceStatus, gesture: Gesture) -> AttendanceStatus {
    match gesture {
        Gesture::SingleTap => AttendanceStatus::Present,
        Gesture::DoubleTap => AttendanceStatus::None,
        Gesture::LongPress => match current {
            AttendanceStatus::CardAtHome => AttendanceStatus::DifferentLocation,
            _ => AttendanceStatus::CardAtHome,
        },
    }
}
