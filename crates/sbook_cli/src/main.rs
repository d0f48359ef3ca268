//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `sbook_core` linkage without the Flutter runtime.
//! - Print the record keys for today and the nearest recording day.

use chrono::{Datelike, Local};
use sbook_core::SessionDate;

fn main() {
    println!("sbook_core ping={}", sbook_core::ping());
    println!("sbook_core version={}", sbook_core::core_version());

    let today = SessionDate::new(Local::now().date_naive());
    println!(
        "today canonical_id={} display_key={} recording_day={}",
        today.canonical_id(),
        today.display_key(),
        today.is_recording_day()
    );

    let back = u64::from(today.date().weekday().num_days_from_sunday());
    if let Some(sunday) = today.date().checked_sub_days(chrono::Days::new(back)) {
        let sunday = SessionDate::new(sunday);
        println!(
            "last sunday canonical_id={} display_key={}",
            sunday.canonical_id(),
            sunday.display_key()
        );
    }
}
