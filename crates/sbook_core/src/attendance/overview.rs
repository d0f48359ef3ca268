//! Attendance overview across all logged dates.

use crate::attendance::session::LogCollection;
use crate::model::session_date::SessionDate;
use crate::model::status::AttendanceStatus;
use crate::model::student::{Roster, Student};

/// One student's row of the overview grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverviewRow {
    pub student: Student,
    /// Status per date, in `AttendanceOverview::dates` order.
    pub marks: Vec<AttendanceStatus>,
    pub present_count: usize,
}

/// Student × date grid built from the current roster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceOverview {
    pub dates: Vec<SessionDate>,
    pub rows: Vec<OverviewRow>,
}

/// Builds the overview; dates ascend, rows follow roster order.
pub fn build_overview(roster: &Roster, logs: &LogCollection) -> AttendanceOverview {
    let dates = logs.dates();
    let rows = roster
        .students()
        .iter()
        .enumerate()
        .map(|(index, student)| {
            let marks = dates
                .iter()
                .map(|date| {
                    logs.get(*date)
                        .and_then(|entry| entry.statuses.get(index).copied())
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>();
            let present_count = marks
                .iter()
                .filter(|status| **status == AttendanceStatus::Present)
                .count();
            OverviewRow {
                student: student.clone(),
                marks,
                present_count,
            }
        })
        .collect();

    AttendanceOverview { dates, rows }
}
