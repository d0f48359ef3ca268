//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose attendance use-cases to Dart via FRB as sync calls.
//! - Translate statuses and dates into stable string labels.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - The host resolves identity; calls act on `subject_id` directly.
//! - Attendance crosses the boundary keyed by card number, never by position.
//! - Async core calls are driven to completion with `block_on` against the
//!   local SQLite store.

use futures::executor::block_on;
use log::warn;
use sbook_core::attendance::codec::align_marks;
use sbook_core::repo::roster_repo::RosterRepository;
use sbook_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, next_status,
    ping as ping_inner, AttendanceStatus, DocumentStore, EffectiveIdentity, Gesture,
    IdentityResolver, KeyValueStore, LifecycleState, MemoryAuthProvider, SessionDate,
    SqliteDocumentStore, SyncService,
};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

const LOCAL_DB_FILE_NAME: &str = "sbook_local.sqlite3";
static LOCAL_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
/// Same `level + log_dir` is idempotent; any other pair is refused.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Both keys derived from one calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateKeysResponse {
    pub ok: bool,
    /// `YYYY-MM-DD` record id.
    pub canonical_id: String,
    /// `Sun Jan 07 2024` style lookup key.
    pub display_key: String,
    /// Whether new sessions may be recorded on this date.
    pub is_recording_day: bool,
    pub message: String,
}

/// One roster entry as seen by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub card_number: String,
    pub name: String,
}

/// One student's status label, keyed by card number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceMark {
    pub card_number: String,
    pub status: String,
}

/// One logged date with a mark per student of `AttendanceLoadResponse::roster`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedDate {
    pub canonical_id: String,
    pub display_key: String,
    pub marks: Vec<AttendanceMark>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceLoadResponse {
    pub ok: bool,
    pub roster: Vec<RosterEntry>,
    /// Ascending by date.
    pub logs: Vec<LoggedDate>,
    /// Stored record ids that were not dates.
    pub skipped_ids: Vec<String>,
    pub message: String,
}

impl AttendanceLoadResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            roster: Vec::new(),
            logs: Vec::new(),
            skipped_ids: Vec::new(),
            message: message.into(),
        }
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceActionResponse {
    pub ok: bool,
    pub message: String,
}

impl AttendanceActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Applies one gesture label to one status label.
///
/// Labels: statuses `none|present|card_at_home|different_location`, gestures
/// `single_tap|double_tap|long_press`. Returns an empty string for unknown
/// labels.
#[flutter_rust_bridge::frb(sync)]
pub fn attendance_next_status(current: String, gesture: String) -> String {
    match (AttendanceStatus::parse(&current), Gesture::parse(&gesture)) {
        (Some(current), Some(gesture)) => next_status(current, gesture).as_str().to_string(),
        _ => String::new(),
    }
}

/// Derives record id and display key for a calendar date.
#[flutter_rust_bridge::frb(sync)]
pub fn attendance_date_keys(year: i32, month: u32, day: u32) -> DateKeysResponse {
    match SessionDate::from_ymd(year, month, day) {
        Some(date) => DateKeysResponse {
            ok: true,
            canonical_id: date.canonical_id(),
            display_key: date.display_key(),
            is_recording_day: date.is_recording_day(),
            message: String::new(),
        },
        None => DateKeysResponse {
            ok: false,
            canonical_id: String::new(),
            display_key: String::new(),
            is_recording_day: false,
            message: format!("invalid date {year:04}-{month:02}-{day:02}"),
        },
    }
}

/// Saves card-keyed marks for one Sunday.
///
/// Students on the roster without a mark are written as `none`.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Rejects non-Sundays, unknown status labels, repeated card numbers and
///   card numbers missing from the subject's roster before any write.
#[flutter_rust_bridge::frb(sync)]
pub fn attendance_save(
    subject_id: String,
    year: i32,
    month: u32,
    day: u32,
    marks: Vec<AttendanceMark>,
) -> AttendanceActionResponse {
    let Some(date) = SessionDate::from_ymd(year, month, day) else {
        return AttendanceActionResponse::failure("attendance_save failed: invalid date");
    };
    if !date.is_recording_day() {
        return AttendanceActionResponse::failure("Please select a Sunday.");
    }
    let parsed = match parse_marks(&marks) {
        Ok(parsed) => parsed,
        Err(label) => {
            return AttendanceActionResponse::failure(format!(
                "attendance_save failed: unknown status `{label}`"
            ))
        }
    };
    let store = match open_local_store() {
        Ok(store) => store,
        Err(err) => return AttendanceActionResponse::failure(err),
    };

    let identity = EffectiveIdentity::own(subject_id.trim());
    let result = block_on(async {
        let roster = RosterRepository::new(store.clone())
            .load_roster(&identity)
            .await
            .map_err(|err| err.to_string())?;
        let statuses = align_marks(&parsed, &roster).map_err(|err| err.to_string())?;
        SyncService::new(store)
            .save(&identity, date, &statuses, &roster)
            .await
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(record) => AttendanceActionResponse::success(format!(
            "Saved {} entries for {}.",
            record.len(),
            date.display_key()
        )),
        Err(err) => {
            warn!("event=ffi_attendance_save module=ffi status=error error={err}");
            AttendanceActionResponse::failure(format!("attendance_save failed: {err}"))
        }
    }
}

/// Loads the roster and every dated record of `subject_id`.
#[flutter_rust_bridge::frb(sync)]
pub fn attendance_load(subject_id: String) -> AttendanceLoadResponse {
    let store = match open_local_store() {
        Ok(store) => store,
        Err(err) => return AttendanceLoadResponse::failure(err),
    };
    let identity = EffectiveIdentity::own(subject_id.trim());
    let loaded = match block_on(SyncService::new(store).load_all(&identity)) {
        Ok(loaded) => loaded,
        Err(err) => {
            warn!("event=ffi_attendance_load module=ffi status=error error={err}");
            return AttendanceLoadResponse::failure(format!("attendance_load failed: {err}"));
        }
    };

    let roster = loaded
        .roster
        .students()
        .iter()
        .map(|student| RosterEntry {
            card_number: student.card_number.clone(),
            name: student.name.clone(),
        })
        .collect::<Vec<_>>();
    let logs = loaded
        .logs
        .dates()
        .into_iter()
        .filter_map(|date| {
            loaded.logs.get(date).map(|entry| LoggedDate {
                canonical_id: date.canonical_id(),
                display_key: date.display_key(),
                marks: roster
                    .iter()
                    .zip(&entry.statuses)
                    .map(|(student, status)| AttendanceMark {
                        card_number: student.card_number.clone(),
                        status: status.as_str().to_string(),
                    })
                    .collect(),
            })
        })
        .collect::<Vec<_>>();
    let message = format!("Loaded {} student(s), {} date(s).", roster.len(), logs.len());

    AttendanceLoadResponse {
        ok: true,
        roster,
        logs,
        skipped_ids: loaded.skipped_ids,
        message,
    }
}

/// Lifecycle hook; `inactive` and `background` clear impersonation.
#[flutter_rust_bridge::frb(sync)]
pub fn app_lifecycle_changed(state: String) -> AttendanceActionResponse {
    let Some(state) = LifecycleState::parse(&state) else {
        return AttendanceActionResponse::failure(format!("unknown lifecycle state `{state}`"));
    };
    let store = match open_local_store() {
        Ok(store) => store,
        Err(err) => return AttendanceActionResponse::failure(err),
    };

    // Clearing on lifecycle change never consults the auth provider.
    let documents: Arc<dyn DocumentStore> = store.clone();
    let secure: Arc<dyn KeyValueStore> = store;
    let resolver = IdentityResolver::new(Arc::new(MemoryAuthProvider::new()), documents, secure);
    match block_on(resolver.on_lifecycle_change(state)) {
        Ok(true) => AttendanceActionResponse::success("Impersonation cleared."),
        Ok(false) => AttendanceActionResponse::success(""),
        Err(err) => AttendanceActionResponse::failure(format!("app_lifecycle_changed failed: {err}")),
    }
}

fn parse_marks(marks: &[AttendanceMark]) -> Result<Vec<(String, AttendanceStatus)>, String> {
    marks
        .iter()
        .map(|mark| {
            AttendanceStatus::parse(&mark.status)
                .map(|status| (mark.card_number.trim().to_string(), status))
                .ok_or_else(|| mark.status.clone())
        })
        .collect()
}

fn resolve_local_db_path() -> PathBuf {
    LOCAL_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("SBOOK_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(LOCAL_DB_FILE_NAME)
        })
        .clone()
}

fn open_local_store() -> Result<Arc<SqliteDocumentStore>, String> {
    SqliteDocumentStore::open(resolve_local_db_path())
        .map(Arc::new)
        .map_err(|err| format!("local DB open failed: {err}"))
}
