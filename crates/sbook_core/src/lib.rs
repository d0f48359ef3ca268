//! Core domain logic for S-Book attendance tracking.
//! Identity resolution, roster alignment, gesture state machine, record sync
//! and deletion cascade live here; hosts drive them through services.

pub mod attendance;
pub mod auth;
pub mod db;
pub mod identity;
pub mod logging;
pub mod model;
pub mod repo;
pub mod secure_store;
pub mod service;
pub mod store;

pub use attendance::gesture::{classify, next_status, Contact, Gesture, GestureTiming};
pub use attendance::session::{AttendanceSession, LogCollection, SessionError};
pub use auth::{AuthError, AuthProvider, MemoryAuthProvider, Principal};
pub use identity::{EffectiveIdentity, IdentityResolver, LifecycleState, ResolutionError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::session_date::{DateParseError, SessionDate};
pub use model::status::AttendanceStatus;
pub use model::student::{Roster, Student};
pub use repo::{RepoError, RepoResult};
pub use secure_store::{KeyValueStore, MemoryKeyValueStore};
pub use service::attendance_service::{AttendanceService, AttendanceSnapshot};
pub use service::error::AttendanceError;
pub use service::sync_service::SyncService;
pub use store::{DocumentStore, MemoryDocumentStore, SqliteDocumentStore, StoreError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
