//! Schema steps for the local document store.
//!
//! # Tables
//! - `documents(collection, doc_id, body, updated_at)`: one row per remote
//!   document. `set_document` replaces `body` whole; `delete_field` rewrites it.
//! - `local_kv(key, value, updated_at)`: device-local entries, currently only
//!   the `simulatedUser` impersonation token.
//!
//! # Invariants
//! - Steps are numbered from 1 without gaps; the highest applied step is
//!   stored in `PRAGMA user_version`.
//! - Pending steps run in one transaction, so a failed open leaves the file on
//!   its previous version.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "documents",
        sql: include_str!("0001_documents.sql"),
    },
    SchemaStep {
        version: 2,
        name: "local_kv",
        sql: include_str!("0002_local_kv.sql"),
    },
];

/// Highest schema version this build can open.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Brings `conn` up to [`latest_version`] and returns how many steps ran.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file is newer than this build.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<u32> {
    let found = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    let latest = latest_version();
    if found > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: found,
            latest_supported: latest,
        });
    }

    let pending = SCHEMA_STEPS
        .iter()
        .filter(|step| step.version > found)
        .collect::<Vec<_>>();
    if pending.is_empty() {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    for step in &pending {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        info!(
            "event=db_migrate module=db status=ok version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;
    Ok(pending.len() as u32)
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, latest_version, SCHEMA_STEPS};
    use rusqlite::Connection;

    #[test]
    fn steps_are_numbered_without_gaps() {
        for (index, step) in SCHEMA_STEPS.iter().enumerate() {
            assert_eq!(step.version as usize, index + 1, "step {}", step.name);
        }
    }

    #[test]
    fn second_run_applies_nothing() {
        let mut conn = Connection::open_in_memory().expect("raw open");
        assert_eq!(
            apply_migrations(&mut conn).expect("first run"),
            latest_version()
        );
        assert_eq!(apply_migrations(&mut conn).expect("second run"), 0);
    }

    #[test]
    fn partially_migrated_file_runs_only_the_rest() {
        let mut conn = Connection::open_in_memory().expect("raw open");
        conn.execute_batch(SCHEMA_STEPS[0].sql).expect("first step");
        conn.pragma_update(None, "user_version", 1_u32)
            .expect("mark step one");

        assert_eq!(
            apply_migrations(&mut conn).expect("finish"),
            latest_version() - 1
        );
    }
}
