//! SQLite-backed document and key-value store.
//!
//! # Responsibility
//! - Persist documents as JSON bodies for hosts running without a remote store.
//! - Back the device-local key-value contract with the same connection.
//!
//! # Invariants
//! - `set_document` replaces the stored body in one statement.
//! - `delete_field` is read-modify-write inside one transaction.
//! - The connection is only touched while holding the internal lock; the lock
//!   is never held across an await point.

use super::{
    remove_nested_field, CollectionPath, DocPath, Document, DocumentSnapshot, DocumentStore,
    StoreError, StoreResult,
};
use crate::db::{open_db, open_db_in_memory};
use crate::secure_store::KeyValueStore;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Document store over one SQLite connection.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("sqlite connection lock poisoned".to_string()))
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get_document(&self, path: &DocPath) -> StoreResult<Option<Document>> {
        let conn = self.lock()?;
        read_body(&conn, path)
    }

    async fn set_document(&self, path: &DocPath, data: Document) -> StoreResult<()> {
        let body = serde_json::to_string(&data)?;
        let conn = self.lock()?;
        write_body(&conn, path, &body)
    }

    async fn delete_document(&self, path: &DocPath) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2;",
            params![path.collection().as_str(), path.doc_id()],
        )?;
        Ok(())
    }

    async fn list_documents(&self, collection: &CollectionPath) -> StoreResult<Vec<DocumentSnapshot>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT doc_id, body FROM documents WHERE collection = ?1 ORDER BY doc_id ASC;",
        )?;
        let mut rows = stmt.query([collection.as_str()])?;
        let mut snapshots = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            let body: String = row.get(1)?;
            snapshots.push(DocumentSnapshot {
                id,
                data: parse_body(&body)?,
            });
        }
        Ok(snapshots)
    }

    async fn delete_field(&self, path: &DocPath, field_path: &[&str]) -> StoreResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut data = read_body(&tx, path)?.ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        remove_nested_field(&mut data, field_path);
        write_body(&tx, path, &serde_json::to_string(&data)?)?;
        tx.commit()?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for SqliteDocumentStore {
    async fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM local_kv WHERE key = ?1;", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    async fn set_item(&self, key: &str, value: String) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO local_kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM local_kv WHERE key = ?1;", [key])?;
        Ok(())
    }
}

fn read_body(conn: &Connection, path: &DocPath) -> StoreResult<Option<Document>> {
    let body = conn
        .query_row(
            "SELECT body FROM documents WHERE collection = ?1 AND doc_id = ?2;",
            params![path.collection().as_str(), path.doc_id()],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    body.as_deref().map(parse_body).transpose()
}

fn write_body(conn: &Connection, path: &DocPath, body: &str) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO documents (collection, doc_id, body) VALUES (?1, ?2, ?3)
         ON CONFLICT(collection, doc_id) DO UPDATE SET
            body = excluded.body,
            updated_at = (strftime('%s', 'now') * 1000);",
        params![path.collection().as_str(), path.doc_id(), body],
    )?;
    Ok(())
}

fn parse_body(body: &str) -> StoreResult<Document> {
    Ok(serde_json::from_str::<Document>(body)?)
}
