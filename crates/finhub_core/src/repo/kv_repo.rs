//! Key/value durable medium contracts and implementations.
//!
//! # Responsibility
//! - Provide `get`/`set`/`remove` over namespaced string keys.
//! - Offer SQLite, process-memory and unavailable media behind one trait.
//!
//! # Invariants
//! - Writes are committed before the call returns.
//! - Implementations are shareable across threads (`Send + Sync`).

use crate::db::DbError;
use log::debug;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

/// Failure taxonomy for durable media.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The medium cannot be reached in this execution context.
    #[error("durable storage unavailable: {0}")]
    Unavailable(String),
    /// Persisted content exists but cannot be decoded.
    #[error("durable storage content is corrupt: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Device-local durable key/value medium.
pub trait KvRepository: Send + Sync {
    /// Short backend label used in log events.
    fn backend(&self) -> &'static str;
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// SQLite-backed medium over the `kv_store` table.
pub struct SqliteKvRepository {
    conn: Mutex<Connection>,
}

impl SqliteKvRepository {
    /// Wraps a connection returned by `db::open_db*`.
    ///
    /// # Errors
    /// - Returns `StorageError::Unavailable` when the `kv_store` table is
    ///   missing (connection was not bootstrapped by migrations).
    pub fn try_new(conn: Connection) -> StorageResult<Self> {
        let has_table: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'kv_store'
            );",
            [],
            |row| row.get(0),
        )?;
        if !has_table {
            return Err(StorageError::Unavailable(
                "kv_store table missing; open the connection with db::open_db".to_string(),
            ));
        }
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl KvRepository for SqliteKvRepository {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let conn = self.conn.lock();
        let value = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        debug!(
            "event=kv_set module=repo status=ok backend=sqlite key={key} bytes={}",
            value.len()
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM kv_store WHERE key = ?1;", [key])?;
        Ok(())
    }
}

/// Process-memory medium for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryKvRepository {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryKvRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds raw content, bypassing any encoding.
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let repo = Self::default();
        repo.values.lock().insert(key.into(), value.into());
        repo
    }
}

impl KvRepository for MemoryKvRepository {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.values.lock().remove(key);
        Ok(())
    }
}

/// Medium for contexts with no durable storage (headless render, locked
/// profile). Every call fails with `StorageError::Unavailable`.
#[derive(Debug, Clone)]
pub struct UnavailableKvRepository {
    reason: String,
}

impl UnavailableKvRepository {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl KvRepository for UnavailableKvRepository {
    fn backend(&self) -> &'static str {
        "unavailable"
    }

    fn get(&self, _key: &str) -> StorageResult<Option<String>> {
        Err(StorageError::Unavailable(self.reason.clone()))
    }

    fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Err(StorageError::Unavailable(self.reason.clone()))
    }

    fn remove(&self, _key: &str) -> StorageResult<()> {
        Err(StorageError::Unavailable(self.reason.clone()))
    }
}
