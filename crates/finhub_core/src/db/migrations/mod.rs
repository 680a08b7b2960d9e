//! Schema bootstrap for the key-value medium.
//!
//! # Responsibility
//! - Create the `kv_store` table on a fresh database.
//! - Refuse databases written by a newer schema.
//!
//! # Invariants
//! - The schema version is mirrored to `PRAGMA user_version`.
//! - Table creation and the version bump commit together.

use crate::db::{DbError, DbResult};
use log::debug;
use rusqlite::Connection;

const SCHEMA_VERSION: u32 = 1;
const KV_STORE_SQL: &str = include_str!("0001_kv_store.sql");

/// Returns the schema version written by this binary.
pub fn latest_version() -> u32 {
    SCHEMA_VERSION
}

/// Brings the connection to `SCHEMA_VERSION`.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    match conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))? {
        SCHEMA_VERSION => Ok(()),
        0 => {
            let tx = conn.transaction()?;
            tx.execute_batch(KV_STORE_SQL)?;
            tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
            tx.commit()?;
            debug!("event=db_migrate module=db status=ok version={SCHEMA_VERSION}");
            Ok(())
        }
        db_version => Err(DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported: SCHEMA_VERSION,
        }),
    }
}
