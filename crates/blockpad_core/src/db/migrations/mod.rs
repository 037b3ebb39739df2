//! Schema steps for the blob database.
//!
//! Version 1 creates `kv_entries`, the single table behind
//! `SqliteBlobStore`. Each step is a SQL script paired with the
//! `PRAGMA user_version` value it leaves behind.
//!
//! # Invariants
//! - Steps are listed oldest first with strictly increasing versions.
//! - All pending steps run in one transaction; a failure applies none.
//! - A file stamped with a version newer than [`latest_version`] is refused
//!   rather than opened read-write.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// `(user_version, script)` pairs.
const SCHEMA_STEPS: &[(u32, &str)] = &[(1, include_str!("0001_init.sql"))];

/// Highest schema version this build writes.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |(version, _)| *version)
}

/// Brings `conn` up to [`latest_version`].
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let target = latest_version();
    if found > target {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: found,
            latest_supported: target,
        });
    }
    if found == target {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (version, script) in SCHEMA_STEPS.iter().filter(|(version, _)| *version > found) {
        tx.execute_batch(script)?;
        tx.pragma_update(None, "user_version", version)?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        found, target
    );
    Ok(())
}
