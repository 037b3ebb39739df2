//! Key-value blob store contracts and implementations.
//!
//! # Responsibility
//! - Persist opaque UTF-8 blobs (the `pages` and `history` JSON documents)
//!   under string keys.
//! - Keep SQL details inside the repository boundary.
//!
//! # Invariants
//! - `put` replaces the whole value for a key.
//! - `get` on a missing key is `Ok(None)`, never an error.

use crate::db::migrations::latest_version;
use crate::db::{open_db, open_db_in_memory, DbError};
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from blob store operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "blob store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "blob store requires table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Abstract key-value blob storage.
pub trait BlobStore {
    /// Loads one blob.
    fn get(&self, key: &str) -> RepoResult<Option<String>>;
    /// Inserts or replaces one blob.
    fn put(&self, key: &str, value: &str) -> RepoResult<()>;
    /// Deletes one blob. Returns whether it existed.
    fn remove(&self, key: &str) -> RepoResult<bool>;
}

/// SQLite-backed blob store over the `kv_entries` table.
pub struct SqliteBlobStore {
    conn: Connection,
}

impl SqliteBlobStore {
    /// Wraps a migrated connection.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        ensure_blob_connection_ready(&conn)?;
        Ok(Self { conn })
    }

    /// Opens (creating if needed) a database file.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Opens a throwaway in-memory database.
    pub fn open_in_memory() -> RepoResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl BlobStore for SqliteBlobStore {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(changed > 0)
    }
}

/// In-process blob store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> RepoResult<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> RepoResult<bool> {
        Ok(self.entries.borrow_mut().remove(key).is_some())
    }
}

impl<T: BlobStore + ?Sized> BlobStore for &T {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str) -> RepoResult<()> {
        (**self).put(key, value)
    }

    fn remove(&self, key: &str) -> RepoResult<bool> {
        (**self).remove(key)
    }
}

fn ensure_blob_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'kv_entries'
        );",
        [],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::MissingRequiredTable("kv_entries"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{BlobStore, MemoryBlobStore, RepoError, SqliteBlobStore};
    use rusqlite::Connection;

    #[test]
    fn sqlite_put_replaces_existing_value() {
        let store = SqliteBlobStore::open_in_memory().unwrap();
        store.put("pages", "[]").unwrap();
        store.put("pages", "[1]").unwrap();
        assert_eq!(store.get("pages").unwrap().as_deref(), Some("[1]"));
        assert!(store.remove("pages").unwrap());
        assert!(!store.remove("pages").unwrap());
        assert_eq!(store.get("pages").unwrap(), None);
    }

    #[test]
    fn try_new_rejects_unmigrated_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SqliteBlobStore::try_new(conn).err().unwrap();
        assert!(matches!(
            err,
            RepoError::UninitializedConnection {
                actual_version: 0,
                ..
            }
        ));
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryBlobStore::new();
        assert_eq!(store.get("history").unwrap(), None);
        store.put("history", "{}").unwrap();
        assert_eq!(store.get("history").unwrap().as_deref(), Some("{}"));
    }
}
