//! SQLite-backed versioned key-value slots.
//!
//! Each slot is one row of the `kv` table. A write only lands when the row
//! is still at the version the writer read; the version column is bumped in
//! the same statement, so two processes sharing the database file cannot
//! both win with the same expected version.
//!
//! ## Usage
//!
//! ```rust
//! use taskdesk::db::{db::Db, kv::SqliteStorage};
//! use taskdesk::libs::storage::KeyValueStorage;
//!
//! let storage = SqliteStorage::new(Db::open_in_memory()?);
//! let version = storage.write("tasks", "[]", 0)?;
//! assert_eq!(storage.read("tasks")?.map(|slot| slot.version), Some(version));
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::db::Db;
use crate::libs::storage::{KeyValueStorage, StorageError, StorageResult, Versioned};
use rusqlite::{params, Connection, OptionalExtension};

const SELECT_SLOT: &str = "SELECT value, version FROM kv WHERE key = ?1";
const SELECT_VERSION: &str = "SELECT version FROM kv WHERE key = ?1";
const INSERT_SLOT: &str =
    "INSERT INTO kv (key, value, version) VALUES (?1, ?2, 1) ON CONFLICT(key) DO NOTHING RETURNING version";
const UPDATE_SLOT: &str = "UPDATE kv SET value = ?2, version = version + 1, updated_at = CURRENT_TIMESTAMP WHERE key = ?1 AND version = ?3 RETURNING version";

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn new(db: Db) -> Self {
        Self { conn: db.conn }
    }

    fn current_version(conn: &Connection, key: &str) -> StorageResult<u64> {
        let version: Option<i64> = conn.query_row(SELECT_VERSION, params![key], |row| row.get(0)).optional()?;
        version.map_or(Ok(0), |version| to_version(key, version))
    }
}

/// The `version` column is signed; anything below 1 was not written by us.
fn to_version(key: &str, raw: i64) -> StorageResult<u64> {
    match u64::try_from(raw) {
        Ok(version) if version > 0 => Ok(version),
        _ => Err(StorageError::InvalidVersion {
            key: key.to_string(),
            version: raw,
        }),
    }
}

impl KeyValueStorage for SqliteStorage {
    fn read(&self, key: &str) -> StorageResult<Option<Versioned>> {
        let slot: Option<(String, i64)> = self
            .conn
            .query_row(SELECT_SLOT, params![key], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;

        match slot {
            Some((value, version)) => Ok(Some(Versioned {
                value,
                version: to_version(key, version)?,
            })),
            None => Ok(None),
        }
    }

    fn write(&self, key: &str, value: &str, expected_version: u64) -> StorageResult<u64> {
        let tx = self.conn.unchecked_transaction()?;
        // A version the column cannot hold never matches a stored row.
        let written: Option<i64> = match (expected_version, i64::try_from(expected_version)) {
            (0, _) => tx.query_row(INSERT_SLOT, params![key, value], |row| row.get(0)).optional()?,
            (_, Ok(expected)) => tx.query_row(UPDATE_SLOT, params![key, value, expected], |row| row.get(0)).optional()?,
            (_, Err(_)) => None,
        };

        let Some(written) = written else {
            let actual = Self::current_version(&tx, key)?;
            return Err(StorageError::Conflict {
                key: key.to_string(),
                expected: expected_version,
                actual,
            });
        };

        let version = to_version(key, written)?;
        tx.commit()?;
        Ok(version)
    }
}
