use super::migrations::init_with_migrations;
use crate::libs::data_storage::DataStorage;
use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

pub const DB_FILE_NAME: &str = "taskdesk.db";

/// How long a connection waits on a lock held by another process.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

pub struct Db {
    pub conn: Connection,
}

impl Db {
    /// Opens the database in the platform data directory.
    pub fn new() -> Result<Db> {
        let db_file_path = DataStorage::new().get_path(DB_FILE_NAME)?;
        Self::open(db_file_path)
    }

    /// Opens (or creates) the database at `path` and applies pending migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Db> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// A private database that disappears with the connection.
    pub fn open_in_memory() -> Result<Db> {
        Self::init(Connection::open_in_memory()?)
    }

    pub fn with_busy_timeout(self, timeout_ms: u64) -> Result<Db> {
        self.conn.busy_timeout(Duration::from_millis(timeout_ms))?;
        Ok(self)
    }

    fn init(mut conn: Connection) -> Result<Db> {
        conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
        init_with_migrations(&mut conn)?;
        Ok(Db { conn })
    }
}
