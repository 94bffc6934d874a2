//! Database layer for taskdesk.
//!
//! SQLite holds the versioned key-value slots the task store persists into.
//! The schema is managed by a small versioned migration system.
//!
//! ## Usage
//!
//! ```rust
//! use taskdesk::db::{db::Db, kv::SqliteStorage};
//! use taskdesk::libs::store::TaskStore;
//!
//! let store = TaskStore::new(SqliteStorage::new(Db::open_in_memory()?));
//! store.create("alice", "Review code", "Check PR #123")?;
//! # Ok::<(), anyhow::Error>(())
//! ```

/// Connection management and initialization.
///
/// Opens the database file in the data directory (or in memory), sets the
/// busy timeout and applies pending migrations.
pub mod db;

/// Versioned key-value slots on top of the `kv` table.
pub mod kv;

/// Database schema migration system.
pub mod migrations;
