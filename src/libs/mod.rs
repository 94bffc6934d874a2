//! Core library modules for taskdesk.
//!
//! ## Features
//!
//! - **Task Model**: `Task`, `TaskStatus` and partial updates via `TaskPatch`
//! - **Task Store**: per-user CRUD over a single versioned collection
//! - **Storage**: versioned key-value slots with compare-and-swap writes
//! - **Infrastructure**: configuration, data directory, messaging
//! - **User Interface**: terminal tables
//!
//! ## Usage
//!
//! ```rust
//! use taskdesk::libs::storage::MemoryStorage;
//! use taskdesk::libs::store::TaskStore;
//!
//! let store = TaskStore::new(MemoryStorage::new());
//! let tasks = store.for_user("alice");
//! tasks.create("Write report", "Q3 numbers")?;
//! assert_eq!(tasks.list()?.len(), 1);
//! # Ok::<(), taskdesk::libs::store::TaskStoreError>(())
//! ```

pub mod config;
pub mod data_storage;
pub mod messages;
pub mod storage;
pub mod store;
pub mod task;
pub mod view;
