//! Versioned key-value slots.
//!
//! The task collection lives in a single slot. Every slot carries a version
//! counter that grows by one on each successful write, and writers must
//! present the version they read. A writer holding a stale version gets
//! [`StorageError::Conflict`] instead of overwriting someone else's change.
//!
//! Version `0` stands for "no such slot": reading an absent key yields
//! `None`, and writing with `expected_version == 0` creates the slot.

use parking_lot::Mutex;
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised by a [`KeyValueStorage`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("slot '{key}' moved: expected version {expected}, found {actual}")]
    Conflict { key: String, expected: u64, actual: u64 },
    #[error("slot '{key}' carries an invalid version {version}")]
    InvalidVersion { key: String, version: i64 },
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Slot contents together with the version they were read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned {
    pub value: String,
    pub version: u64,
}

/// A durable map from string keys to string values with compare-and-swap writes.
pub trait KeyValueStorage {
    /// Returns the current value and version of `key`, or `None` if it was never written.
    fn read(&self, key: &str) -> StorageResult<Option<Versioned>>;

    /// Stores `value` under `key` if the slot is still at `expected_version`.
    ///
    /// Returns the new version on success.
    fn write(&self, key: &str, value: &str, expected_version: u64) -> StorageResult<u64>;
}

impl<S: KeyValueStorage + ?Sized> KeyValueStorage for &S {
    fn read(&self, key: &str) -> StorageResult<Option<Versioned>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str, expected_version: u64) -> StorageResult<u64> {
        (**self).write(key, value, expected_version)
    }
}

impl<S: KeyValueStorage + ?Sized> KeyValueStorage for Box<S> {
    fn read(&self, key: &str) -> StorageResult<Option<Versioned>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str, expected_version: u64) -> StorageResult<u64> {
        (**self).write(key, value, expected_version)
    }
}

/// Process-local storage. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, Versioned>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn read(&self, key: &str) -> StorageResult<Option<Versioned>> {
        Ok(self.slots.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str, expected_version: u64) -> StorageResult<u64> {
        let mut slots = self.slots.lock();
        let actual = slots.get(key).map_or(0, |slot| slot.version);
        if actual != expected_version {
            return Err(StorageError::Conflict {
                key: key.to_string(),
                expected: expected_version,
                actual,
            });
        }

        let version = actual + 1;
        slots.insert(
            key.to_string(),
            Versioned {
                value: value.to_string(),
                version,
            },
        );
        Ok(version)
    }
}

