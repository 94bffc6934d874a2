//! The task store.
//!
//! All tasks of all users live in one JSON array under the [`TASKS_KEY`]
//! slot of a [`KeyValueStorage`]. Every mutation reads the whole array,
//! changes it in memory and writes the whole array back, presenting the
//! version it read. When another writer got there first the storage rejects
//! the write and the mutation is replayed on top of the fresh collection,
//! up to the configured number of retries.
//!
//! ## Usage
//!
//! ```rust
//! use taskdesk::libs::storage::MemoryStorage;
//! use taskdesk::libs::store::TaskStore;
//! use taskdesk::libs::task::{TaskPatch, TaskStatus};
//!
//! let store = TaskStore::new(MemoryStorage::new());
//! let task = store.create("u1", "Buy milk", "")?;
//! store.update(&task.id, &TaskPatch::default().status(TaskStatus::Completed))?;
//! assert_eq!(store.list_for_user("u1")?[0].status, TaskStatus::Completed);
//! # Ok::<(), taskdesk::libs::store::TaskStoreError>(())
//! ```

use super::storage::{KeyValueStorage, StorageError};
use super::task::{Task, TaskPatch, TaskStatus};
use thiserror::Error;

/// Storage key holding the serialized task collection.
pub const TASKS_KEY: &str = "tasks";

/// How many times a conflicting mutation is replayed before giving up.
pub const DEFAULT_CONFLICT_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum TaskStoreError {
    #[error("task '{0}' not found")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("task collection kept changing underneath, gave up after {attempts} attempts")]
    Conflict { attempts: u32 },
    #[error("stored task collection is unreadable: {0}")]
    Corrupt(#[source] serde_json::Error),
    #[error("failed to encode task collection: {0}")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, TaskStoreError>;

/// Result of a mutation closure: whether the collection must be written back.
enum Outcome<T> {
    Changed(T),
    Unchanged(T),
}

pub struct TaskStore<S> {
    storage: S,
    max_conflict_retries: u32,
}

impl<S: KeyValueStorage> TaskStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            max_conflict_retries: DEFAULT_CONFLICT_RETRIES,
        }
    }

    pub fn with_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Scoped view for one user. See [`UserTasks`].
    pub fn for_user(&self, user_id: &str) -> UserTasks<'_, S> {
        UserTasks {
            store: self,
            user_id: user_id.to_string(),
        }
    }

    /// Tasks owned by `user_id`, in collection order.
    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<Task>> {
        let (tasks, _) = self.load()?;
        Ok(tasks.into_iter().filter(|task| task.user_id == user_id).collect())
    }

    pub fn get(&self, id: &str) -> Result<Option<Task>> {
        let (tasks, _) = self.load()?;
        Ok(tasks.into_iter().find(|task| task.id == id))
    }

    /// Appends a new pending task for `user_id`.
    ///
    /// Blank titles and blank user ids are rejected with
    /// [`TaskStoreError::InvalidInput`] and nothing is written.
    pub fn create(&self, user_id: &str, title: &str, description: &str) -> Result<Task> {
        if user_id.trim().is_empty() {
            return Err(TaskStoreError::InvalidInput("user id must not be empty"));
        }
        validate_title(title)?;

        let task = Task::new(user_id, title, description);
        self.mutate(|tasks| {
            tasks.push(task.clone());
            Ok(Outcome::Changed(task.clone()))
        })?;
        tracing::debug!(id = %task.id, user_id, "task created");
        Ok(task)
    }

    /// Replaces the fields present in `patch` and returns the updated task.
    pub fn update(&self, id: &str, patch: &TaskPatch) -> Result<Task> {
        self.update_owned(id, patch, None)
    }

    /// Removes the task and returns it.
    pub fn delete(&self, id: &str) -> Result<Task> {
        self.delete_owned(id, None)
    }

    fn update_owned(&self, id: &str, patch: &TaskPatch, owner: Option<&str>) -> Result<Task> {
        if let Some(title) = &patch.title {
            validate_title(title)?;
        }

        self.mutate(|tasks| {
            let task = tasks
                .iter_mut()
                .find(|task| task.id == id && owner.map_or(true, |owner| task.user_id == owner))
                .ok_or_else(|| TaskStoreError::NotFound(id.to_string()))?;
            if patch.is_empty() {
                return Ok(Outcome::Unchanged(task.clone()));
            }
            task.apply(patch);
            Ok(Outcome::Changed(task.clone()))
        })
    }

    fn delete_owned(&self, id: &str, owner: Option<&str>) -> Result<Task> {
        self.mutate(|tasks| {
            let position = tasks
                .iter()
                .position(|task| task.id == id && owner.map_or(true, |owner| task.user_id == owner))
                .ok_or_else(|| TaskStoreError::NotFound(id.to_string()))?;
            Ok(Outcome::Changed(tasks.remove(position)))
        })
    }

    fn load(&self) -> Result<(Vec<Task>, u64)> {
        match self.storage.read(TASKS_KEY)? {
            None => Ok((Vec::new(), 0)),
            Some(slot) => {
                let tasks = serde_json::from_str(&slot.value).map_err(TaskStoreError::Corrupt)?;
                Ok((tasks, slot.version))
            }
        }
    }

    /// Read-modify-write with replay on version conflicts.
    fn mutate<T>(&self, mut change: impl FnMut(&mut Vec<Task>) -> Result<Outcome<T>>) -> Result<T> {
        let attempts = self.max_conflict_retries + 1;
        for attempt in 1..=attempts {
            let (mut tasks, version) = self.load()?;
            let output = match change(&mut tasks)? {
                Outcome::Unchanged(output) => return Ok(output),
                Outcome::Changed(output) => output,
            };

            let encoded = serde_json::to_string(&tasks).map_err(TaskStoreError::Encode)?;
            match self.storage.write(TASKS_KEY, &encoded, version) {
                Ok(new_version) => {
                    tracing::debug!(key = TASKS_KEY, version = new_version, count = tasks.len(), "task collection written");
                    return Ok(output);
                }
                Err(StorageError::Conflict { expected, actual, .. }) => {
                    tracing::warn!(key = TASKS_KEY, expected, actual, attempt, "concurrent write detected, replaying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(TaskStoreError::Conflict { attempts })
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(TaskStoreError::InvalidInput("title must not be empty"));
    }
    Ok(())
}

/// The store as seen by a single user.
///
/// Tasks of other users are invisible here: looking them up, updating or
/// deleting them reports [`TaskStoreError::NotFound`] exactly as if the id
/// did not exist.
pub struct UserTasks<'a, S> {
    store: &'a TaskStore<S>,
    user_id: String,
}

impl<S: KeyValueStorage> UserTasks<'_, S> {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn list(&self) -> Result<Vec<Task>> {
        self.store.list_for_user(&self.user_id)
    }

    pub fn get(&self, id: &str) -> Result<Option<Task>> {
        Ok(self.store.get(id)?.filter(|task| task.user_id == self.user_id))
    }

    pub fn create(&self, title: &str, description: &str) -> Result<Task> {
        self.store.create(&self.user_id, title, description)
    }

    pub fn update(&self, id: &str, patch: &TaskPatch) -> Result<Task> {
        self.store.update_owned(id, patch, Some(&self.user_id))
    }

    pub fn set_status(&self, id: &str, status: TaskStatus) -> Result<Task> {
        self.update(id, &TaskPatch::default().status(status))
    }

    pub fn delete(&self, id: &str) -> Result<Task> {
        self.store.delete_owned(id, Some(&self.user_id))
    }
}
