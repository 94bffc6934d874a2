#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::path::PathBuf;
    use taskdesk::db::{db::Db, kv::SqliteStorage};
    use taskdesk::libs::storage::{KeyValueStorage, MemoryStorage, StorageError, StorageResult, Versioned};
    use taskdesk::libs::store::{TaskStore, TaskStoreError, TASKS_KEY};
    use taskdesk::libs::task::Task;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    /// Storage that lets another writer sneak in right before the next `interruptions` writes.
    struct RacingStorage {
        inner: MemoryStorage,
        interruptions: Cell<u32>,
    }

    impl RacingStorage {
        fn new(interruptions: u32) -> Self {
            Self {
                inner: MemoryStorage::new(),
                interruptions: Cell::new(interruptions),
            }
        }

        fn sneak_in(&self) -> StorageResult<()> {
            let (mut tasks, version): (Vec<Task>, u64) = match self.inner.read(TASKS_KEY)? {
                Some(slot) => (serde_json::from_str(&slot.value).unwrap(), slot.version),
                None => (Vec::new(), 0),
            };
            tasks.push(Task::new("intruder", "Written concurrently", ""));
            self.inner.write(TASKS_KEY, &serde_json::to_string(&tasks).unwrap(), version)?;
            Ok(())
        }
    }

    impl KeyValueStorage for RacingStorage {
        fn read(&self, key: &str) -> StorageResult<Option<Versioned>> {
            self.inner.read(key)
        }

        fn write(&self, key: &str, value: &str, expected_version: u64) -> StorageResult<u64> {
            if self.interruptions.get() > 0 {
                self.interruptions.set(self.interruptions.get() - 1);
                self.sneak_in()?;
            }
            self.inner.write(key, value, expected_version)
        }
    }

    struct SqliteTestContext {
        _temp_dir: TempDir,
        db_path: PathBuf,
        first: SqliteStorage,
        second: SqliteStorage,
    }

    impl TestContext for SqliteTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let db_path = temp_dir.path().join("kv.db");
            SqliteTestContext {
                first: SqliteStorage::new(Db::open(&db_path).unwrap()),
                second: SqliteStorage::new(Db::open(&db_path).unwrap()),
                db_path,
                _temp_dir: temp_dir,
            }
        }
    }

    fn assert_cas_semantics(storage: &dyn KeyValueStorage) {
        assert_eq!(storage.read("slot").unwrap(), None);

        assert_eq!(storage.write("slot", "a", 0).unwrap(), 1);
        assert_eq!(storage.write("slot", "b", 1).unwrap(), 2);

        let err = storage.write("slot", "stale", 1).unwrap_err();
        assert!(matches!(err, StorageError::Conflict { expected: 1, actual: 2, .. }));

        let err = storage.write("slot", "recreate", 0).unwrap_err();
        assert!(matches!(err, StorageError::Conflict { expected: 0, actual: 2, .. }));

        let err = storage.write("other", "ghost", 5).unwrap_err();
        assert!(matches!(err, StorageError::Conflict { expected: 5, actual: 0, .. }));

        assert_eq!(
            storage.read("slot").unwrap(),
            Some(Versioned {
                value: "b".to_string(),
                version: 2
            })
        );
        assert_eq!(storage.read("other").unwrap(), None);
    }

    #[test]
    fn test_memory_storage_compare_and_swap() {
        assert_cas_semantics(&MemoryStorage::new());
    }

    #[test_context(SqliteTestContext)]
    #[test]
    fn test_sqlite_storage_compare_and_swap(ctx: &mut SqliteTestContext) {
        assert_cas_semantics(&ctx.first);
    }

    #[test_context(SqliteTestContext)]
    #[test]
    fn test_sqlite_connections_see_each_others_versions(ctx: &mut SqliteTestContext) {
        ctx.first.write("slot", "from first", 0).unwrap();
        let seen = ctx.second.read("slot").unwrap().unwrap();
        assert_eq!(seen.value, "from first");
        assert_eq!(seen.version, 1);

        ctx.second.write("slot", "from second", seen.version).unwrap();

        let err = ctx.first.write("slot", "stale", 1).unwrap_err();
        assert!(matches!(err, StorageError::Conflict { expected: 1, actual: 2, .. }));
        assert_eq!(ctx.first.read("slot").unwrap().unwrap().value, "from second");
    }

    #[test_context(SqliteTestContext)]
    #[test]
    fn test_sqlite_rejects_versions_outside_column_range(ctx: &mut SqliteTestContext) {
        ctx.first.write("slot", "a", 0).unwrap();

        let err = ctx.first.write("slot", "huge", u64::MAX).unwrap_err();
        assert!(matches!(err, StorageError::Conflict { expected: u64::MAX, actual: 1, .. }));

        let db = Db::open(&ctx.db_path).unwrap();
        db.conn
            .execute("INSERT INTO kv (key, value, version) VALUES ('tampered', 'x', -3)", [])
            .unwrap();

        let err = ctx.second.read("tampered").unwrap_err();
        assert!(matches!(err, StorageError::InvalidVersion { version: -3, .. }));
        let err = ctx.second.write("tampered", "y", 1).unwrap_err();
        assert!(matches!(err, StorageError::InvalidVersion { version: -3, .. }));

        assert_eq!(ctx.first.read("slot").unwrap().unwrap().value, "a");
    }

    #[test]
    fn test_store_replays_mutation_after_conflict() {
        let store = TaskStore::new(RacingStorage::new(1));

        let mine = store.create("me", "Mine", "").unwrap();

        let intruder = store.list_for_user("intruder").unwrap();
        assert_eq!(intruder.len(), 1);
        assert_eq!(store.list_for_user("me").unwrap(), vec![mine]);
    }

    #[test]
    fn test_store_gives_up_after_configured_retries() {
        let store = TaskStore::new(RacingStorage::new(10)).with_conflict_retries(2);

        let err = store.create("me", "Never lands", "").unwrap_err();
        assert!(matches!(err, TaskStoreError::Conflict { attempts: 3 }));
        assert!(store.list_for_user("me").unwrap().is_empty());
        // Every interrupted attempt left the concurrent writer's task in place.
        assert_eq!(store.list_for_user("intruder").unwrap().len(), 3);
    }

    #[test]
    fn test_zero_retries_fails_on_first_conflict() {
        let store = TaskStore::new(RacingStorage::new(1)).with_conflict_retries(0);

        let err = store.create("me", "Unlucky", "").unwrap_err();
        assert!(matches!(err, TaskStoreError::Conflict { attempts: 1 }));

        store.create("me", "Lucky", "").unwrap();
        assert_eq!(store.list_for_user("me").unwrap().len(), 1);
    }
}
