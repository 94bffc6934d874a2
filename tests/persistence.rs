#[cfg(test)]
mod tests {
    use serde_json::Value;
    use std::path::PathBuf;
    use taskdesk::db::{db::Db, kv::SqliteStorage};
    use taskdesk::libs::storage::KeyValueStorage;
    use taskdesk::libs::store::{TaskStore, TaskStoreError, TASKS_KEY};
    use taskdesk::libs::task::{TaskPatch, TaskStatus};
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct PersistenceTestContext {
        _temp_dir: TempDir,
        db_path: PathBuf,
    }

    impl PersistenceTestContext {
        /// A fresh session against the same database file.
        fn open(&self) -> TaskStore<SqliteStorage> {
            TaskStore::new(SqliteStorage::new(Db::open(&self.db_path).unwrap()))
        }
    }

    impl TestContext for PersistenceTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let db_path = temp_dir.path().join("taskdesk.db");
            PersistenceTestContext {
                _temp_dir: temp_dir,
                db_path,
            }
        }
    }

    #[test_context(PersistenceTestContext)]
    #[test]
    fn test_tasks_survive_reopen(ctx: &mut PersistenceTestContext) {
        let created = {
            let store = ctx.open();
            let task = store.create("u1", "Persist me", "across sessions").unwrap();
            store
                .update(&task.id, &TaskPatch::default().status(TaskStatus::InProgress))
                .unwrap()
        };

        let reloaded = ctx.open().list_for_user("u1").unwrap();
        assert_eq!(reloaded, vec![created]);
    }

    #[test_context(PersistenceTestContext)]
    #[test]
    fn test_missing_blob_is_empty_collection(ctx: &mut PersistenceTestContext) {
        let store = ctx.open();
        assert!(store.storage().read(TASKS_KEY).unwrap().is_none());
        assert!(store.list_for_user("u1").unwrap().is_empty());
    }

    #[test_context(PersistenceTestContext)]
    #[test]
    fn test_stored_format(ctx: &mut PersistenceTestContext) {
        let store = ctx.open();
        let task = store.create("u1", "Format", "check").unwrap();
        store.update(&task.id, &TaskPatch::default().status(TaskStatus::InProgress)).unwrap();

        let raw = store.storage().read(TASKS_KEY).unwrap().unwrap().value;
        let json: Value = serde_json::from_str(&raw).unwrap();
        let records = json.as_array().unwrap();
        assert_eq!(records.len(), 1);

        let record = records[0].as_object().unwrap();
        let mut keys: Vec<&str> = record.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, vec!["createdAt", "description", "id", "status", "title", "userId"]);
        assert_eq!(record["status"], "in-progress");
        assert_eq!(record["userId"], "u1");

        let created_at = record["createdAt"].as_str().unwrap();
        assert!(created_at.ends_with('Z'));
        // YYYY-MM-DDTHH:MM:SS.sssZ
        assert_eq!(created_at.len(), 24);
    }

    #[test_context(PersistenceTestContext)]
    #[test]
    fn test_reads_collection_written_by_other_tools(ctx: &mut PersistenceTestContext) {
        let store = ctx.open();
        let foreign = r#"[
            {"id":"k3j9x2a","title":"Imported","description":"","status":"completed","createdAt":"2024-05-01T09:30:00.000Z","userId":"u1"},
            {"id":"p0q8w1z","title":"Other","description":"x","status":"pending","createdAt":"2024-05-02T10:00:00+02:00","userId":"u2"}
        ]"#;
        store.storage().write(TASKS_KEY, foreign, 0).unwrap();

        let u1 = store.list_for_user("u1").unwrap();
        assert_eq!(u1.len(), 1);
        assert_eq!(u1[0].id, "k3j9x2a");
        assert_eq!(u1[0].status, TaskStatus::Completed);

        let u2 = store.list_for_user("u2").unwrap();
        assert_eq!(u2[0].created_at.to_rfc3339(), "2024-05-02T08:00:00+00:00");

        // Mutations keep records they did not touch.
        store.create("u1", "Fresh", "").unwrap();
        assert_eq!(store.list_for_user("u2").unwrap(), u2);
    }

    #[test_context(PersistenceTestContext)]
    #[test]
    fn test_corrupt_blob_is_reported_and_left_alone(ctx: &mut PersistenceTestContext) {
        let store = ctx.open();
        store.storage().write(TASKS_KEY, "{not json", 0).unwrap();

        assert!(matches!(store.list_for_user("u1"), Err(TaskStoreError::Corrupt(_))));
        assert!(matches!(store.create("u1", "Would overwrite", ""), Err(TaskStoreError::Corrupt(_))));
        assert!(matches!(store.delete("anything"), Err(TaskStoreError::Corrupt(_))));

        let slot = store.storage().read(TASKS_KEY).unwrap().unwrap();
        assert_eq!(slot.value, "{not json");
        assert_eq!(slot.version, 1);
    }

    #[test_context(PersistenceTestContext)]
    #[test]
    fn test_two_sessions_do_not_lose_updates(ctx: &mut PersistenceTestContext) {
        let first = ctx.open();
        let second = ctx.open();

        first.create("u1", "From first", "").unwrap();
        second.create("u1", "From second", "").unwrap();
        first.create("u1", "First again", "").unwrap();

        let titles: Vec<String> = ctx.open().list_for_user("u1").unwrap().into_iter().map(|task| task.title).collect();
        assert_eq!(titles, vec!["From first", "From second", "First again"]);
    }
}
