/// Every user-facing text of the application.
///
/// Variants carry the values they interpolate; the wording lives in the
/// `Display` impl in `display.rs`.
#[derive(Debug, Clone)]
pub enum Message {
    // === TASK MESSAGES ===
    TaskCreated(String),       // title
    TaskUpdated(String),       // title
    TaskDeleted(String),       // title
    TaskNotFound(String),      // id
    TaskStatusChanged(String), // status
    TasksHeader(String),       // user name
    TaskDetailsHeader,
    NoTasksYet,
    NoTasksMatchingStatus(String), // status
    NoDescriptionProvided,
    NoChangesDetected,
    EmptyTaskTitle,
    InvalidTaskInput(String), // reason
    ConfirmDeleteTask(String), // title
    PromptTaskTitle,
    PromptTaskDescription,
    PromptTaskStatus,
    SelectTaskAction,
    SelectTask,

    // === USER MESSAGES ===
    Welcome(String), // name
    UserNotConfigured,

    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigDeleted,
    ConfigNotFound,
    ConfigParseError(String), // error
    ConfigModuleUser,
    ConfigModuleStore,
    PromptSelectModules,
    PromptUserId,
    PromptUserName,
    PromptConflictRetries,
    PromptBusyTimeout,

    // === STORAGE MESSAGES ===
    EphemeralStorage,
    TaskCollectionCorrupt(String), // error
    TaskCollectionBusy(u32),       // attempts

    // === DATABASE MESSAGES ===
    DatabaseUpToDate,
    MigrationsFound(usize),
    RunningMigration(u32, String), // version, name
    MigrationCompleted(u32),
    MigrationFailed(u32, String), // version, error

    // === GENERIC MESSAGES ===
    OperationCancelled,
}
