//! Display implementation for taskdesk application messages.
//!
//! All user-facing wording is defined here, in one match, so that commands
//! and library code only ever refer to [`Message`] variants.

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = match self {
            // === TASK MESSAGES ===
            Message::TaskCreated(title) => format!("Task '{}' created", title),
            Message::TaskUpdated(title) => format!("Task '{}' updated", title),
            Message::TaskDeleted(title) => format!("Task '{}' deleted", title),
            Message::TaskNotFound(id) => format!("Task with ID {} not found", id),
            Message::TaskStatusChanged(status) => format!("Task status changed to {}.", status),
            Message::TasksHeader(name) => format!("📋 Tasks of {}:", name),
            Message::TaskDetailsHeader => "📋 Task details:".to_string(),
            Message::NoTasksYet => "No tasks yet. Create your first task to get started".to_string(),
            Message::NoTasksMatchingStatus(status) => format!("No tasks with status '{}'", status),
            Message::NoDescriptionProvided => "No description provided".to_string(),
            Message::NoChangesDetected => "No changes detected".to_string(),
            Message::EmptyTaskTitle => "Task title must not be empty".to_string(),
            Message::InvalidTaskInput(reason) => format!("Invalid input: {}", reason),
            Message::ConfirmDeleteTask(title) => format!("Delete task '{}'?", title),
            Message::PromptTaskTitle => "Title".to_string(),
            Message::PromptTaskDescription => "Description".to_string(),
            Message::PromptTaskStatus => "Status".to_string(),
            Message::SelectTaskAction => "What do you want to do?".to_string(),
            Message::SelectTask => "Select a task".to_string(),

            // === USER MESSAGES ===
            Message::Welcome(name) => format!("Welcome, {}", name),
            Message::UserNotConfigured => {
                "No user selected. Run `taskdesk init`, pass --user, or set TASKDESK_USER".to_string()
            }

            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved successfully".to_string(),
            Message::ConfigDeleted => "Configuration removed".to_string(),
            Message::ConfigNotFound => "Configuration file not found".to_string(),
            Message::ConfigParseError(err) => format!("Failed to parse configuration: {}", err),
            Message::ConfigModuleUser => "User settings".to_string(),
            Message::ConfigModuleStore => "Storage settings".to_string(),
            Message::PromptSelectModules => "Select modules to configure (space to toggle)".to_string(),
            Message::PromptUserId => "User ID".to_string(),
            Message::PromptUserName => "Display name".to_string(),
            Message::PromptConflictRetries => "Retries on concurrent writes".to_string(),
            Message::PromptBusyTimeout => "Database busy timeout (ms)".to_string(),

            // === STORAGE MESSAGES ===
            Message::EphemeralStorage => "Using in-memory storage, changes will not be saved".to_string(),
            Message::TaskCollectionCorrupt(err) => format!("Stored tasks cannot be read and were left untouched: {}", err),
            Message::TaskCollectionBusy(attempts) => {
                format!("Tasks were changed by another process {} times in a row, try again", attempts)
            }

            // === DATABASE MESSAGES ===
            Message::DatabaseUpToDate => "Database is up to date".to_string(),
            Message::MigrationsFound(count) => format!("Found {} pending migration(s)", count),
            Message::RunningMigration(version, name) => format!("Running migration v{}: {}", version, name),
            Message::MigrationCompleted(version) => format!("Migration v{} completed", version),
            Message::MigrationFailed(version, err) => format!("Migration v{} failed: {}", version, err),

            // === GENERIC MESSAGES ===
            Message::OperationCancelled => "Operation cancelled".to_string(),
        };

        write!(f, "{}", text)
    }
}
