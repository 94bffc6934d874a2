//! Task management command.
//!
//! Every subcommand works on the active user's tasks only. Without a
//! subcommand an interactive menu keeps running until "Quit", which is also
//! the only useful way to work with `--ephemeral` storage.

use super::GlobalArgs;
use crate::{
    db::{db::Db, kv::SqliteStorage},
    libs::{
        config::{Config, UserConfig},
        messages::Message,
        storage::{KeyValueStorage, MemoryStorage},
        store::{TaskStore, TaskStoreError, UserTasks},
        task::{Task, TaskPatch, TaskStatus},
        view::View,
    },
    msg_bail_anyhow, msg_error, msg_info, msg_print, msg_success, msg_warning,
};
use anyhow::Result;
use clap::{Args, Subcommand};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};

#[derive(Debug, Args)]
pub struct TaskArgs {
    #[command(subcommand)]
    command: Option<TaskCommand>,
}

#[derive(Debug, Subcommand)]
enum TaskCommand {
    /// List your tasks
    List {
        /// Only show tasks with this status
        #[arg(short, long, value_enum)]
        status: Option<TaskStatus>,
    },
    /// Create a new task
    Add {
        /// Task title (prompted when omitted)
        title: Option<String>,
        /// Task description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Edit title and description of a task
    Edit {
        /// Task ID
        id: String,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Change the status of a task
    Status {
        /// Task ID
        id: String,
        /// New status
        #[arg(value_enum)]
        status: TaskStatus,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show a single task
    Show {
        /// Task ID
        id: String,
    },
}

pub fn cmd(args: TaskArgs, global: &GlobalArgs) -> Result<()> {
    let config = Config::read()?;
    let user = global.current_user(&config)?;
    let store = open_store(&config, global.ephemeral)?;
    let tasks = store.for_user(&user.id);

    match args.command {
        Some(TaskCommand::List { status }) => report(handle_list(&tasks, &user, status)),
        Some(TaskCommand::Add { title, description }) => report(handle_add(&tasks, title, description)),
        Some(TaskCommand::Edit { id, title, description }) => report(handle_edit(&tasks, &id, title, description)),
        Some(TaskCommand::Status { id, status }) => report(handle_status(&tasks, &id, status)),
        Some(TaskCommand::Delete { id, yes }) => report(handle_delete(&tasks, &id, yes)),
        Some(TaskCommand::Show { id }) => report(handle_show(&tasks, &id)),
        None => handle_interactive(&tasks, &user),
    }
}

/// Task store over the configured database, or over memory with `--ephemeral`.
pub fn open_store(config: &Config, ephemeral: bool) -> Result<TaskStore<Box<dyn KeyValueStorage>>> {
    let settings = config.store_or_default();
    let storage: Box<dyn KeyValueStorage> = if ephemeral {
        msg_warning!(Message::EphemeralStorage);
        Box::new(MemoryStorage::new())
    } else {
        Box::new(SqliteStorage::new(Db::new()?.with_busy_timeout(settings.busy_timeout_ms)?))
    };

    Ok(TaskStore::new(storage).with_conflict_retries(settings.conflict_retries))
}

/// Turns expected store failures into user messages; everything else propagates.
fn report(result: Result<()>) -> Result<()> {
    let err = match result {
        Ok(()) => return Ok(()),
        Err(err) => err,
    };

    match err.downcast_ref::<TaskStoreError>() {
        Some(TaskStoreError::NotFound(id)) => {
            msg_error!(Message::TaskNotFound(id.clone()));
            Ok(())
        }
        Some(TaskStoreError::InvalidInput(reason)) => {
            msg_error!(Message::InvalidTaskInput(reason.to_string()));
            Ok(())
        }
        Some(TaskStoreError::Corrupt(source)) => msg_bail_anyhow!(Message::TaskCollectionCorrupt(source.to_string())),
        Some(TaskStoreError::Conflict { attempts }) => msg_bail_anyhow!(Message::TaskCollectionBusy(*attempts)),
        _ => Err(err),
    }
}

fn handle_list<S: KeyValueStorage>(tasks: &UserTasks<'_, S>, user: &UserConfig, status: Option<TaskStatus>) -> Result<()> {
    let list = filter_by_status(tasks.list()?, status);

    if list.is_empty() {
        match status {
            Some(status) => msg_info!(Message::NoTasksMatchingStatus(status.to_string())),
            None => msg_info!(Message::NoTasksYet),
        }
        return Ok(());
    }

    msg_print!(Message::TasksHeader(user.display_name().to_string()), true);
    View::tasks(&list);
    Ok(())
}

/// Display filter for `task list --status`.
fn filter_by_status(mut list: Vec<Task>, status: Option<TaskStatus>) -> Vec<Task> {
    if let Some(status) = status {
        list.retain(|task| task.status == status);
    }
    list
}

fn handle_add<S: KeyValueStorage>(tasks: &UserTasks<'_, S>, title: Option<String>, description: Option<String>) -> Result<()> {
    let (title, description) = match title {
        Some(title) => (title, description.unwrap_or_default()),
        None => {
            let title = prompt_title(None)?;
            let description = match description {
                Some(description) => description,
                None => prompt_description(None)?,
            };
            (title, description)
        }
    };

    if title.trim().is_empty() {
        msg_error!(Message::EmptyTaskTitle);
        return Ok(());
    }

    let task = tasks.create(&title, &description)?;
    msg_success!(Message::TaskCreated(task.title));
    Ok(())
}

fn handle_edit<S: KeyValueStorage>(
    tasks: &UserTasks<'_, S>,
    id: &str,
    title: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let task = match tasks.get(id)? {
        Some(task) => task,
        None => {
            msg_error!(Message::TaskNotFound(id.to_string()));
            return Ok(());
        }
    };

    let patch = if title.is_none() && description.is_none() {
        TaskPatch::default()
            .title(prompt_title(Some(&task.title))?)
            .description(prompt_description(Some(&task.description))?)
    } else {
        TaskPatch {
            title,
            description,
            status: None,
        }
    };

    if patch.title.as_deref().is_some_and(|title| title.trim().is_empty()) {
        msg_error!(Message::EmptyTaskTitle);
        return Ok(());
    }

    let patch = patch.diff_against(&task);
    if patch.is_empty() {
        msg_info!(Message::NoChangesDetected);
        return Ok(());
    }

    let updated = tasks.update(&task.id, &patch)?;
    msg_success!(Message::TaskUpdated(updated.title));
    Ok(())
}

fn handle_status<S: KeyValueStorage>(tasks: &UserTasks<'_, S>, id: &str, status: TaskStatus) -> Result<()> {
    let updated = tasks.set_status(id, status)?;
    msg_success!(Message::TaskStatusChanged(updated.status.to_string()));
    Ok(())
}

fn handle_delete<S: KeyValueStorage>(tasks: &UserTasks<'_, S>, id: &str, yes: bool) -> Result<()> {
    let task = match tasks.get(id)? {
        Some(task) => task,
        None => {
            msg_error!(Message::TaskNotFound(id.to_string()));
            return Ok(());
        }
    };

    let confirmed = yes
        || Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::ConfirmDeleteTask(task.title.clone()).to_string())
            .default(false)
            .interact()?;

    if !confirmed {
        msg_info!(Message::OperationCancelled);
        return Ok(());
    }

    let deleted = tasks.delete(&task.id)?;
    msg_success!(Message::TaskDeleted(deleted.title));
    Ok(())
}

fn handle_show<S: KeyValueStorage>(tasks: &UserTasks<'_, S>, id: &str) -> Result<()> {
    match tasks.get(id)? {
        Some(task) => {
            msg_print!(Message::TaskDetailsHeader, true);
            View::task(&task);
        }
        None => msg_error!(Message::TaskNotFound(id.to_string())),
    }
    Ok(())
}

fn handle_interactive<S: KeyValueStorage>(tasks: &UserTasks<'_, S>, user: &UserConfig) -> Result<()> {
    msg_print!(Message::Welcome(user.display_name().to_string()));

    let options = vec!["List tasks", "Add task", "Edit task", "Change status", "Delete task", "Quit"];
    loop {
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::SelectTaskAction.to_string())
            .items(&options)
            .default(0)
            .interact()?;

        let result = match selection {
            0 => handle_list(tasks, user, None),
            1 => handle_add(tasks, None, None),
            2 => match choose_task(tasks)? {
                Some(task) => handle_edit(tasks, &task.id, None, None),
                None => Ok(()),
            },
            3 => match choose_task(tasks)? {
                Some(task) => choose_status(task.status).and_then(|status| handle_status(tasks, &task.id, status)),
                None => Ok(()),
            },
            4 => match choose_task(tasks)? {
                Some(task) => handle_delete(tasks, &task.id, false),
                None => Ok(()),
            },
            _ => return Ok(()),
        };
        report(result)?;
    }
}

fn choose_task<S: KeyValueStorage>(tasks: &UserTasks<'_, S>) -> Result<Option<Task>> {
    let mut list = tasks.list()?;
    if list.is_empty() {
        msg_info!(Message::NoTasksYet);
        return Ok(None);
    }

    let choices: Vec<String> = list.iter().map(View::task_choice).collect();
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(Message::SelectTask.to_string())
        .items(&choices)
        .default(0)
        .interact()?;
    Ok(Some(list.swap_remove(selection)))
}

fn choose_status(current: TaskStatus) -> Result<TaskStatus> {
    let current_index = TaskStatus::ALL.iter().position(|status| *status == current).unwrap_or(0);
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(Message::PromptTaskStatus.to_string())
        .items(&TaskStatus::ALL)
        .default(current_index)
        .interact()?;
    Ok(TaskStatus::ALL[selection])
}

fn prompt_title(current: Option<&str>) -> Result<String> {
    let theme = ColorfulTheme::default();
    let mut input = Input::<String>::with_theme(&theme).with_prompt(Message::PromptTaskTitle.to_string());
    if let Some(current) = current {
        input = input.with_initial_text(current);
    }
    Ok(input.interact_text()?)
}

fn prompt_description(current: Option<&str>) -> Result<String> {
    let theme = ColorfulTheme::default();
    let mut input = Input::<String>::with_theme(&theme)
        .with_prompt(Message::PromptTaskDescription.to_string())
        .allow_empty(true);
    if let Some(current) = current {
        input = input.with_initial_text(current);
    }
    Ok(input.interact_text()?)
}

#[cfg(test)]
mod tests {
    use super::super::{Cli, Commands};
    use super::*;
    use clap::Parser;

    fn corrupt_error() -> TaskStoreError {
        TaskStoreError::Corrupt(serde_json::from_str::<Vec<Task>>("{not json").unwrap_err())
    }

    #[test]
    fn test_report_handles_expected_failures() {
        assert!(report(Ok(())).is_ok());
        assert!(report(Err(TaskStoreError::NotFound("missing".to_string()).into())).is_ok());
        assert!(report(Err(TaskStoreError::InvalidInput("title must not be empty").into())).is_ok());
    }

    #[test]
    fn test_report_fails_on_store_breakage() {
        assert!(report(Err(corrupt_error().into())).is_err());

        let err = report(Err(TaskStoreError::Conflict { attempts: 4 }.into())).unwrap_err();
        assert!(err.to_string().contains('4'));

        assert!(report(Err(anyhow::anyhow!("disk on fire"))).is_err());
    }

    #[test]
    fn test_status_filter() {
        let store = TaskStore::new(MemoryStorage::new());
        let tasks = store.for_user("u1");
        let first = tasks.create("First", "").unwrap();
        let second = tasks.create("Second", "").unwrap();
        tasks.set_status(&second.id, TaskStatus::Completed).unwrap();

        let all = tasks.list().unwrap();
        assert_eq!(filter_by_status(all.clone(), None).len(), 2);

        let pending = filter_by_status(all.clone(), Some(TaskStatus::Pending));
        assert_eq!(pending.iter().map(|t| &t.id).collect::<Vec<_>>(), vec![&first.id]);

        assert!(filter_by_status(all, Some(TaskStatus::InProgress)).is_empty());
        assert!(handle_list(&tasks, &UserConfig::new("u1"), Some(TaskStatus::Completed)).is_ok());
    }

    #[test]
    fn test_handle_status_updates_own_task_only() {
        let store = TaskStore::new(MemoryStorage::new());
        let mine = store.for_user("u1");
        let theirs = store.for_user("u2");
        let task = mine.create("Ship it", "").unwrap();

        handle_status(&mine, &task.id, TaskStatus::InProgress).unwrap();
        assert_eq!(mine.get(&task.id).unwrap().unwrap().status, TaskStatus::InProgress);

        let result = handle_status(&theirs, &task.id, TaskStatus::Completed);
        assert!(matches!(
            result.as_ref().map_err(|e| e.downcast_ref::<TaskStoreError>()),
            Err(Some(TaskStoreError::NotFound(_)))
        ));
        assert!(report(result).is_ok());
        assert_eq!(mine.get(&task.id).unwrap().unwrap().status, TaskStatus::InProgress);
    }

    #[test]
    fn test_ephemeral_store_is_private_to_each_open() {
        let config = Config::default();
        let first = open_store(&config, true).unwrap();
        first.create("u1", "Only here", "").unwrap();

        let second = open_store(&config, true).unwrap();
        assert!(second.list_for_user("u1").unwrap().is_empty());
        assert_eq!(first.list_for_user("u1").unwrap().len(), 1);
    }

    #[test]
    fn test_parse_status_command() {
        let cli = Cli::try_parse_from(["taskdesk", "task", "status", "x", "in-progress"]).unwrap();
        match cli.command {
            Commands::Task(TaskArgs {
                command: Some(TaskCommand::Status { id, status }),
            }) => {
                assert_eq!(id, "x");
                assert_eq!(status, TaskStatus::InProgress);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(Cli::try_parse_from(["taskdesk", "task", "status", "x", "done"]).is_err());
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["taskdesk", "task", "list", "--status", "completed", "--user", "bob", "--ephemeral"]).unwrap();
        assert_eq!(cli.global.user.as_deref(), Some("bob"));
        assert!(cli.global.ephemeral);
        assert!(matches!(
            cli.command,
            Commands::Task(TaskArgs {
                command: Some(TaskCommand::List {
                    status: Some(TaskStatus::Completed)
                }),
            })
        ));
    }

    #[test]
    fn test_task_without_subcommand_is_interactive() {
        let cli = Cli::try_parse_from(["taskdesk", "task"]).unwrap();
        assert!(matches!(cli.command, Commands::Task(TaskArgs { command: None })));
    }
}
