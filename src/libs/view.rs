use super::messages::Message;
use super::task::Task;
use chrono::Local;
use prettytable::{row, Table};

pub struct View {}

impl View {
    pub fn tasks(tasks: &[Task]) {
        let mut table = Table::new();

        table.add_row(row!["ID", "TITLE", "DESCRIPTION", "STATUS", "CREATED"]);
        for task in tasks {
            table.add_row(row![task.id, task.title, Self::description(task), task.status, Self::created_on(task)]);
        }
        table.printstd();
    }

    pub fn task(task: &Task) {
        let mut table = Table::new();

        table.add_row(row!["ID", task.id]);
        table.add_row(row!["TITLE", task.title]);
        table.add_row(row!["DESCRIPTION", Self::description(task)]);
        table.add_row(row!["STATUS", task.status]);
        table.add_row(row!["CREATED", task.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")]);
        table.printstd();
    }

    /// Line shown in selection prompts.
    pub fn task_choice(task: &Task) -> String {
        format!("{} [{}]", task.title, task.status)
    }

    fn description(task: &Task) -> String {
        if task.description.trim().is_empty() {
            Message::NoDescriptionProvided.to_string()
        } else {
            task.description.clone()
        }
    }

    fn created_on(task: &Task) -> String {
        task.created_at.with_timezone(&Local).format("%Y-%m-%d").to_string()
    }
}
