//! Plain-text rendering of tasks for the CLI.

use chrono::{DateTime, Utc};

use crate::models::{StatusFilter, Task, TaskQuery};

/// e.g. `Jan 5, 2026 14:30`
pub const TIMESTAMP_FORMAT: &str = "%b %-d, %Y %H:%M";

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn format_task(task: &Task) -> String {
    let mut out = format!("#{} [{}] {}", task.id, task.status.label(), task.title);
    if let Some(description) = task.description.as_deref().filter(|d| !d.is_empty()) {
        out.push_str(&format!("\n    {}", description));
    }
    out.push_str(&format!(
        "\n    Created: {}  Updated: {}",
        format_timestamp(task.created_at),
        format_timestamp(task.updated_at)
    ));
    out
}

pub fn format_task_list(query: &TaskQuery, tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return match &query.status {
            StatusFilter::Only(status) => format!("No {} tasks found", status.label()),
            StatusFilter::Unmatched(raw) => format!("No {} tasks found", raw.replace('_', " ")),
            StatusFilter::Any => "No tasks found. Create your first task!".to_string(),
        };
    }

    tasks
        .iter()
        .map(format_task)
        .collect::<Vec<_>>()
        .join("\n")
}
