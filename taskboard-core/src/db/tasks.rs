//! Task CRUD with soft-delete visibility.
//!
//! Every statement here filters on `deleted_at IS NULL`; a soft-deleted row
//! is indistinguishable from a missing one.

use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::{format_timestamp, next_timestamp, now, parse_timestamp, Database};
use crate::error::{TaskError, TaskResult};
use crate::models::{CreateTaskInput, Task, TaskQuery, TaskStatus, UpdateTaskInput};

const TASK_COLUMNS: &str = "id, title, description, status, created_at, updated_at, deleted_at";

fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get("status")?;
    let status = TaskStatus::from_str(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown task status: {}", status).into(),
        )
    })?;

    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    let deleted_at: Option<String> = row.get("deleted_at")?;

    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status,
        created_at: parse_timestamp(4, &created_at)?,
        updated_at: parse_timestamp(5, &updated_at)?,
        deleted_at: deleted_at
            .map(|raw| parse_timestamp(6, &raw))
            .transpose()?,
    })
}

/// Fetch a live task using an existing connection (or transaction).
fn find_live_task(conn: &Connection, id: i64) -> TaskResult<Option<Task>> {
    let sql = format!(
        "SELECT {} FROM tasks WHERE id = ?1 AND deleted_at IS NULL",
        TASK_COLUMNS
    );
    let task = conn
        .query_row(&sql, params![id], parse_task_row)
        .optional()?;
    Ok(task)
}

fn ensure_valid_id(id: i64) -> TaskResult<()> {
    if id > 0 {
        Ok(())
    } else {
        Err(TaskError::invalid("Invalid task ID"))
    }
}

impl Database {
    /// All live tasks matching `query`, in its order.
    pub fn list_tasks(&self, query: &TaskQuery) -> TaskResult<Vec<Task>> {
        let (filter, values) = query.where_clause();
        let sql = format!(
            "SELECT {} FROM tasks WHERE {} ORDER BY {}",
            TASK_COLUMNS,
            filter,
            query.order_clause()
        );

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(params_from_iter(values.iter()), parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
    }

    pub fn get_task(&self, id: i64) -> TaskResult<Task> {
        ensure_valid_id(id)?;
        self.with_conn(|conn| find_live_task(conn, id)?.ok_or(TaskError::NotFound))
    }

    pub fn create_task(&self, input: CreateTaskInput) -> TaskResult<Task> {
        let new_task = input.validate()?;
        let created_at = now();
        let stamp = format_timestamp(created_at);

        let id = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (title, description, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![
                    new_task.title,
                    new_task.description,
                    new_task.status.as_str(),
                    stamp
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        tracing::debug!(task_id = id, "Task created");

        Ok(Task {
            id,
            title: new_task.title,
            description: new_task.description,
            status: new_task.status,
            created_at,
            updated_at: created_at,
            deleted_at: None,
        })
    }

    /// Apply the fields present in `input` to a live task.
    ///
    /// `updated_at` always moves forward, even when no field is present.
    pub fn update_task(&self, id: i64, input: UpdateTaskInput) -> TaskResult<Task> {
        ensure_valid_id(id)?;
        let changes = input.validate()?;

        let task = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut task = find_live_task(&tx, id)?.ok_or(TaskError::NotFound)?;
            changes.apply_to(&mut task);
            task.updated_at = next_timestamp(task.updated_at);

            tx.execute(
                "UPDATE tasks SET title = ?1, description = ?2, status = ?3, updated_at = ?4
                 WHERE id = ?5 AND deleted_at IS NULL",
                params![
                    task.title,
                    task.description,
                    task.status.as_str(),
                    format_timestamp(task.updated_at),
                    id
                ],
            )?;
            tx.commit()?;

            Ok(task)
        })?;

        tracing::debug!(task_id = id, status = task.status.as_str(), "Task updated");
        Ok(task)
    }

    /// Soft-delete a live task. Returns the task as it now stands.
    pub fn delete_task(&self, id: i64) -> TaskResult<Task> {
        ensure_valid_id(id)?;

        let task = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut task = find_live_task(&tx, id)?.ok_or(TaskError::NotFound)?;
            let deleted_at = next_timestamp(task.updated_at);
            task.deleted_at = Some(deleted_at);
            task.updated_at = deleted_at;

            let stamp = format_timestamp(deleted_at);
            tx.execute(
                "UPDATE tasks SET deleted_at = ?1, updated_at = ?1
                 WHERE id = ?2 AND deleted_at IS NULL",
                params![stamp, id],
            )?;
            tx.commit()?;

            Ok(task)
        })?;

        tracing::debug!(task_id = id, "Task soft-deleted");
        Ok(task)
    }

    /// Number of rows including soft-deleted ones. Lets tests check that a
    /// delete kept its row; not part of the gateway operations.
    #[doc(hidden)]
    pub fn count_all_rows(&self) -> TaskResult<i64> {
        self.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?)
        })
    }
}
