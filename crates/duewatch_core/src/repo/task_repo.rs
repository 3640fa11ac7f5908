//! Task source contract and SQLite implementation.
//!
//! # Responsibility
//! - Expose the full, unfiltered task set to reminder pollers.
//! - Provide the small CRUD surface used by action routing and shells.
//! - Keep SQL details inside core persistence boundary.
//!
//! # Invariants
//! - Write paths must call `Task::validate()` before SQL mutations.
//! - `list_all_tasks` ignores every UI-level filter.
//! - Read paths must reject invalid persisted state instead of masking it.
//!   `scan_all_tasks` reports it per row so one bad row cannot hide the rest.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::task::{Task, TaskId};
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    due_date,
    completed
FROM tasks";

/// Read side of the external task store, as consumed by the engine.
pub trait TaskSource {
    /// Returns every task regardless of completion or any view filter.
    fn list_all_tasks(&self) -> RepoResult<Vec<Task>>;
    /// Like `list_all_tasks`, but a malformed row becomes an `Err` entry
    /// instead of failing the whole listing.
    fn scan_all_tasks(&self) -> RepoResult<Vec<RepoResult<Task>>> {
        Ok(self.list_all_tasks()?.into_iter().map(Ok).collect())
    }
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Marks a task completed. Completing twice is not an error.
    fn mark_completed(&self, id: TaskId) -> RepoResult<()>;
}

/// View-style listing options. Pollers never use this.
#[derive(Debug, Clone, Default)]
pub struct TaskListQuery {
    pub include_completed: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates a repository after checking the schema is fully migrated.
    ///
    /// # Errors
    /// - Returns `DbError::UnsupportedSchemaVersion` when the connection was
    ///   not opened through `open_db`/`open_db_in_memory`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        if version != latest_version() {
            return Err(DbError::UnsupportedSchemaVersion {
                db_version: version,
                latest_supported: latest_version(),
            }
            .into());
        }
        Ok(Self::new(conn))
    }

    pub fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        self.conn.execute(
            "INSERT INTO tasks (
                uuid,
                title,
                due_date,
                completed
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                task.id.to_string(),
                task.title.as_str(),
                task.due_date.as_deref(),
                bool_to_int(task.completed),
            ],
        )?;

        Ok(task.id)
    }

    /// Replaces title, due date and completion of an existing task.
    ///
    /// Reminder history is left untouched, including when the due date moves.
    pub fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                title = ?1,
                due_date = ?2,
                completed = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?4;",
            params![
                task.title.as_str(),
                task.due_date.as_deref(),
                bool_to_int(task.completed),
                task.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(task.id));
        }

        Ok(())
    }

    /// Hard-deletes a task. Its reminder history goes with it.
    pub fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    pub fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.include_completed {
            sql.push_str(" AND completed = 0");
        }

        sql.push_str(" ORDER BY created_at ASC, uuid ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }
}

impl TaskSource for SqliteTaskRepository<'_> {
    fn list_all_tasks(&self) -> RepoResult<Vec<Task>> {
        self.list_tasks(&TaskListQuery {
            include_completed: true,
            ..TaskListQuery::default()
        })
    }

    fn scan_all_tasks(&self) -> RepoResult<Vec<RepoResult<Task>>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} ORDER BY created_at ASC, uuid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut scanned = Vec::new();

        while let Some(row) = rows.next()? {
            scanned.push(parse_task_row(row));
        }

        Ok(scanned)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }

        Ok(None)
    }

    fn mark_completed(&self, id: TaskId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                completed = 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in tasks.uuid"))
    })?;

    let completed = match row.get::<_, i64>("completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid completed value `{other}` in tasks.completed"
            )));
        }
    };

    let task = Task {
        id,
        title: row.get("title")?,
        due_date: row.get("due_date")?,
        completed,
    };
    task.validate()?;
    Ok(task)
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
