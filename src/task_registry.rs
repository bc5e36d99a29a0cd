// --------------------------------------------------
// Task registry: CRUD over the tasks table.
//
// Each mutation loads the full row, edits it in memory and writes the
// whole row back. target_accounts / done_accounts are JSON arrays.
// --------------------------------------------------

use chrono::DateTime;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::logic;
use crate::models::{Task, TaskView};
use crate::store::Store;

const TASK_COLUMNS: &str =
    "id, content, remark, target_accounts, done_accounts, stats_enabled, created_at";

impl Store {
    // Newest first, each with derived completion
    pub fn list_tasks(&self) -> AppResult<Vec<TaskView>> {
        self.read(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY id DESC"))?;
            let rows = stmt.query_map([], read_raw)?;

            let mut views = Vec::new();
            for raw in rows {
                views.push(view(raw?.into_task()?));
            }
            Ok(views)
        })
    }

    pub fn get_task(&self, id: i64) -> AppResult<TaskView> {
        let task = self.read(|conn| load_task(conn, id))?;
        Ok(view(task))
    }

    // Targets are a snapshot of the account template at creation time
    pub fn create_task(&self, content: &str, remark: &str) -> AppResult<i64> {
        logic::require_text("content", content)?;
        let targets = self.global_accounts()?;
        let now = chrono::Local::now().fixed_offset();

        let id = self.write(|tx| {
            tx.execute(
                r#"
                INSERT INTO tasks (content, remark, target_accounts, done_accounts, stats_enabled, created_at)
                VALUES (?1, ?2, ?3, '[]', 1, ?4)
                "#,
                params![
                    content,
                    remark,
                    serde_json::to_string(&targets)?,
                    now.to_rfc3339()
                ],
            )?;
            Ok(tx.last_insert_rowid())
        })?;

        info!(id, targets = targets.len(), "task created");
        Ok(id)
    }

    pub fn toggle_stats(&self, id: i64) -> AppResult<bool> {
        let task = self.update_task(id, |t| {
            t.stats_enabled = !t.stats_enabled;
            Ok(())
        })?;
        Ok(task.stats_enabled)
    }

    // Overwrites the checklist only; done_accounts is left as is
    pub fn replace_target_accounts(&self, id: i64, text: &str) -> AppResult<TaskView> {
        let accounts = logic::parse_account_list(text);
        let task = self.update_task(id, move |t| {
            t.target_accounts = accounts;
            Ok(())
        })?;
        Ok(view(task))
    }

    // Last submitted checklist wins; anything not submitted is unchecked
    pub fn replace_done_accounts(&self, id: i64, checked: Vec<String>) -> AppResult<TaskView> {
        let done = logic::dedup_keep_order(checked);
        let task = self.update_task(id, move |t| {
            t.done_accounts = done;
            Ok(())
        })?;
        Ok(view(task))
    }

    pub fn edit_task_info(&self, id: i64, content: &str, remark: &str) -> AppResult<TaskView> {
        logic::require_text("content", content)?;
        let task = self.update_task(id, |t| {
            t.content = content.to_string();
            t.remark = remark.to_string();
            Ok(())
        })?;
        Ok(view(task))
    }

    // Deleting a missing id is not an error; returns whether a row went away
    pub fn delete_task(&self, id: i64) -> AppResult<bool> {
        let removed = self.write(|tx| Ok(tx.execute("DELETE FROM tasks WHERE id = ?1", params![id])?))?;
        debug!(id, removed, "task delete");
        Ok(removed > 0)
    }

    // Load, edit, write back the whole row in one transaction
    fn update_task(&self, id: i64, edit: impl FnOnce(&mut Task) -> AppResult<()>) -> AppResult<Task> {
        self.write(|tx| {
            let mut task = load_task(tx, id)?;
            edit(&mut task)?;
            tx.execute(
                r#"
                UPDATE tasks
                SET content = ?1, remark = ?2, target_accounts = ?3,
                    done_accounts = ?4, stats_enabled = ?5
                WHERE id = ?6
                "#,
                params![
                    task.content,
                    task.remark,
                    serde_json::to_string(&task.target_accounts)?,
                    serde_json::to_string(&task.done_accounts)?,
                    task.stats_enabled,
                    task.id
                ],
            )?;
            Ok(task)
        })
    }
}

fn view(task: Task) -> TaskView {
    let completion = logic::completion(&task);
    TaskView { task, completion }
}

fn load_task(conn: &Connection, id: i64) -> AppResult<Task> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
        params![id],
        read_raw,
    )
    .optional()?
    .ok_or(AppError::NotFound)?
    .into_task()
}

// Row as stored, before the JSON columns are decoded
struct RawTask {
    id: i64,
    content: String,
    remark: String,
    target_accounts: String,
    done_accounts: String,
    stats_enabled: bool,
    created_at: String,
}

fn read_raw(row: &Row<'_>) -> rusqlite::Result<RawTask> {
    Ok(RawTask {
        id: row.get(0)?,
        content: row.get(1)?,
        remark: row.get(2)?,
        target_accounts: row.get(3)?,
        done_accounts: row.get(4)?,
        stats_enabled: row.get(5)?,
        created_at: row.get(6)?,
    })
}

impl RawTask {
    fn into_task(self) -> AppResult<Task> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| AppError::Corrupt(format!("task {} created_at: {e}", self.id)))?;
        Ok(Task {
            id: self.id,
            content: self.content,
            remark: self.remark,
            target_accounts: serde_json::from_str(&self.target_accounts)?,
            done_accounts: serde_json::from_str(&self.done_accounts)?,
            stats_enabled: self.stats_enabled,
            created_at,
        })
    }
}
