use rusqlite::{Connection, OptionalExtension, Row};
use crate::models::{NewTask, Task, TaskUpdate};
use crate::repo::{AttachmentRepo, StageRepo};
use anyhow::{Context, Result};

/// Task repository for database operations
///
/// Positions are zero-based and dense within a stage. Create appends to the
/// end of the stage; delete and editor-driven stage changes close the gap they
/// leave behind. Board reorders write placements row by row through
/// [`TaskRepo::update_placement`].
pub struct TaskRepo;

const TASK_COLUMNS: &str =
    "id, uuid, project_id, stage_id, title, description, position, done, created_ts";

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        uuid: row.get(1)?,
        project_id: row.get(2)?,
        stage_id: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,
        position: row.get(6)?,
        done: row.get::<_, i64>(7)? != 0,
        created_ts: row.get(8)?,
    })
}

impl TaskRepo {
    /// Create a task at the end of its stage
    pub fn create(conn: &Connection, new_task: &NewTask) -> Result<Task> {
        let stage = StageRepo::get_by_id(conn, new_task.stage_id)?
            .filter(|s| s.project_id == new_task.project_id)
            .ok_or_else(|| anyhow::anyhow!(
                "Stage {} not found in project {}", new_task.stage_id, new_task.project_id
            ))?;

        let position = Self::next_position(conn, stage.id)?;
        let uuid = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            "INSERT INTO tasks (uuid, project_id, stage_id, title, description, position, done,
                                created_ts, modified_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                uuid,
                new_task.project_id,
                stage.id,
                new_task.title,
                new_task.description,
                position,
                new_task.done as i64,
                now,
                now
            ],
        )
        .with_context(|| format!("Failed to create task: {}", new_task.title))?;

        Ok(Task {
            id: conn.last_insert_rowid(),
            uuid,
            project_id: new_task.project_id,
            stage_id: stage.id,
            title: new_task.title.clone(),
            description: new_task.description.clone(),
            position,
            done: new_task.done,
            created_ts: now,
        })
    }

    /// Get task by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Task>> {
        let sql = format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS);
        let task = conn.query_row(&sql, [id], task_from_row).optional()?;
        Ok(task)
    }

    /// List a project's tasks ordered by position ascending
    pub fn list_for_project(conn: &Connection, project_id: i64) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE project_id = ?1 ORDER BY position ASC, id ASC",
            TASK_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([project_id], task_from_row)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    /// Number of tasks currently in a stage
    pub fn count_in_stage(conn: &Connection, stage_id: i64) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE stage_id = ?1",
            [stage_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Position after the last task of a stage. Gaps left by a partially saved
    /// reorder are kept, so the new task never shares a position.
    pub fn next_position(conn: &Connection, stage_id: i64) -> Result<i64> {
        let position = conn.query_row(
            "SELECT COALESCE(MAX(position), -1) + 1 FROM tasks WHERE stage_id = ?1",
            [stage_id],
            |row| row.get(0),
        )?;
        Ok(position)
    }

    /// Write a task's stage and position. The project id acts as a safety filter.
    /// Returns false when no task matched.
    pub fn update_placement(
        conn: &Connection,
        project_id: i64,
        task_id: i64,
        stage_id: i64,
        position: i64,
    ) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();
        let updated = conn.execute(
            "UPDATE tasks SET stage_id = ?1, position = ?2, modified_ts = ?3
             WHERE id = ?4 AND project_id = ?5",
            rusqlite::params![stage_id, position, now, task_id, project_id],
        )
        .with_context(|| format!("Failed to update placement of task {}", task_id))?;
        Ok(updated > 0)
    }

    /// Apply an editor update. Moving to another stage appends the task to the end
    /// of that stage and renumbers the stage it left.
    pub fn update(conn: &Connection, project_id: i64, task_id: i64, update: &TaskUpdate) -> Result<Task> {
        let tx = conn.unchecked_transaction()?;

        let task = Self::get_by_id(&tx, task_id)?
            .filter(|t| t.project_id == project_id)
            .ok_or_else(|| anyhow::anyhow!("Task {} not found", task_id))?;
        let now = chrono::Utc::now().timestamp();

        if let Some(title) = &update.title {
            tx.execute(
                "UPDATE tasks SET title = ?1, modified_ts = ?2 WHERE id = ?3",
                rusqlite::params![title, now, task_id],
            )?;
        }
        if let Some(description) = &update.description {
            tx.execute(
                "UPDATE tasks SET description = ?1, modified_ts = ?2 WHERE id = ?3",
                rusqlite::params![description, now, task_id],
            )?;
        }
        if let Some(done) = update.done {
            tx.execute(
                "UPDATE tasks SET done = ?1, modified_ts = ?2 WHERE id = ?3",
                rusqlite::params![done as i64, now, task_id],
            )?;
        }
        if let Some(stage_id) = update.stage_id.filter(|s| *s != task.stage_id) {
            StageRepo::get_by_id(&tx, stage_id)?
                .filter(|s| s.project_id == project_id)
                .ok_or_else(|| anyhow::anyhow!("Stage {} not found in project {}", stage_id, project_id))?;
            let position = Self::next_position(&tx, stage_id)?;
            Self::update_placement(&tx, project_id, task_id, stage_id, position)?;
            Self::renumber_stage(&tx, task.stage_id)?;
        }

        let updated = Self::get_by_id(&tx, task_id)?
            .ok_or_else(|| anyhow::anyhow!("Task {} not found", task_id))?;
        tx.commit()?;
        Ok(updated)
    }

    /// Delete a task and its attachments, closing the gap in its stage
    pub fn delete(conn: &Connection, project_id: i64, task_id: i64) -> Result<()> {
        let tx = conn.unchecked_transaction()?;

        let task = Self::get_by_id(&tx, task_id)?
            .filter(|t| t.project_id == project_id)
            .ok_or_else(|| anyhow::anyhow!("Task {} not found", task_id))?;

        AttachmentRepo::delete_for_task(&tx, task_id)?;
        tx.execute("DELETE FROM tasks WHERE id = ?1", [task_id])
            .with_context(|| format!("Failed to delete task {}", task_id))?;
        Self::renumber_stage(&tx, task.stage_id)?;

        tx.commit()?;
        Ok(())
    }

    /// Rewrite a stage's positions to 0..N-1, keeping the current order
    pub fn renumber_stage(conn: &Connection, stage_id: i64) -> Result<()> {
        let mut stmt = conn.prepare(
            "SELECT id, position FROM tasks WHERE stage_id = ?1 ORDER BY position ASC, id ASC"
        )?;
        let rows: Vec<(i64, i64)> = stmt
            .query_map([stage_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<_>>()?;

        for (index, (id, position)) in rows.into_iter().enumerate() {
            let index = index as i64;
            if position != index {
                conn.execute(
                    "UPDATE tasks SET position = ?1 WHERE id = ?2",
                    rusqlite::params![index, id],
                )?;
            }
        }
        Ok(())
    }
}
