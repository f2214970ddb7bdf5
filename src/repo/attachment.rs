use rusqlite::{Connection, OptionalExtension, Row};
use crate::models::Attachment;
use crate::repo::TaskRepo;
use anyhow::{Context, Result};

/// Attachment metadata repository.
///
/// Only metadata rows live here; uploading and removing the stored objects is
/// the job of whatever object store the caller uses.
pub struct AttachmentRepo;

fn attachment_from_row(row: &Row<'_>) -> rusqlite::Result<Attachment> {
    Ok(Attachment {
        id: row.get(0)?,
        task_id: row.get(1)?,
        file_name: row.get(2)?,
        mime_type: row.get(3)?,
        size_bytes: row.get(4)?,
        storage_path: row.get(5)?,
        created_ts: row.get(6)?,
    })
}

impl AttachmentRepo {
    /// Record an attachment for a task
    pub fn add(
        conn: &Connection,
        task_id: i64,
        file_name: &str,
        mime_type: Option<&str>,
        size_bytes: i64,
    ) -> Result<Attachment> {
        let file_name = file_name.trim();
        if file_name.is_empty() {
            anyhow::bail!("Attachment file name is required");
        }
        if size_bytes < 0 {
            anyhow::bail!("Attachment size cannot be negative");
        }
        let task = TaskRepo::get_by_id(conn, task_id)?
            .ok_or_else(|| anyhow::anyhow!("Task {} not found", task_id))?;

        let storage_path = Attachment::storage_path_for(task.project_id, task.id, file_name);
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            "INSERT INTO task_attachments (task_id, file_name, mime_type, size_bytes, storage_path, created_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![task_id, file_name, mime_type, size_bytes, storage_path, now],
        )
        .with_context(|| format!("Failed to add attachment '{}' to task {}", file_name, task_id))?;

        Ok(Attachment {
            id: conn.last_insert_rowid(),
            task_id,
            file_name: file_name.to_string(),
            mime_type: mime_type.map(str::to_string),
            size_bytes,
            storage_path,
            created_ts: now,
        })
    }

    /// List a task's attachments, oldest first
    pub fn list_for_task(conn: &Connection, task_id: i64) -> Result<Vec<Attachment>> {
        let mut stmt = conn.prepare(
            "SELECT id, task_id, file_name, mime_type, size_bytes, storage_path, created_ts
             FROM task_attachments WHERE task_id = ?1 ORDER BY created_ts ASC, id ASC"
        )?;
        let rows = stmt.query_map([task_id], attachment_from_row)?;

        let mut attachments = Vec::new();
        for row in rows {
            attachments.push(row?);
        }
        Ok(attachments)
    }

    /// Get attachment by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Attachment>> {
        let attachment = conn.query_row(
            "SELECT id, task_id, file_name, mime_type, size_bytes, storage_path, created_ts
             FROM task_attachments WHERE id = ?1",
            [id],
            attachment_from_row,
        ).optional()?;
        Ok(attachment)
    }

    /// Delete a single attachment
    pub fn delete(conn: &Connection, id: i64) -> Result<()> {
        let deleted = conn.execute("DELETE FROM task_attachments WHERE id = ?1", [id])
            .with_context(|| format!("Failed to delete attachment {}", id))?;
        if deleted == 0 {
            anyhow::bail!("Attachment {} not found", id);
        }
        Ok(())
    }

    /// Delete all attachments of a task
    pub fn delete_for_task(conn: &Connection, task_id: i64) -> Result<()> {
        let removed = conn.execute("DELETE FROM task_attachments WHERE task_id = ?1", [task_id])
            .with_context(|| format!("Failed to delete attachments of task {}", task_id))?;
        if removed > 0 {
            log::debug!("removed {} attachment(s) of task {}", removed, task_id);
        }
        Ok(())
    }
}
