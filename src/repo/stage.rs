use rusqlite::{Connection, OptionalExtension, Row};
use crate::models::Stage;
use anyhow::{Context, Result};

pub struct StageRepo;

fn stage_from_row(row: &Row<'_>) -> rusqlite::Result<Stage> {
    Ok(Stage {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        position: row.get(3)?,
    })
}

impl StageRepo {
    /// Append a stage after the project's last column
    pub fn create(conn: &Connection, project_id: i64, name: &str) -> Result<Stage> {
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("Stage name is required");
        }

        let max_position: i64 = conn.query_row(
            "SELECT COALESCE(MAX(position), -1) FROM project_stages WHERE project_id = ?1",
            [project_id],
            |row| row.get(0),
        )?;
        let position = max_position + 1;
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            "INSERT INTO project_stages (project_id, name, position, created_ts)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![project_id, name, position, now],
        )
        .with_context(|| format!("Failed to create stage '{}' in project {}", name, project_id))?;

        Ok(Stage {
            id: conn.last_insert_rowid(),
            project_id,
            name: name.to_string(),
            position,
        })
    }

    /// List a project's stages ordered by position
    pub fn list_for_project(conn: &Connection, project_id: i64) -> Result<Vec<Stage>> {
        let mut stmt = conn.prepare(
            "SELECT id, project_id, name, position FROM project_stages
             WHERE project_id = ?1 ORDER BY position ASC, id ASC"
        )?;
        let rows = stmt.query_map([project_id], stage_from_row)?;

        let mut stages = Vec::new();
        for row in rows {
            stages.push(row?);
        }
        Ok(stages)
    }

    /// Get stage by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Stage>> {
        let stage = conn.query_row(
            "SELECT id, project_id, name, position FROM project_stages WHERE id = ?1",
            [id],
            stage_from_row,
        ).optional()?;
        Ok(stage)
    }

    /// Find a stage of a project by name (case-insensitive)
    pub fn find_by_name(conn: &Connection, project_id: i64, name: &str) -> Result<Option<Stage>> {
        let stage = conn.query_row(
            "SELECT id, project_id, name, position FROM project_stages
             WHERE project_id = ?1 AND name = ?2 COLLATE NOCASE
             ORDER BY position ASC, id ASC LIMIT 1",
            rusqlite::params![project_id, name.trim()],
            stage_from_row,
        ).optional()?;
        Ok(stage)
    }

    /// Rename a stage
    pub fn rename(conn: &Connection, id: i64, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("Stage name is required");
        }
        let updated = conn.execute(
            "UPDATE project_stages SET name = ?1 WHERE id = ?2",
            rusqlite::params![name, id],
        )
        .with_context(|| format!("Failed to rename stage {}", id))?;
        if updated == 0 {
            anyhow::bail!("Stage {} not found", id);
        }
        Ok(())
    }

    /// Set a stage's column position. Other stages are not renumbered.
    pub fn set_position(conn: &Connection, id: i64, position: i64) -> Result<()> {
        let updated = conn.execute(
            "UPDATE project_stages SET position = ?1 WHERE id = ?2",
            rusqlite::params![position, id],
        )
        .with_context(|| format!("Failed to update stage {}", id))?;
        if updated == 0 {
            anyhow::bail!("Stage {} not found", id);
        }
        Ok(())
    }

    /// Delete a stage together with its tasks
    pub fn delete(conn: &Connection, id: i64) -> Result<()> {
        let deleted = conn.execute("DELETE FROM project_stages WHERE id = ?1", [id])
            .with_context(|| format!("Failed to delete stage {}", id))?;
        if deleted == 0 {
            anyhow::bail!("Stage {} not found", id);
        }
        Ok(())
    }
}
