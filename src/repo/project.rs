use rusqlite::{Connection, OptionalExtension};
use crate::models::{normalize_project_title, BoardStats, Project, ProjectSummary, DEFAULT_STAGES};
use crate::repo::StageRepo;
use anyhow::{Context, Result};

/// Project repository for database operations
///
/// Deleting a project removes its stages, tasks and attachments.
///
/// # Example
///
/// ```
/// use taskboard::db::DbConnection;
/// use taskboard::repo::ProjectRepo;
///
/// let conn = DbConnection::connect_in_memory().unwrap();
/// let project = ProjectRepo::create_with_default_stages(&conn, "Website Redesign", None).unwrap();
/// ```
pub struct ProjectRepo;

impl ProjectRepo {
    /// Create a new project with no stages
    pub fn create(conn: &Connection, title: &str, description: Option<&str>) -> Result<Project> {
        let title = normalize_project_title(title).map_err(|e| anyhow::anyhow!(e))?;
        let description = clean_description(description);
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            "INSERT INTO projects (title, description, created_ts) VALUES (?1, ?2, ?3)",
            rusqlite::params![title, description, now],
        )
        .with_context(|| format!("Failed to create project: {}", title))?;

        Ok(Project {
            id: conn.last_insert_rowid(),
            title,
            description,
            created_ts: now,
        })
    }

    /// Create a project together with the default "Not Started / In Progress / Done" stages
    pub fn create_with_default_stages(
        conn: &Connection,
        title: &str,
        description: Option<&str>,
    ) -> Result<Project> {
        let tx = conn.unchecked_transaction()?;
        let project = Self::create(&tx, title, description)?;
        for name in DEFAULT_STAGES {
            StageRepo::create(&tx, project.id, name)?;
        }
        tx.commit()?;
        Ok(project)
    }

    /// Get project by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Project>> {
        let mut stmt = conn.prepare(
            "SELECT id, title, description, created_ts FROM projects WHERE id = ?1"
        )?;

        let project = stmt.query_row([id], |row| {
            Ok(Project {
                id: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                created_ts: row.get(3)?,
            })
        }).optional()?;

        Ok(project)
    }

    /// Get project by title (case-insensitive, first match by id)
    pub fn get_by_title(conn: &Connection, title: &str) -> Result<Option<Project>> {
        let mut stmt = conn.prepare(
            "SELECT id, title, description, created_ts FROM projects
             WHERE title = ?1 COLLATE NOCASE ORDER BY id LIMIT 1"
        )?;

        let project = stmt.query_row([title.trim()], |row| {
            Ok(Project {
                id: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                created_ts: row.get(3)?,
            })
        }).optional()?;

        Ok(project)
    }

    /// List all projects, newest first
    pub fn list(conn: &Connection) -> Result<Vec<Project>> {
        let mut stmt = conn.prepare(
            "SELECT id, title, description, created_ts FROM projects
             ORDER BY created_ts DESC, id DESC"
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Project {
                id: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                created_ts: row.get(3)?,
            })
        })?;

        let mut projects = Vec::new();
        for row in rows {
            projects.push(row?);
        }
        Ok(projects)
    }

    /// Edit a project's title and description.
    /// `None` leaves a field as it is; a blank description clears it.
    pub fn update(
        conn: &Connection,
        id: i64,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<Project> {
        let mut project = Self::get_by_id(conn, id)?
            .ok_or_else(|| anyhow::anyhow!("Project {} not found", id))?;

        if let Some(title) = title {
            project.title = normalize_project_title(title).map_err(|e| anyhow::anyhow!(e))?;
        }
        if description.is_some() {
            project.description = clean_description(description);
        }

        conn.execute(
            "UPDATE projects SET title = ?1, description = ?2 WHERE id = ?3",
            rusqlite::params![project.title, project.description, id],
        )
        .with_context(|| format!("Failed to update project {}", id))?;

        Ok(project)
    }

    /// List all projects, newest first, with stage and task counts
    pub fn list_with_counts(conn: &Connection) -> Result<Vec<ProjectSummary>> {
        let mut stmt = conn.prepare(
            "SELECT p.id, p.title, p.description, p.created_ts,
                    (SELECT COUNT(*) FROM project_stages s WHERE s.project_id = p.id),
                    (SELECT COUNT(*) FROM tasks t WHERE t.project_id = p.id AND t.done = 0),
                    (SELECT COUNT(*) FROM tasks t WHERE t.project_id = p.id AND t.done = 1)
             FROM projects p
             ORDER BY p.created_ts DESC, p.id DESC"
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ProjectSummary {
                project: Project {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    description: row.get(2)?,
                    created_ts: row.get(3)?,
                },
                stage_count: row.get(4)?,
                open_tasks: row.get(5)?,
                done_tasks: row.get(6)?,
            })
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            summaries.push(row?);
        }
        Ok(summaries)
    }

    /// Project and task totals across the whole database
    pub fn stats(conn: &Connection) -> Result<BoardStats> {
        let stats = conn.query_row(
            "SELECT (SELECT COUNT(*) FROM projects),
                    (SELECT COUNT(*) FROM tasks),
                    (SELECT COUNT(*) FROM tasks WHERE done = 0),
                    (SELECT COUNT(*) FROM tasks WHERE done = 1)",
            [],
            |row| {
                Ok(BoardStats {
                    projects: row.get(0)?,
                    total_tasks: row.get(1)?,
                    pending_tasks: row.get(2)?,
                    done_tasks: row.get(3)?,
                })
            },
        )?;
        Ok(stats)
    }

    /// Delete a project and everything on its board
    pub fn delete(conn: &Connection, id: i64) -> Result<()> {
        let deleted = conn.execute("DELETE FROM projects WHERE id = ?1", [id])
            .with_context(|| format!("Failed to delete project {}", id))?;
        if deleted == 0 {
            anyhow::bail!("Project {} not found", id);
        }
        Ok(())
    }
}

fn clean_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;
    use crate::models::NewTask;
    use crate::repo::TaskRepo;

    #[test]
    fn test_create_and_get() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let project = ProjectRepo::create(&conn, " Office ", Some("  ")).unwrap();
        assert_eq!(project.title, "Office");
        assert_eq!(project.description, None);

        let loaded = ProjectRepo::get_by_id(&conn, project.id).unwrap().unwrap();
        assert_eq!(loaded, project);
        assert_eq!(ProjectRepo::get_by_title(&conn, "office").unwrap().unwrap().id, project.id);
    }

    #[test]
    fn test_create_rejects_blank_title() {
        let conn = DbConnection::connect_in_memory().unwrap();
        assert!(ProjectRepo::create(&conn, "  ", None).is_err());
    }

    #[test]
    fn test_default_stages() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let project = ProjectRepo::create_with_default_stages(&conn, "P", None).unwrap();
        let stages = StageRepo::list_for_project(&conn, project.id).unwrap();
        let names: Vec<&str> = stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Not Started", "In Progress", "Done"]);
        let positions: Vec<i64> = stages.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_update_title_and_description() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let project = ProjectRepo::create(&conn, "Office", Some("First floor")).unwrap();

        let updated = ProjectRepo::update(&conn, project.id, Some(" Office Move "), None).unwrap();
        assert_eq!(updated.title, "Office Move");
        assert_eq!(updated.description.as_deref(), Some("First floor"));

        let cleared = ProjectRepo::update(&conn, project.id, None, Some("  ")).unwrap();
        assert_eq!(cleared.description, None);
        let loaded = ProjectRepo::get_by_id(&conn, project.id).unwrap().unwrap();
        assert_eq!(loaded, cleared);
    }

    #[test]
    fn test_update_rejects_bad_titles() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let project = ProjectRepo::create(&conn, "Office", None).unwrap();

        let err = ProjectRepo::update(&conn, project.id, Some(&"x".repeat(256)), None).unwrap_err();
        assert_eq!(err.to_string(), "Project title must be 255 characters or less");
        assert!(ProjectRepo::update(&conn, project.id, Some(" "), None).is_err());
        assert!(ProjectRepo::create(&conn, &"x".repeat(256), None).is_err());
        assert!(ProjectRepo::update(&conn, 999, Some("Other"), None).is_err());

        let loaded = ProjectRepo::get_by_id(&conn, project.id).unwrap().unwrap();
        assert_eq!(loaded.title, "Office");
    }

    #[test]
    fn test_counts_and_stats() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let empty = ProjectRepo::create(&conn, "Empty", None).unwrap();
        let busy = ProjectRepo::create_with_default_stages(&conn, "Busy", None).unwrap();
        let stages = StageRepo::list_for_project(&conn, busy.id).unwrap();
        for (title, done) in [("A", false), ("B", false), ("C", true)] {
            let task = NewTask::new(busy.id, stages[0].id, title, None, done).unwrap();
            TaskRepo::create(&conn, &task).unwrap();
        }

        let summaries = ProjectRepo::list_with_counts(&conn).unwrap();
        let busy_row = summaries.iter().find(|s| s.project.id == busy.id).unwrap();
        assert_eq!((busy_row.stage_count, busy_row.open_tasks, busy_row.done_tasks), (3, 2, 1));
        let empty_row = summaries.iter().find(|s| s.project.id == empty.id).unwrap();
        assert_eq!((empty_row.stage_count, empty_row.open_tasks, empty_row.done_tasks), (0, 0, 0));

        let stats = ProjectRepo::stats(&conn).unwrap();
        assert_eq!(stats, BoardStats { projects: 2, total_tasks: 3, pending_tasks: 2, done_tasks: 1 });
    }

    #[test]
    fn test_delete_cascades() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let project = ProjectRepo::create_with_default_stages(&conn, "P", None).unwrap();
        ProjectRepo::delete(&conn, project.id).unwrap();
        assert!(StageRepo::list_for_project(&conn, project.id).unwrap().is_empty());
        assert!(ProjectRepo::delete(&conn, project.id).is_err());
    }
}
