use async_trait::async_trait;
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};
use crate::models::{NewTask, Placement, Stage, Task, TaskUpdate};
use crate::repo::{StageRepo, TaskRepo};
use crate::store::{BoardStore, StoreError};

/// [`BoardStore`] backed by the local SQLite ledger.
///
/// Every call takes the connection lock for the duration of one repository
/// call; no lock is held across an await point.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        SqliteStore {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Borrow the underlying connection for direct repository access
    pub fn connection(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))
    }

    fn require_task(conn: &Connection, project_id: i64, task_id: i64) -> Result<Task, StoreError> {
        TaskRepo::get_by_id(conn, task_id)?
            .filter(|t| t.project_id == project_id)
            .ok_or(StoreError::NotFound { entity: "Task", id: task_id })
    }
}

#[async_trait]
impl BoardStore for SqliteStore {
    async fn fetch_stages(&self, project_id: i64) -> Result<Vec<Stage>, StoreError> {
        let conn = self.connection()?;
        Ok(StageRepo::list_for_project(&conn, project_id)?)
    }

    async fn fetch_tasks(&self, project_id: i64) -> Result<Vec<Task>, StoreError> {
        let conn = self.connection()?;
        Ok(TaskRepo::list_for_project(&conn, project_id)?)
    }

    async fn update_task_placement(
        &self,
        project_id: i64,
        task_id: i64,
        placement: Placement,
    ) -> Result<(), StoreError> {
        let conn = self.connection()?;
        let updated = TaskRepo::update_placement(
            &conn,
            project_id,
            task_id,
            placement.stage_id,
            placement.position,
        )?;
        if !updated {
            return Err(StoreError::NotFound { entity: "Task", id: task_id });
        }
        log::debug!(
            "task {} placed at stage {} position {}",
            task_id, placement.stage_id, placement.position
        );
        Ok(())
    }

    async fn create_task(&self, new_task: NewTask) -> Result<Task, StoreError> {
        let conn = self.connection()?;
        if StageRepo::get_by_id(&conn, new_task.stage_id)?
            .filter(|s| s.project_id == new_task.project_id)
            .is_none()
        {
            return Err(StoreError::NotFound { entity: "Stage", id: new_task.stage_id });
        }
        Ok(TaskRepo::create(&conn, &new_task)?)
    }

    async fn update_task(
        &self,
        project_id: i64,
        task_id: i64,
        update: TaskUpdate,
    ) -> Result<Task, StoreError> {
        let conn = self.connection()?;
        Self::require_task(&conn, project_id, task_id)?;
        Ok(TaskRepo::update(&conn, project_id, task_id, &update)?)
    }

    async fn delete_task(&self, project_id: i64, task_id: i64) -> Result<(), StoreError> {
        let conn = self.connection()?;
        Self::require_task(&conn, project_id, task_id)?;
        TaskRepo::delete(&conn, project_id, task_id)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;
    use crate::repo::ProjectRepo;

    fn store_with_project() -> (SqliteStore, i64, Vec<Stage>) {
        let conn = DbConnection::connect_in_memory().unwrap();
        let project = ProjectRepo::create_with_default_stages(&conn, "P", None).unwrap();
        let stages = StageRepo::list_for_project(&conn, project.id).unwrap();
        (SqliteStore::new(conn), project.id, stages)
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let (store, project_id, stages) = store_with_project();
        let task = store
            .create_task(NewTask::new(project_id, stages[0].id, "A", None, false).unwrap())
            .await
            .unwrap();

        let tasks = store.fetch_tasks(project_id).await.unwrap();
        assert_eq!(tasks, vec![task]);
        assert_eq!(store.fetch_stages(project_id).await.unwrap(), stages);
    }

    #[tokio::test]
    async fn test_update_placement_unknown_task() {
        let (store, project_id, stages) = store_with_project();
        let err = store
            .update_task_placement(project_id, 99, Placement { stage_id: stages[0].id, position: 0 })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "Task", id: 99 }));
    }

    #[tokio::test]
    async fn test_create_in_foreign_stage() {
        let (store, project_id, _) = store_with_project();
        let err = store
            .create_task(NewTask::new(project_id, 999, "A", None, false).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "Stage", .. }));
    }

    #[tokio::test]
    async fn test_delete_wrong_project() {
        let (store, project_id, stages) = store_with_project();
        let task = store
            .create_task(NewTask::new(project_id, stages[0].id, "A", None, false).unwrap())
            .await
            .unwrap();
        assert!(store.delete_task(project_id + 1, task.id).await.is_err());
        store.delete_task(project_id, task.id).await.unwrap();
        assert!(store.fetch_tasks(project_id).await.unwrap().is_empty());
    }
}
