//! Store contract consumed by the board.
//!
//! The board never talks to the database directly; everything it reads or
//! writes goes through [`BoardStore`], so a remote backend can stand in for the
//! local SQLite ledger.

pub mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;
use std::sync::Arc;
use crate::models::{NewTask, Placement, Stage, Task, TaskUpdate};

/// Errors surfaced by a store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Project-scoped access to stages and tasks
#[async_trait]
pub trait BoardStore: Send + Sync {
    /// Stages of a project, ordered by position ascending
    async fn fetch_stages(&self, project_id: i64) -> Result<Vec<Stage>, StoreError>;

    /// Tasks of a project, ordered by position ascending
    async fn fetch_tasks(&self, project_id: i64) -> Result<Vec<Task>, StoreError>;

    /// Write one task's stage and position, filtered by project
    async fn update_task_placement(
        &self,
        project_id: i64,
        task_id: i64,
        placement: Placement,
    ) -> Result<(), StoreError>;

    async fn create_task(&self, new_task: NewTask) -> Result<Task, StoreError>;

    async fn update_task(
        &self,
        project_id: i64,
        task_id: i64,
        update: TaskUpdate,
    ) -> Result<Task, StoreError>;

    /// Delete a task together with its attachments
    async fn delete_task(&self, project_id: i64, task_id: i64) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: BoardStore + ?Sized> BoardStore for Arc<S> {
    async fn fetch_stages(&self, project_id: i64) -> Result<Vec<Stage>, StoreError> {
        (**self).fetch_stages(project_id).await
    }

    async fn fetch_tasks(&self, project_id: i64) -> Result<Vec<Task>, StoreError> {
        (**self).fetch_tasks(project_id).await
    }

    async fn update_task_placement(
        &self,
        project_id: i64,
        task_id: i64,
        placement: Placement,
    ) -> Result<(), StoreError> {
        (**self).update_task_placement(project_id, task_id, placement).await
    }

    async fn create_task(&self, new_task: NewTask) -> Result<Task, StoreError> {
        (**self).create_task(new_task).await
    }

    async fn update_task(
        &self,
        project_id: i64,
        task_id: i64,
        update: TaskUpdate,
    ) -> Result<Task, StoreError> {
        (**self).update_task(project_id, task_id, update).await
    }

    async fn delete_task(&self, project_id: i64, task_id: i64) -> Result<(), StoreError> {
        (**self).delete_task(project_id, task_id).await
    }
}
