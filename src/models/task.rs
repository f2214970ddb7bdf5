use serde::{Deserialize, Serialize};

/// Where a task sits on the board: its stage column and zero-based rank within it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub stage_id: i64,
    pub position: i64,
}

/// Task model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub uuid: String,
    pub project_id: i64,
    pub stage_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub position: i64,
    pub done: bool,
    pub created_ts: i64,
}

impl Task {
    pub fn placement(&self) -> Placement {
        Placement {
            stage_id: self.stage_id,
            position: self.position,
        }
    }
}

/// Fields for a task created from the editor. The position is assigned by the
/// store (end of the target stage).
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub project_id: i64,
    pub stage_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub done: bool,
}

impl NewTask {
    /// Build a new task, trimming the title and dropping a blank description.
    /// Returns an error message when the title is empty.
    pub fn new(
        project_id: i64,
        stage_id: i64,
        title: &str,
        description: Option<&str>,
        done: bool,
    ) -> Result<Self, String> {
        Ok(NewTask {
            project_id,
            stage_id,
            title: normalize_title(title)?,
            description: normalize_description(description),
            done,
        })
    }
}

/// Partial update from the editor flow. `None` leaves a field untouched;
/// `description: Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub stage_id: Option<i64>,
    pub done: Option<bool>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.stage_id.is_none()
            && self.done.is_none()
    }
}

/// Trim a task title, rejecting empty ones
pub fn normalize_title(title: &str) -> Result<String, String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        Err("Task title is required".to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

/// Trim a description; blank descriptions are stored as none
pub fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}
