use serde::{Deserialize, Serialize};

/// A named column that tasks are grouped into within a project.
/// Columns are displayed in ascending `position`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub position: i64,
}

/// Entry of a stage select list (id, display name)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageOption {
    pub id: i64,
    pub name: String,
}

impl From<&Stage> for StageOption {
    fn from(stage: &Stage) -> Self {
        StageOption {
            id: stage.id,
            name: stage.name.clone(),
        }
    }
}
