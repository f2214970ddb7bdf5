use serde::{Deserialize, Serialize};

/// Stages every new project starts with, in column order
pub const DEFAULT_STAGES: [&str; 3] = ["Not Started", "In Progress", "Done"];

/// Project model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_ts: i64,
}

/// Longest project title accepted on create or edit, in characters
pub const MAX_PROJECT_TITLE_LEN: usize = 255;

/// Trim a project title and check it is present and within the length limit
pub fn normalize_project_title(title: &str) -> Result<String, String> {
    let title = title.trim();
    if title.is_empty() {
        return Err("Project title is required".to_string());
    }
    if title.chars().count() > MAX_PROJECT_TITLE_LEN {
        return Err(format!(
            "Project title must be {} characters or less",
            MAX_PROJECT_TITLE_LEN
        ));
    }
    Ok(title.to_string())
}

/// A project with the counts shown in the project list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    #[serde(flatten)]
    pub project: Project,
    pub stage_count: i64,
    pub open_tasks: i64,
    pub done_tasks: i64,
}

/// Totals across every project
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardStats {
    pub projects: i64,
    pub total_tasks: i64,
    pub pending_tasks: i64,
    pub done_tasks: i64,
}
