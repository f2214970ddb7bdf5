use serde::{Deserialize, Serialize};

const IMAGE_MIME_PREFIX: &str = "image/";

/// Attachment metadata. The file body lives in object storage under `storage_path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: i64,
    pub task_id: i64,
    pub file_name: String,
    pub mime_type: Option<String>,
    pub size_bytes: i64,
    pub storage_path: String,
    pub created_ts: i64,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.mime_type
            .as_deref()
            .map(|m| m.starts_with(IMAGE_MIME_PREFIX))
            .unwrap_or(false)
    }

    /// Object storage key: `<project_id>/<task_id>/<uuid>-<file_name>`
    pub fn storage_path_for(project_id: i64, task_id: i64, file_name: &str) -> String {
        let safe_name: String = file_name
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        format!("{}/{}/{}-{}", project_id, task_id, uuid::Uuid::new_v4(), safe_name)
    }
}
