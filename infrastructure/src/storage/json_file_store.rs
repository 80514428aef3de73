//! One JSON file per project.
//!
//! Layout: `{dir}/{project_id}.json`, each holding the object produced by
//! [`ProjectState::to_record`]. Writes go to a temp file and are renamed
//! into place so a crash never leaves a half-written record.

use async_trait::async_trait;
use conclave_application::{ProjectStore, StoreError};
use conclave_domain::ProjectState;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

const EXTENSION: &str = "json";

/// [`ProjectStore`] backed by a directory of JSON files
pub struct JsonFileProjectStore {
    dir: PathBuf,
}

impl JsonFileProjectStore {
    /// The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Default location under the user's data directory
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("conclave").join("projects"))
    }

    fn path_for(&self, project_id: &str) -> Result<PathBuf, StoreError> {
        let valid = !project_id.is_empty()
            && project_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::Io(format!(
                "Project id {:?} cannot be used as a file name",
                project_id
            )));
        }
        Ok(self.dir.join(format!("{}.{}", project_id, EXTENSION)))
    }
}

fn io_error(path: &Path, e: std::io::Error) -> StoreError {
    StoreError::Io(format!("{}: {}", path.display(), e))
}

#[async_trait]
impl ProjectStore for JsonFileProjectStore {
    async fn save(&self, project: &ProjectState) -> Result<(), StoreError> {
        let path = self.path_for(&project.project_id)?;
        let record = project.to_record()?;
        let json = serde_json::to_string_pretty(&Value::Object(record))
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;

        let temp_path = path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, json)
            .await
            .map_err(|e| io_error(&temp_path, e))?;
        tokio::fs::rename(&temp_path, &path)
            .await
            .map_err(|e| io_error(&path, e))?;

        debug!(project = %project.project_id, path = %path.display(), "Project saved");
        Ok(())
    }

    async fn load(&self, project_id: &str) -> Result<ProjectState, StoreError> {
        let path = self.path_for(project_id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(project_id.to_string()));
            }
            Err(e) => return Err(io_error(&path, e)),
        };

        let record: Map<String, Value> = serde_json::from_str(&content)
            .map_err(|e| StoreError::Serialization(format!("{}: {}", path.display(), e)))?;
        Ok(ProjectState::from_record(record)?)
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&self.dir, e)),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error(&self.dir, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(EXTENSION)
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn delete(&self, project_id: &str) -> Result<bool, StoreError> {
        let path = self.path_for(project_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(&path, e)),
        }
    }
}
