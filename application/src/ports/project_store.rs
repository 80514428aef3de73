//! Project persistence port

use async_trait::async_trait;
use conclave_domain::{DomainError, ProjectState};
use thiserror::Error;

/// Errors from project persistence
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Project not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Port for saving and loading project records.
///
/// Adapters persist [`ProjectState::to_record`] and rebuild with
/// [`ProjectState::from_record`].
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn save(&self, project: &ProjectState) -> Result<(), StoreError>;

    async fn load(&self, project_id: &str) -> Result<ProjectState, StoreError>;

    /// Ids of all stored projects, sorted
    async fn list(&self) -> Result<Vec<String>, StoreError>;

    /// Returns whether a record was removed
    async fn delete(&self, project_id: &str) -> Result<bool, StoreError>;
}
