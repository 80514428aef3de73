//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid task transition for {task_id}: {from} -> {to}")]
    InvalidTaskTransition {
        task_id: String,
        from: String,
        to: String,
    },

    #[error("Invalid agent transition for {agent}: {from} -> {to}")]
    InvalidAgentTransition {
        agent: String,
        from: String,
        to: String,
    },

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Unknown agent kind: {0}")]
    UnknownAgentKind(String),
}

impl DomainError {
    /// Check if this error is a rejected state-machine transition
    pub fn is_invalid_transition(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidTaskTransition { .. } | DomainError::InvalidAgentTransition { .. }
        )
    }
}
