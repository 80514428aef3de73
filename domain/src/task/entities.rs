//! Task domain entities

use crate::core::error::DomainError;
use crate::core::id::generate_short_id;
use crate::protocol::TaskResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a subtask
///
/// ```text
/// Pending ─▶ Assigned ─▶ InProgress ─▶ Review ─▶ Completed | Failed
///    │                       └──────────────────▶ Completed | Failed
///    └──▶ Blocked ─▶ Assigned (once dependencies complete)
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting to be scheduled
    #[default]
    Pending,
    /// Handed to an agent
    Assigned,
    /// The agent is executing it
    InProgress,
    /// Result is under peer review
    Review,
    Completed,
    Failed,
    /// Dependencies are not all completed
    Blocked,
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Assigned => "assigned",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Review => "review",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Blocked => "blocked",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Whether the lifecycle allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        if *self == next {
            return true;
        }
        match self {
            Pending => matches!(next, Assigned | Blocked | Failed),
            Blocked => matches!(next, Assigned | Pending | Failed),
            Assigned => matches!(next, InProgress | Blocked | Completed | Failed),
            InProgress => matches!(next, Review | Completed | Failed),
            Review => matches!(next, Completed | Failed),
            Completed | Failed => false,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reference to a subtask from outside its project
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskRef {
    pub project_id: String,
    pub task_id: String,
}

impl TaskRef {
    pub fn new(project_id: impl Into<String>, task_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            task_id: task_id.into(),
        }
    }
}

impl std::fmt::Display for TaskRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.project_id, self.task_id)
    }
}

/// A unit of work inside a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTask {
    pub task_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub description: String,
    /// Agent name; a weak reference into the registry
    #[serde(default)]
    pub assigned_agent: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    /// Task ids that must be Completed first
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub result: Option<TaskResult>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl SubTask {
    pub fn new(task_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            parent_id: None,
            description: description.into(),
            assigned_agent: None,
            status: TaskStatus::Pending,
            dependencies: Vec::new(),
            result: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Subtask with a fresh short id
    pub fn generated(description: impl Into<String>) -> Self {
        Self::new(generate_short_id(), description)
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.assigned_agent = Some(agent.into());
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Move to `next`, rejecting edges the lifecycle does not allow
    pub fn transition_to(&mut self, next: TaskStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTaskTransition {
                task_id: self.task_id.clone(),
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        if next.is_terminal() && self.completed_at.is_none() {
            self.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Record the result and move to Completed or Failed
    pub fn finish(&mut self, result: TaskResult) -> Result<(), DomainError> {
        let next = if result.success {
            TaskStatus::Completed
        } else {
            TaskStatus::Failed
        };
        self.transition_to(next)?;
        self.result = Some(result);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_terminal_states() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(!TaskStatus::Review.is_terminal());
        assert!(!TaskStatus::Blocked.is_terminal());
    }

    #[test]
    fn test_transitions() {
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Assigned));
        assert!(TaskStatus::Blocked.can_transition_to(TaskStatus::Assigned));
        assert!(TaskStatus::InProgress.can_transition_to(TaskStatus::Review));
        assert!(TaskStatus::Review.can_transition_to(TaskStatus::Failed));
        assert!(!TaskStatus::Pending.can_transition_to(TaskStatus::InProgress));
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Pending));
        assert!(!TaskStatus::Review.can_transition_to(TaskStatus::Assigned));
    }

    #[test]
    fn test_transition_rejects_illegal_edge() {
        let mut task = SubTask::new("t1", "x");
        let err = task.transition_to(TaskStatus::Review).unwrap_err();
        assert!(err.is_invalid_transition());
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn test_finish_sets_completion() {
        let mut task = SubTask::new("t1", "x");
        task.transition_to(TaskStatus::Assigned).unwrap();
        task.transition_to(TaskStatus::InProgress).unwrap();
        task.finish(TaskResult::success("t1", json!("ok"))).unwrap();

        assert_eq!(task.status, TaskStatus::Completed);
        assert!(task.completed_at.is_some());
        assert!(task.result.is_some());
    }

    #[test]
    fn test_generated_ids_are_short() {
        let task = SubTask::generated("x").with_parent("root");
        assert_eq!(task.task_id.len(), 8);
        assert_eq!(task.parent_id.as_deref(), Some("root"));
    }
}
