//! Orchestrator parameters.
//!
//! [`OrchestratorConfig`] groups the static parameters of the scheduling loop,
//! peer review and conflict resolution. They are set when the orchestrator
//! is built and never change while it runs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Scheduling, review and conflict parameters.
///
/// | Field | Default |
/// |-------|---------|
/// | `task_poll` | 1 s |
/// | `message_poll` | 100 ms |
/// | `review_required_approvals` | 2 |
/// | `reviewer_count` | 2 |
/// | `conflict_approval_threshold` | 0.6 |
/// | `decomposition_temperature` | 0.3 |
/// | `review_completed_tasks` | false |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// How long one loop iteration waits for a queued task.
    pub task_poll: Duration,
    /// How long one loop iteration waits for a queued message.
    pub message_poll: Duration,
    /// Approval weight a review needs.
    pub review_required_approvals: usize,
    /// Reviewers chosen when none are named.
    pub reviewer_count: usize,
    /// A conflict party votes Approve above this confidence.
    pub conflict_approval_threshold: f64,
    /// Temperature for decomposition calls.
    pub decomposition_temperature: f64,
    /// Route successful task results through peer review before completion.
    pub review_completed_tasks: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            task_poll: Duration::from_secs(1),
            message_poll: Duration::from_millis(100),
            review_required_approvals: 2,
            reviewer_count: 2,
            conflict_approval_threshold: 0.6,
            decomposition_temperature: 0.3,
            review_completed_tasks: false,
        }
    }
}

impl OrchestratorConfig {
    // ==================== Builder Methods ====================

    pub fn with_task_poll(mut self, poll: Duration) -> Self {
        self.task_poll = poll;
        self
    }

    pub fn with_message_poll(mut self, poll: Duration) -> Self {
        self.message_poll = poll;
        self
    }

    pub fn with_review_required_approvals(mut self, approvals: usize) -> Self {
        self.review_required_approvals = approvals;
        self
    }

    pub fn with_reviewer_count(mut self, count: usize) -> Self {
        self.reviewer_count = count;
        self
    }

    pub fn with_conflict_approval_threshold(mut self, threshold: f64) -> Self {
        self.conflict_approval_threshold = threshold;
        self
    }

    pub fn with_decomposition_temperature(mut self, temperature: f64) -> Self {
        self.decomposition_temperature = temperature;
        self
    }

    pub fn with_review_completed_tasks(mut self, enabled: bool) -> Self {
        self.review_completed_tasks = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.task_poll, Duration::from_secs(1));
        assert_eq!(config.message_poll, Duration::from_millis(100));
        assert_eq!(config.review_required_approvals, 2);
        assert_eq!(config.conflict_approval_threshold, 0.6);
        assert!(!config.review_completed_tasks);
    }

    #[test]
    fn test_builder() {
        let config = OrchestratorConfig::default()
            .with_task_poll(Duration::from_millis(20))
            .with_reviewer_count(3)
            .with_review_completed_tasks(true);

        assert_eq!(config.task_poll, Duration::from_millis(20));
        assert_eq!(config.reviewer_count, 3);
        assert!(config.review_completed_tasks);
    }
}
