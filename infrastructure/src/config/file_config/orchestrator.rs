//! Orchestrator configuration from TOML (`[orchestrator]` section)

use conclave_application::OrchestratorConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw orchestrator configuration from TOML
///
/// # Example
///
/// ```toml
/// [orchestrator]
/// task_poll_ms = 500
/// reviewer_count = 3
/// review_completed_tasks = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOrchestratorConfig {
    /// How long each loop iteration waits for a task
    pub task_poll_ms: u64,
    /// How long each loop iteration waits for a message
    pub message_poll_ms: u64,
    /// Approval weight a review needs
    pub review_required_approvals: usize,
    /// Reviewers chosen when none are named
    pub reviewer_count: usize,
    /// Conflict parties approve above this confidence
    pub conflict_approval_threshold: f64,
    /// Send successful task results through peer review
    pub review_completed_tasks: bool,
}

impl Default for FileOrchestratorConfig {
    fn default() -> Self {
        let defaults = OrchestratorConfig::default();
        Self {
            task_poll_ms: defaults.task_poll.as_millis() as u64,
            message_poll_ms: defaults.message_poll.as_millis() as u64,
            review_required_approvals: defaults.review_required_approvals,
            reviewer_count: defaults.reviewer_count,
            conflict_approval_threshold: defaults.conflict_approval_threshold,
            review_completed_tasks: defaults.review_completed_tasks,
        }
    }
}

impl FileOrchestratorConfig {
    /// Application config; the decomposition temperature comes from `[llm]`
    pub fn to_orchestrator_config(&self, decomposition_temperature: f64) -> OrchestratorConfig {
        OrchestratorConfig::default()
            .with_task_poll(Duration::from_millis(self.task_poll_ms))
            .with_message_poll(Duration::from_millis(self.message_poll_ms))
            .with_review_required_approvals(self.review_required_approvals)
            .with_reviewer_count(self.reviewer_count)
            .with_conflict_approval_threshold(self.conflict_approval_threshold)
            .with_decomposition_temperature(decomposition_temperature)
            .with_review_completed_tasks(self.review_completed_tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_application() {
        let config = FileOrchestratorConfig::default().to_orchestrator_config(0.3);
        assert_eq!(config, OrchestratorConfig::default());
    }

    #[test]
    fn test_partial_section() {
        let config: FileOrchestratorConfig = toml::from_str("task_poll_ms = 250").unwrap();
        assert_eq!(config.task_poll_ms, 250);
        assert_eq!(config.message_poll_ms, 100);
        assert_eq!(
            config.to_orchestrator_config(0.3).task_poll,
            Duration::from_millis(250)
        );
    }
}
