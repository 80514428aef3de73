//! Message payloads
//!
//! Every [`AgentMessage`](super::AgentMessage) carries one [`MessageContent`].
//! The structured variants are what the orchestrator routes on; `Text` and
//! `Json` are for free-form traffic between agents.

use crate::consensus::Vote;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request for an agent to perform a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    pub task_id: String,
    pub project_id: String,
    /// Action type the agent should run, e.g. "execute_task"
    pub task_type: String,
    pub description: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl TaskRequest {
    pub fn new(
        project_id: impl Into<String>,
        task_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            project_id: project_id.into(),
            task_type: "execute_task".to_string(),
            description: description.into(),
            parameters: Map::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }
}

/// Outcome of an executed task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: String,
    pub success: bool,
    /// Opaque payload produced by the agent
    #[serde(default)]
    pub output: Value,
    #[serde(default)]
    pub artifacts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Execution time in milliseconds
    #[serde(default)]
    pub duration_ms: u64,
}

impl TaskResult {
    pub fn success(task_id: impl Into<String>, output: Value) -> Self {
        Self {
            task_id: task_id.into(),
            success: true,
            output,
            artifacts: Vec::new(),
            error: None,
            duration_ms: 0,
        }
    }

    pub fn failure(task_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            success: false,
            output: Value::Null,
            artifacts: Vec::new(),
            error: Some(error.into()),
            duration_ms: 0,
        }
    }

    /// One-line rendering used in review prompts and logs
    pub fn summary(&self) -> String {
        match (&self.error, &self.output) {
            (Some(err), _) => format!("failed: {}", err),
            (None, Value::String(s)) => s.clone(),
            (None, Value::Null) => "(no output)".to_string(),
            (None, other) => other.to_string(),
        }
    }
}

/// Request for peer review of a change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub change_id: String,
    /// code, config, schema, task_result, ...
    pub change_type: String,
    pub description: String,
    #[serde(default)]
    pub diff: String,
    #[serde(default)]
    pub files_changed: Vec<String>,
    pub author: String,
    pub reviewers_needed: usize,
}

impl ReviewRequest {
    pub fn new(
        change_id: impl Into<String>,
        description: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            change_id: change_id.into(),
            change_type: "code".to_string(),
            description: description.into(),
            diff: String::new(),
            files_changed: Vec::new(),
            author: author.into(),
            reviewers_needed: 2,
        }
    }

    pub fn with_change_type(mut self, change_type: impl Into<String>) -> Self {
        self.change_type = change_type.into();
        self
    }

    pub fn with_diff(mut self, diff: impl Into<String>) -> Self {
        self.diff = diff.into();
        self
    }

    pub fn with_reviewers_needed(mut self, n: usize) -> Self {
        self.reviewers_needed = n;
        self
    }
}

/// A reviewer's structured verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewResult {
    pub change_id: String,
    pub reviewer: String,
    pub approved: bool,
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub required_changes: Vec<String>,
    #[serde(default)]
    pub security_concerns: Vec<String>,
}

/// Payload of an [`AgentMessage`](super::AgentMessage)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum MessageContent {
    TaskRequest(TaskRequest),
    TaskResult(TaskResult),
    ReviewRequest(ReviewRequest),
    ReviewResult(ReviewResult),
    /// A vote on `change_id`
    Vote { change_id: String, vote: Vote },
    Escalation { reason: String, context: String },
    Text(String),
    Json(Value),
}

impl MessageContent {
    pub fn text(s: impl Into<String>) -> Self {
        MessageContent::Text(s.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MessageContent::TaskRequest(_) => "task_request",
            MessageContent::TaskResult(_) => "task_result",
            MessageContent::ReviewRequest(_) => "review_request",
            MessageContent::ReviewResult(_) => "review_result",
            MessageContent::Vote { .. } => "vote",
            MessageContent::Escalation { .. } => "escalation",
            MessageContent::Text(_) => "text",
            MessageContent::Json(_) => "json",
        }
    }
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        MessageContent::Text(s)
    }
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        MessageContent::Text(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_result_summary() {
        assert_eq!(TaskResult::success("t", json!("done")).summary(), "done");
        assert_eq!(TaskResult::failure("t", "boom").summary(), "failed: boom");
        assert_eq!(
            TaskResult::success("t", json!({"k": 1})).summary(),
            r#"{"k":1}"#
        );
    }

    #[test]
    fn test_content_serialization_is_tagged() {
        let value = serde_json::to_value(MessageContent::text("hi")).unwrap();
        assert_eq!(value, json!({"type": "text", "data": "hi"}));

        let vote = MessageContent::Vote {
            change_id: "c1".to_string(),
            vote: Vote::approve("a", "ok"),
        };
        let back: MessageContent =
            serde_json::from_value(serde_json::to_value(&vote).unwrap()).unwrap();
        assert_eq!(back, vote);
    }
}
