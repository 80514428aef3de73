//! Agent domain value objects - the data of one think/act/reflect iteration.
//!
//! # Reasoning
//! - [`Thought`] - Analysis of a prompt with a confidence estimate
//! - [`Insight`] - Lesson drawn from an [`ActionResult`]
//!
//! # Execution
//! - [`Action`] - What a specialist should do, with a [`RiskLevel`]
//! - [`ActionResult`] - Outcome of an action (success/failure, opaque output)

use crate::protocol::TaskResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An agent's analysis of a prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thought {
    /// Full generated text
    pub content: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Numbered or bulleted lines of the text, at most 10
    #[serde(default)]
    pub reasoning_steps: Vec<String>,
    #[serde(default)]
    pub requires_research: bool,
    #[serde(default)]
    pub requires_escalation: bool,
}

impl Thought {
    /// Neutral thought used when no text could be generated
    pub fn fallback(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            confidence: 0.5,
            reasoning_steps: Vec::new(),
            requires_research: false,
            requires_escalation: false,
        }
    }

    /// Escalation was requested, or confidence is below `threshold`
    pub fn should_escalate(&self, threshold: f64) -> bool {
        self.requires_escalation || self.confidence < threshold
    }
}

/// Risk classification of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    /// High and Critical actions warrant a security look
    pub fn requires_review(&self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Critical)
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An action for a specialist to execute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Dispatch key, e.g. "execute_task", "scan_code"
    pub action_type: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    pub description: String,
    #[serde(default)]
    pub risk_level: RiskLevel,
}

impl Action {
    pub fn new(action_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            parameters: Map::new(),
            description: description.into(),
            risk_level: RiskLevel::Low,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_risk_level(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = risk_level;
        self
    }

    /// String parameter, or `default` when absent or not a string
    pub fn str_param<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.parameters
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
    }
}

/// Outcome of an action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    /// Opaque payload produced by the specialist
    #[serde(default)]
    pub output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock duration in milliseconds
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub artifacts: Vec<String>,
}

impl ActionResult {
    pub fn success(output: Value) -> Self {
        Self {
            success: true,
            output,
            error: None,
            duration_ms: 0,
            artifacts: Vec::new(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: Value::Null,
            error: Some(error.into()),
            duration_ms: 0,
            artifacts: Vec::new(),
        }
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_artifacts(mut self, artifacts: Vec<String>) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// Convert into the task-level result reported to the orchestrator
    pub fn into_task_result(self, task_id: impl Into<String>) -> TaskResult {
        TaskResult {
            task_id: task_id.into(),
            success: self.success,
            output: self.output,
            artifacts: self.artifacts,
            error: self.error,
            duration_ms: self.duration_ms,
        }
    }
}

/// Lesson drawn from reflecting on a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub lesson: String,
    pub should_update_knowledge: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_identified: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub improvement_suggestion: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_should_escalate() {
        let mut thought = Thought::fallback("x");
        assert!(thought.should_escalate(0.7));
        assert!(!thought.should_escalate(0.5));

        thought.requires_escalation = true;
        assert!(thought.should_escalate(0.0));
    }

    #[test]
    fn test_action_params() {
        let action = Action::new("scan_code", "scan")
            .with_param("filename", "app.py")
            .with_param("lines", 3)
            .with_risk_level(RiskLevel::High);

        assert_eq!(action.str_param("filename", "unknown"), "app.py");
        assert_eq!(action.str_param("lines", "n/a"), "n/a");
        assert_eq!(action.str_param("missing", "unknown"), "unknown");
        assert!(action.risk_level.requires_review());
    }

    #[test]
    fn test_into_task_result() {
        let result = ActionResult::success(json!({"files": 2}))
            .with_duration_ms(12)
            .into_task_result("t1");
        assert_eq!(result.task_id, "t1");
        assert!(result.success);
        assert_eq!(result.duration_ms, 12);

        let failed = ActionResult::failure("boom").into_task_result("t2");
        assert_eq!(failed.error.as_deref(), Some("boom"));
    }
}
