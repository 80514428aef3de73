//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application config
//! types at the edge.

mod agents;
mod llm;
mod logging;
mod orchestrator;

pub use agents::{FileAgentsConfig, FileCustomAgent, FileMemoryConfig};
pub use llm::FileLlmConfig;
pub use logging::{FileKnowledgeConfig, FileLoggingConfig, FileStorageConfig};
pub use orchestrator::FileOrchestratorConfig;

use conclave_application::{AgentConfig, OrchestratorConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("llm.timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("llm.model cannot be empty")]
    EmptyModelName,

    #[error("llm.base_url cannot be empty")]
    EmptyBaseUrl,

    #[error("{field} must be between 0.0 and 2.0, got {value}")]
    InvalidTemperature { field: &'static str, value: f64 },

    #[error("orchestrator.conflict_approval_threshold must be between 0.0 and 1.0, got {0}")]
    InvalidThreshold(f64),

    #[error("{0} cannot be 0")]
    ZeroValue(&'static str),

    #[error("Unknown agent kind: {0}")]
    UnknownAgentKind(String),

    #[error("Agent name cannot be empty")]
    EmptyAgentName,

    #[error("Duplicate agent name: {0}")]
    DuplicateAgentName(String),

    #[error("The agent roster is empty")]
    EmptyRoster,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Scheduling, review and conflict settings
    pub orchestrator: FileOrchestratorConfig,
    /// Text-generation backend
    pub llm: FileLlmConfig,
    /// Agents to register
    pub agents: FileAgentsConfig,
    /// Per-agent memory bounds
    pub memory: FileMemoryConfig,
    /// Log destinations
    pub logging: FileLoggingConfig,
    /// Project persistence
    pub storage: FileStorageConfig,
    /// Documents for the research agent
    pub knowledge: FileKnowledgeConfig,
}

impl FileConfig {
    /// Validate the configuration, stopping at the first problem
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.llm.timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName);
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(ConfigValidationError::EmptyBaseUrl);
        }
        for (field, value) in self.llm.temperatures() {
            if !(0.0..=2.0).contains(&value) {
                return Err(ConfigValidationError::InvalidTemperature { field, value });
            }
        }

        let threshold = self.orchestrator.conflict_approval_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigValidationError::InvalidThreshold(threshold));
        }
        for (field, value) in [
            ("orchestrator.task_poll_ms", self.orchestrator.task_poll_ms as usize),
            ("orchestrator.message_poll_ms", self.orchestrator.message_poll_ms as usize),
            (
                "orchestrator.review_required_approvals",
                self.orchestrator.review_required_approvals,
            ),
            ("memory.max_short_term", self.memory.max_short_term),
        ] {
            if value == 0 {
                return Err(ConfigValidationError::ZeroValue(field));
            }
        }

        self.agents.profiles().map(|_| ())
    }

    /// Orchestrator parameters with the `[llm]` decomposition temperature
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        self.orchestrator
            .to_orchestrator_config(self.llm.decomposition_temperature)
    }

    /// Per-agent parameters from `[memory]` and `[llm]`
    pub fn agent_config(&self) -> AgentConfig {
        self.memory.to_agent_config(
            self.llm.think_temperature,
            self.llm.reflect_temperature,
            &self.llm.model,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[orchestrator]
task_poll_ms = 500
reviewer_count = 3
review_completed_tasks = true

[llm]
base_url = "http://localhost:11434/v1"
model = "llama3.1"
timeout_seconds = 300

[agents]
roster = ["security", "backend"]

[memory]
max_short_term = 50

[logging]
conversation_log = "/tmp/conclave.jsonl"

[storage]
projects_dir = "projects"

[knowledge]
directory = "docs/knowledge"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.orchestrator.task_poll_ms, 500);
        assert_eq!(config.orchestrator.reviewer_count, 3);
        assert!(config.orchestrator.review_completed_tasks);
        assert_eq!(config.llm.model, "llama3.1");
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.agents.roster, vec!["security", "backend"]);
        assert_eq!(config.memory.max_short_term, 50);
        assert_eq!(config.memory.recent_window, 10);
        assert_eq!(
            config.storage.projects_dir,
            Some(PathBuf::from("projects"))
        );
        assert_eq!(
            config.knowledge.directory,
            Some(PathBuf::from("docs/knowledge"))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config() {
        let config = FileConfig::default();
        assert_eq!(config.orchestrator.task_poll_ms, 1000);
        assert_eq!(config.orchestrator.review_required_approvals, 2);
        assert_eq!(config.llm.timeout_seconds, 120);
        assert_eq!(config.agents.roster.len(), 7);
        assert!(config.logging.directory.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_application_configs() {
        let mut config = FileConfig::default();
        config.llm.decomposition_temperature = 0.1;
        config.llm.model = "llama3.1".to_string();
        config.memory.max_short_term = 30;

        assert_eq!(config.orchestrator_config().decomposition_temperature, 0.1);
        let agent = config.agent_config();
        assert_eq!(agent.max_short_term, 30);
        assert_eq!(agent.model.as_deref(), Some("llama3.1"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = FileConfig::default();
        config.llm.timeout_seconds = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidTimeout)
        ));

        let mut config = FileConfig::default();
        config.llm.model = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::EmptyModelName)
        ));

        let mut config = FileConfig::default();
        config.llm.think_temperature = 3.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidTemperature {
                field: "llm.think_temperature",
                ..
            })
        ));

        let mut config = FileConfig::default();
        config.orchestrator.conflict_approval_threshold = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidThreshold(_))
        ));

        let mut config = FileConfig::default();
        config.orchestrator.message_poll_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::ZeroValue("orchestrator.message_poll_ms"))
        ));

        let mut config = FileConfig::default();
        config.agents.roster.push("janitor".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::UnknownAgentKind(_))
        ));
    }
}
