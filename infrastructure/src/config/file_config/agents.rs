//! Agent roster and memory configuration from TOML (`[agents]`, `[memory]`)

use super::ConfigValidationError;
use conclave_application::AgentConfig;
use conclave_domain::{AgentKind, AgentProfile};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Raw agent roster from TOML
///
/// `roster` lists the kinds registered with their default profile, in
/// registration order (which is also agent-selection order). `custom`
/// entries are registered after them.
///
/// # Example
///
/// ```toml
/// [agents]
/// roster = ["security", "backend", "testing"]
///
/// [[agents.custom]]
/// name = "payments_agent"
/// kind = "backend"
/// capabilities = ["payment", "billing"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentsConfig {
    pub roster: Vec<String>,
    pub custom: Vec<FileCustomAgent>,
}

impl Default for FileAgentsConfig {
    fn default() -> Self {
        Self {
            roster: AgentKind::ALL.iter().map(|k| k.as_str().to_string()).collect(),
            custom: Vec::new(),
        }
    }
}

/// One `[[agents.custom]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileCustomAgent {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub role: Option<String>,
    /// Replaces the kind's default capabilities when present
    #[serde(default)]
    pub capabilities: Option<Vec<String>>,
    #[serde(default)]
    pub confidence_threshold: Option<f64>,
}

impl FileAgentsConfig {
    /// Profiles to register, roster first
    pub fn profiles(&self) -> Result<Vec<AgentProfile>, ConfigValidationError> {
        let mut profiles = Vec::with_capacity(self.roster.len() + self.custom.len());

        for kind in &self.roster {
            let kind = parse_kind(kind)?;
            profiles.push(AgentProfile::for_kind(kind));
        }

        for entry in &self.custom {
            if entry.name.trim().is_empty() {
                return Err(ConfigValidationError::EmptyAgentName);
            }
            let mut profile = AgentProfile::for_kind(parse_kind(&entry.kind)?).with_name(&entry.name);
            if let Some(role) = &entry.role {
                profile = profile.with_role(role);
            }
            if let Some(capabilities) = &entry.capabilities {
                profile = profile.with_capabilities(capabilities.iter().cloned());
            }
            if let Some(threshold) = entry.confidence_threshold {
                profile = profile.with_confidence_threshold(threshold);
            }
            profiles.push(profile);
        }

        let mut seen = HashSet::new();
        for profile in &profiles {
            if !seen.insert(profile.name.as_str()) {
                return Err(ConfigValidationError::DuplicateAgentName(profile.name.clone()));
            }
        }
        if profiles.is_empty() {
            return Err(ConfigValidationError::EmptyRoster);
        }
        Ok(profiles)
    }
}

fn parse_kind(kind: &str) -> Result<AgentKind, ConfigValidationError> {
    kind.parse()
        .map_err(|_| ConfigValidationError::UnknownAgentKind(kind.to_string()))
}

/// Raw agent memory configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileMemoryConfig {
    /// Conversation messages kept per agent
    pub max_short_term: usize,
    /// Messages replayed into each think call
    pub recent_window: usize,
}

impl Default for FileMemoryConfig {
    fn default() -> Self {
        let defaults = AgentConfig::default();
        Self {
            max_short_term: defaults.max_short_term,
            recent_window: defaults.recent_window,
        }
    }
}

impl FileMemoryConfig {
    /// Per-agent config with the `[llm]` temperatures and model
    pub fn to_agent_config(
        &self,
        think_temperature: f64,
        reflect_temperature: f64,
        model: &str,
    ) -> AgentConfig {
        let mut config = AgentConfig::default()
            .with_max_short_term(self.max_short_term)
            .with_recent_window(self.recent_window)
            .with_model(model);
        config.think_temperature = think_temperature;
        config.reflect_temperature = reflect_temperature;
        config
    }
}
