//! Per-agent generation and memory parameters.

use conclave_domain::agent::memory::{DEFAULT_MAX_SHORT_TERM, DEFAULT_RECENT_WINDOW};
use serde::{Deserialize, Serialize};

/// Parameters shared by every agent the application builds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Temperature for think calls.
    pub think_temperature: f64,
    /// Temperature for reflect calls.
    pub reflect_temperature: f64,
    /// Conversation window kept in memory.
    pub max_short_term: usize,
    /// Messages replayed into each think prompt.
    pub recent_window: usize,
    /// Model override passed to the gateway.
    pub model: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            think_temperature: 0.7,
            reflect_temperature: 0.5,
            max_short_term: DEFAULT_MAX_SHORT_TERM,
            recent_window: DEFAULT_RECENT_WINDOW,
            model: None,
        }
    }
}

impl AgentConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_short_term(mut self, max: usize) -> Self {
        self.max_short_term = max;
        self
    }

    pub fn with_recent_window(mut self, window: usize) -> Self {
        self.recent_window = window;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_memory_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.max_short_term, 100);
        assert_eq!(config.recent_window, 10);
        assert_eq!(config.think_temperature, 0.7);
        assert!(config.model.is_none());
    }
}
