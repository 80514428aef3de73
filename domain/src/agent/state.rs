//! Agent lifecycle state machine

use serde::{Deserialize, Serialize};

/// Current state of an agent
///
/// ```text
/// Idle ──think──▶ Thinking ──▶ Idle
/// Idle ──act────▶ Acting ───▶ Idle
///                   └──fail──▶ Error ──▶ Idle
/// Idle ──review pending──▶ Waiting ──verdict──▶ Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    #[default]
    Idle,
    Thinking,
    Acting,
    Waiting,
    Error,
}

impl AgentState {
    pub fn as_str(&self) -> &str {
        match self {
            AgentState::Idle => "idle",
            AgentState::Thinking => "thinking",
            AgentState::Acting => "acting",
            AgentState::Waiting => "waiting",
            AgentState::Error => "error",
        }
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// Agents run calls concurrently (a review can overlap a task), so busy
    /// states may hand over to each other; only Error is restricted to
    /// recovery back to Idle.
    pub fn can_transition_to(&self, next: AgentState) -> bool {
        use AgentState::*;
        match (self, next) {
            (a, b) if *a == b => true,
            (Error, Idle) => true,
            (Error, _) => false,
            (Acting, Error) | (Thinking, Error) => true,
            (_, Error) => false,
            _ => true,
        }
    }

    /// Whether the agent is in the middle of a call
    pub fn is_busy(&self) -> bool {
        matches!(self, AgentState::Thinking | AgentState::Acting)
    }
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        assert_eq!(AgentState::default(), AgentState::Idle);
    }

    #[test]
    fn test_error_only_recovers_to_idle() {
        assert!(AgentState::Error.can_transition_to(AgentState::Idle));
        assert!(!AgentState::Error.can_transition_to(AgentState::Acting));
        assert!(!AgentState::Error.can_transition_to(AgentState::Thinking));
    }

    #[test]
    fn test_error_reachable_only_from_work() {
        assert!(AgentState::Acting.can_transition_to(AgentState::Error));
        assert!(AgentState::Thinking.can_transition_to(AgentState::Error));
        assert!(!AgentState::Idle.can_transition_to(AgentState::Error));
        assert!(!AgentState::Waiting.can_transition_to(AgentState::Error));
    }

    #[test]
    fn test_busy_states() {
        assert!(AgentState::Acting.is_busy());
        assert!(!AgentState::Waiting.is_busy());
    }
}
