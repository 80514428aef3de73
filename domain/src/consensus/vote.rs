//! Vote types for weighted consensus
//!
//! A [`Vote`] is one agent's verdict on a decision. Votes are immutable once
//! cast; the [`ConsensusBuilder`](super::ConsensusBuilder) aggregates them.

use crate::agent::kind::AgentKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of verdict an agent can cast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteType {
    Approve,
    Reject,
    Abstain,
    RequestChanges,
}

impl VoteType {
    pub fn as_str(&self) -> &str {
        match self {
            VoteType::Approve => "approve",
            VoteType::Reject => "reject",
            VoteType::Abstain => "abstain",
            VoteType::RequestChanges => "request_changes",
        }
    }

    /// Reject and RequestChanges count as dissent
    pub fn is_dissent(&self) -> bool {
        matches!(self, VoteType::Reject | VoteType::RequestChanges)
    }
}

impl std::fmt::Display for VoteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single vote from an agent on a decision
///
/// # Example
///
/// ```
/// use conclave_domain::consensus::Vote;
///
/// let vote = Vote::approve("backend_agent", "Schema looks right").with_confidence(0.9);
/// assert_eq!(vote.confidence, 0.9);
///
/// let veto = Vote::reject("security_agent", "Injection risk")
///     .with_concerns(["Unsanitized input in query builder"]);
/// assert!(veto.can_veto());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vote {
    /// Name of the voting agent
    pub voter: String,
    /// Specialization of the voter, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voter_kind: Option<AgentKind>,
    pub vote_type: VoteType,
    /// Weight of the vote (0.0 to 1.0)
    pub confidence: f64,
    pub reasoning: String,
    #[serde(default)]
    pub concerns: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl Vote {
    /// Create a vote with full confidence
    pub fn new(voter: impl Into<String>, vote_type: VoteType, reasoning: impl Into<String>) -> Self {
        Self {
            voter: voter.into(),
            voter_kind: None,
            vote_type,
            confidence: 1.0,
            reasoning: reasoning.into(),
            concerns: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn approve(voter: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self::new(voter, VoteType::Approve, reasoning)
    }

    pub fn reject(voter: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self::new(voter, VoteType::Reject, reasoning)
    }

    pub fn request_changes(voter: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self::new(voter, VoteType::RequestChanges, reasoning)
    }

    pub fn abstain(voter: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self::new(voter, VoteType::Abstain, reasoning)
    }

    /// Set the vote weight, clamped to [0, 1]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        self
    }

    pub fn with_voter_kind(mut self, kind: AgentKind) -> Self {
        self.voter_kind = Some(kind);
        self
    }

    pub fn with_concerns<I, S>(mut self, concerns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.concerns = concerns.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the voter carries security-oversight identity
    ///
    /// True for voters of kind Security, or whose name contains "security"
    /// case-insensitively.
    pub fn has_security_oversight(&self) -> bool {
        self.voter_kind
            .map(|k| k.has_security_oversight())
            .unwrap_or(false)
            || self.voter.to_lowercase().contains("security")
    }

    /// Whether this vote would veto a decision that allows vetoes
    pub fn can_veto(&self) -> bool {
        self.vote_type == VoteType::Reject
            && self.has_security_oversight()
            && !self.concerns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_clamped() {
        assert_eq!(Vote::approve("a", "").with_confidence(1.5).confidence, 1.0);
        assert_eq!(Vote::approve("a", "").with_confidence(-0.2).confidence, 0.0);
        assert_eq!(Vote::approve("a", "").confidence, 1.0);
    }

    #[test]
    fn test_security_oversight_by_name_or_kind() {
        assert!(Vote::reject("SecurityBot", "").has_security_oversight());
        assert!(
            Vote::reject("auditor", "")
                .with_voter_kind(AgentKind::Security)
                .has_security_oversight()
        );
        assert!(!Vote::reject("backend_agent", "").has_security_oversight());
    }

    #[test]
    fn test_veto_requires_concern_and_reject() {
        assert!(!Vote::reject("security_agent", "no").can_veto());
        assert!(
            !Vote::request_changes("security_agent", "no")
                .with_concerns(["x"])
                .can_veto()
        );
        assert!(
            Vote::reject("security_agent", "no")
                .with_concerns(["x"])
                .can_veto()
        );
    }
}
