//! Agent specializations and profiles.
//!
//! [`AgentKind`] is the typed capability set: every agent in the pool is one
//! of these specializations. [`AgentProfile`] carries the identity data the
//! orchestrator matches against (name, role text, capability tags).

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Specialization of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Research,
    Security,
    Frontend,
    Backend,
    Requirements,
    Database,
    Testing,
}

impl AgentKind {
    /// All specializations, in the default roster order
    pub const ALL: [AgentKind; 7] = [
        AgentKind::Research,
        AgentKind::Security,
        AgentKind::Frontend,
        AgentKind::Backend,
        AgentKind::Requirements,
        AgentKind::Database,
        AgentKind::Testing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Research => "research",
            AgentKind::Security => "security",
            AgentKind::Frontend => "frontend",
            AgentKind::Backend => "backend",
            AgentKind::Requirements => "requirements",
            AgentKind::Database => "database",
            AgentKind::Testing => "testing",
        }
    }

    /// Name used when the agent is registered without an explicit one
    pub fn default_name(&self) -> String {
        format!("{}_agent", self.as_str())
    }

    pub fn default_role(&self) -> &'static str {
        match self {
            AgentKind::Research => "Research and Information Specialist",
            AgentKind::Security => "Security Analysis and Enforcement Specialist",
            AgentKind::Frontend => "Frontend Development and UI/UX Specialist",
            AgentKind::Backend => "Backend Development and API Specialist",
            AgentKind::Requirements => "Requirements Analysis and Documentation Specialist",
            AgentKind::Database => "Database Design and Management Specialist",
            AgentKind::Testing => "Testing and Quality Assurance Specialist",
        }
    }

    /// Capability tags, in matching order
    pub fn default_capabilities(&self) -> &'static [&'static str] {
        match self {
            AgentKind::Research => &[
                "searching documentation",
                "evaluating best practices",
                "comparing approaches",
                "synthesizing recommendations",
                "validating information",
            ],
            AgentKind::Security => &[
                "vulnerability scanning",
                "dependency auditing",
                "security code review",
                "compliance validation",
                "threat modeling",
                "security veto",
            ],
            AgentKind::Frontend => &[
                "ui component generation",
                "responsive design",
                "accessibility compliance",
                "animation and transitions",
                "state management",
                "styling and theming",
            ],
            AgentKind::Backend => &[
                "api design",
                "database schema design",
                "business logic",
                "authentication",
                "caching",
                "performance optimization",
            ],
            AgentKind::Requirements => &[
                "analyze_requirements",
                "generate_user_stories",
                "create_specifications",
            ],
            AgentKind::Database => &["design_schema", "generate_queries", "optimize_database"],
            AgentKind::Testing => &[
                "generate_unit_tests",
                "generate_integration_tests",
                "analyze_coverage",
            ],
        }
    }

    /// Minimum confidence to proceed without escalation
    pub fn default_confidence_threshold(&self) -> f64 {
        match self {
            AgentKind::Security => 0.9,
            AgentKind::Backend => 0.8,
            _ => 0.7,
        }
    }

    /// Whether agents of this kind may veto a decision
    pub fn has_security_oversight(&self) -> bool {
        matches!(self, AgentKind::Security)
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AgentKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let normalized = normalized.strip_suffix("_agent").unwrap_or(&normalized);
        AgentKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| DomainError::UnknownAgentKind(s.to_string()))
    }
}

/// Identity of a registered agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Unique name, the registry key
    pub name: String,
    pub kind: AgentKind,
    /// Free-text role description
    pub role: String,
    /// Ordered capability tags used by agent selection
    pub capabilities: Vec<String>,
    /// Minimum confidence in [0, 1] to act autonomously
    pub confidence_threshold: f64,
}

impl AgentProfile {
    /// Profile with the kind's default name, role, capabilities and threshold
    pub fn for_kind(kind: AgentKind) -> Self {
        Self {
            name: kind.default_name(),
            kind,
            role: kind.default_role().to_string(),
            capabilities: kind
                .default_capabilities()
                .iter()
                .map(|c| c.to_string())
                .collect(),
            confidence_threshold: kind.default_confidence_threshold(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// First capability tag matching `text`, case-insensitively.
    ///
    /// A tag matches when it occurs in `text`, or when each of its words
    /// occurs in `text` as a word ("api design" matches "design an API").
    pub fn matching_capability(&self, text: &str) -> Option<&str> {
        let text = text.to_lowercase();
        let words: Vec<&str> = text
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|w| !w.is_empty())
            .collect();
        self.capabilities
            .iter()
            .find(|cap| {
                let cap = cap.to_lowercase();
                text.contains(&cap) || {
                    let mut tag_words = cap.split_whitespace().peekable();
                    tag_words.peek().is_some() && tag_words.all(|w| words.contains(&w))
                }
            })
            .map(String::as_str)
    }

    /// Whether the role text marks this agent as a security reviewer
    pub fn has_security_role(&self) -> bool {
        self.role.to_lowercase().contains("security")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse() {
        assert_eq!("backend".parse::<AgentKind>().ok(), Some(AgentKind::Backend));
        assert_eq!(
            "Security_Agent".parse::<AgentKind>().ok(),
            Some(AgentKind::Security)
        );
        assert!("janitor".parse::<AgentKind>().is_err());
    }

    #[test]
    fn test_profile_defaults() {
        let profile = AgentProfile::for_kind(AgentKind::Security);
        assert_eq!(profile.name, "security_agent");
        assert_eq!(profile.confidence_threshold, 0.9);
        assert!(profile.has_security_role());
        assert!(profile.capabilities.iter().any(|c| c == "security veto"));
    }

    #[test]
    fn test_matching_capability_is_case_insensitive() {
        let profile = AgentProfile::for_kind(AgentKind::Backend).with_capabilities(["API Design"]);
        assert_eq!(
            profile.matching_capability("please do some api design for orders"),
            Some("API Design")
        );
        assert_eq!(
            profile.matching_capability("Design an api for users"),
            Some("API Design")
        );
        assert_eq!(profile.matching_capability("Design a landing page"), None);
    }

    #[test]
    fn test_threshold_clamped() {
        let profile = AgentProfile::for_kind(AgentKind::Testing).with_confidence_threshold(1.7);
        assert_eq!(profile.confidence_threshold, 1.0);
    }
}
