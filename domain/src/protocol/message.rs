//! Message envelope for inter-agent communication

use super::content::MessageContent;
use crate::core::id::generate_message_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reserved recipient name for the orchestrator
pub const ORCHESTRATOR: &str = "orchestrator";

/// Kind of message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Ask another agent to do something
    Request,
    /// Reply to a request
    Response,
    /// Escalate to the orchestrator
    Escalation,
    /// Inform all agents
    Broadcast,
    /// Request peer review
    Review,
    Approval,
    Rejection,
    Status,
}

impl MessageType {
    pub fn as_str(&self) -> &str {
        match self {
            MessageType::Request => "request",
            MessageType::Response => "response",
            MessageType::Escalation => "escalation",
            MessageType::Broadcast => "broadcast",
            MessageType::Review => "review",
            MessageType::Approval => "approval",
            MessageType::Rejection => "rejection",
            MessageType::Status => "status",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Message priority, ordered Low < Normal < High < Critical
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// Addressee of a message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    /// A single agent (or the orchestrator) by name
    Agent(String),
    /// Every registered agent
    Broadcast,
}

impl Recipient {
    pub fn agent(name: impl Into<String>) -> Self {
        Recipient::Agent(name.into())
    }

    pub fn orchestrator() -> Self {
        Recipient::Agent(ORCHESTRATOR.to_string())
    }

    pub fn is_orchestrator(&self) -> bool {
        matches!(self, Recipient::Agent(name) if name == ORCHESTRATOR)
    }

    /// Name of the single addressee, if any
    pub fn name(&self) -> Option<&str> {
        match self {
            Recipient::Agent(name) => Some(name),
            Recipient::Broadcast => None,
        }
    }
}

impl std::fmt::Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recipient::Agent(name) => write!(f, "{}", name),
            Recipient::Broadcast => write!(f, "broadcast"),
        }
    }
}

impl From<&str> for Recipient {
    fn from(s: &str) -> Self {
        if s == "broadcast" {
            Recipient::Broadcast
        } else {
            Recipient::Agent(s.to_string())
        }
    }
}

impl From<String> for Recipient {
    fn from(s: String) -> Self {
        Recipient::from(s.as_str())
    }
}

/// A message between agents
///
/// Immutable once built: [`create_reply`](Self::create_reply) produces a new
/// message linked to this one.
///
/// # Example
///
/// ```
/// use conclave_domain::protocol::{AgentMessage, MessageType, Recipient};
///
/// let request = AgentMessage::new(
///     "orchestrator",
///     Recipient::agent("backend_agent"),
///     MessageType::Request,
///     "Design the orders API",
///     1.0,
/// );
/// let reply = request.create_reply("backend_agent", "Done", MessageType::Response, 0.9);
///
/// assert_eq!(reply.receiver, Recipient::agent("orchestrator"));
/// assert_eq!(reply.in_reply_to.as_deref(), Some(request.message_id.as_str()));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub message_id: String,
    pub sender: String,
    pub receiver: Recipient,
    pub message_type: MessageType,
    pub content: MessageContent,
    /// Sender's confidence in the message (0.0 to 1.0)
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub priority: Priority,
    /// Links related messages of one exchange
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
}

impl AgentMessage {
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<Recipient>,
        message_type: MessageType,
        content: impl Into<MessageContent>,
        confidence: f64,
    ) -> Self {
        Self {
            message_id: generate_message_id(),
            sender: sender.into(),
            receiver: receiver.into(),
            message_type,
            content: content.into(),
            confidence: clamp_confidence(confidence),
            timestamp: Utc::now(),
            priority: Priority::Normal,
            correlation_id: None,
            in_reply_to: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_correlation(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Build a reply addressed to this message's sender.
    ///
    /// The reply keeps this message's correlation id, or starts a new
    /// correlation at this message's id.
    pub fn create_reply(
        &self,
        sender: impl Into<String>,
        content: impl Into<MessageContent>,
        message_type: MessageType,
        confidence: f64,
    ) -> AgentMessage {
        let mut reply = AgentMessage::new(
            sender,
            Recipient::Agent(self.sender.clone()),
            message_type,
            content,
            confidence,
        );
        reply.correlation_id = Some(
            self.correlation_id
                .clone()
                .unwrap_or_else(|| self.message_id.clone()),
        );
        reply.in_reply_to = Some(self.message_id.clone());
        reply
    }

    pub fn is_broadcast(&self) -> bool {
        self.receiver == Recipient::Broadcast
    }
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AgentMessage {
        AgentMessage::new(
            "orchestrator",
            Recipient::agent("backend_agent"),
            MessageType::Request,
            "do it",
            1.0,
        )
    }

    #[test]
    fn test_reply_starts_correlation_at_original_id() {
        let original = request();
        let reply = original.create_reply("backend_agent", "ok", MessageType::Response, 0.8);

        assert_eq!(reply.receiver, Recipient::agent("orchestrator"));
        assert_eq!(reply.sender, "backend_agent");
        assert_eq!(reply.correlation_id, Some(original.message_id.clone()));
        assert_eq!(reply.in_reply_to, Some(original.message_id.clone()));
        assert_ne!(reply.message_id, original.message_id);
    }

    #[test]
    fn test_reply_keeps_existing_correlation() {
        let original = request().with_correlation("thread-7");
        let reply = original.create_reply("backend_agent", "ok", MessageType::Response, 1.0);
        assert_eq!(reply.correlation_id.as_deref(), Some("thread-7"));
        assert_eq!(reply.in_reply_to, Some(original.message_id));
    }

    #[test]
    fn test_confidence_clamped() {
        let msg = AgentMessage::new("a", "b", MessageType::Status, "x", 3.0);
        assert_eq!(msg.confidence, 1.0);
        let msg = AgentMessage::new("a", "b", MessageType::Status, "x", f64::NAN);
        assert_eq!(msg.confidence, 0.0);
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Low < Priority::Normal);
        assert!(Priority::High < Priority::Critical);
        assert_eq!(request().priority, Priority::Normal);
        assert_eq!(
            request().with_priority(Priority::High).priority,
            Priority::High
        );
    }

    #[test]
    fn test_recipient_from_str() {
        assert_eq!(Recipient::from("broadcast"), Recipient::Broadcast);
        assert!(Recipient::from("orchestrator").is_orchestrator());
        assert_eq!(Recipient::agent("x").name(), Some("x"));
        assert_eq!(Recipient::Broadcast.name(), None);
    }
}
