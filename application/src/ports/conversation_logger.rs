//! Port for structured conversation logging.
//!
//! Defines the [`ConversationLogger`] trait for recording conversation events
//! (routed agent messages, decompositions, review outcomes) to a structured
//! log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures the full
//! message transcript in a machine-readable format (JSONL).

use conclave_domain::AgentMessage;
use serde_json::{Value, json};

/// A structured conversation event for logging.
///
/// Each event has a type string and a JSON payload containing
/// event-specific fields. The adapter adds the timestamp.
#[derive(Debug, Clone)]
pub struct ConversationEvent {
    /// Event type identifier (e.g., "message_routed", "task_decomposed").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }

    /// Event for a message the orchestrator routed
    pub fn message_routed(message: &AgentMessage) -> Self {
        let payload = serde_json::to_value(message)
            .unwrap_or_else(|e| json!({ "message_id": message.message_id, "error": e.to_string() }));
        Self::new("message_routed", payload)
    }
}

/// Port for logging conversation events to a structured log.
///
/// Implementations write each event as a single record (e.g., one JSONL line).
/// `log` is synchronous and infallible; logging failures are ignored.
pub trait ConversationLogger: Send + Sync {
    /// Record a conversation event.
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_domain::MessageType;

    #[test]
    fn test_message_routed_payload() {
        let msg = AgentMessage::new("a", "b", MessageType::Status, "ping", 1.0);
        let event = ConversationEvent::message_routed(&msg);
        assert_eq!(event.event_type, "message_routed");
        assert_eq!(event.payload["sender"], "a");
        assert_eq!(event.payload["message_id"], msg.message_id.as_str());
    }
}
