//! Inter-agent message protocol
//!
//! - [`AgentMessage`]: the envelope (sender, recipient, type, priority, correlation)
//! - [`MessageContent`]: the typed payload

pub mod content;
pub mod message;

pub use content::{MessageContent, ReviewRequest, ReviewResult, TaskRequest, TaskResult};
pub use message::{AgentMessage, MessageType, ORCHESTRATOR, Priority, Recipient};
