//! Domain layer for conclave
//!
//! Entities, value objects and pure rules of the multi-agent system. No I/O,
//! no async runtime and no knowledge of how text is generated.
//!
//! # Core Concepts
//!
//! ## Agents
//!
//! An agent has a kind (research, security, frontend, ...), a profile with
//! capabilities and a confidence threshold, a lifecycle [`AgentState`] and a
//! bounded [`AgentMemory`].
//!
//! ## Projects and Tasks
//!
//! A [`ProjectState`] owns [`SubTask`]s. Task status only moves along the
//! edges of [`TaskStatus::can_transition_to`].
//!
//! ## Consensus
//!
//! Reviews collect [`Vote`]s in a [`ConsensusBuilder`]. A security reject
//! with a concern vetoes the decision regardless of approvals.

pub mod agent;
pub mod consensus;
pub mod core;
pub mod prompt;
pub mod protocol;
pub mod security;
pub mod session;
pub mod task;

// Re-export commonly used types
pub use agent::{
    Action, ActionResult, AgentKind, AgentMemory, AgentProfile, AgentState, CodeBlock, Insight,
    MemoryEntry, MemoryEntryKind, MemorySnapshot, RiskLevel, Thought,
};
pub use consensus::{ConsensusBuilder, ConsensusResult, Vote, VoteType};
pub use core::error::DomainError;
pub use prompt::{AgentPromptTemplate, PromptTemplate, SpecialistPromptTemplate};
pub use protocol::{
    AgentMessage, MessageContent, MessageType, ORCHESTRATOR, Priority, Recipient, ReviewRequest,
    ReviewResult, TaskRequest, TaskResult,
};
pub use security::{SecurityFinding, SecurityReport, Severity, VulnerabilityType};
pub use session::{ChatMessage, CompletionOptions, Role};
pub use task::{ProjectState, SubTask, TaskRef, TaskStatus};
