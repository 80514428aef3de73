//! Application layer for conclave
//!
//! This crate contains the agent runtime, the orchestrator, use cases, port
//! definitions and application configuration. It depends only on the domain
//! layer.

pub mod agent;
pub mod config;
pub mod orchestrator;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use agent::{
    Agent, AgentError, PromptSpecialist, ResearchSpecialist, SecuritySpecialist, Specialist,
    SpecialistContext,
};
pub use config::{AgentConfig, OrchestratorConfig};
pub use orchestrator::{Orchestrator, OrchestratorError, OrchestratorHandle};
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    knowledge::{KnowledgeError, KnowledgeRetriever, NoKnowledge, Snippet},
    llm_gateway::{GatewayError, LlmGateway},
    project_store::{ProjectStore, StoreError},
};
pub use use_cases::run_goal::{RunGoalError, RunGoalInput, RunGoalOutput, RunGoalUseCase};
