//! Application-level configuration.
//!
//! - [`OrchestratorConfig`]: polling, review and conflict parameters
//! - [`AgentConfig`]: generation temperatures and memory sizing per agent

pub mod agent_config;
pub mod orchestrator_config;

pub use agent_config::AgentConfig;
pub use orchestrator_config::OrchestratorConfig;
