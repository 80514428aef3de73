//! Prompt domain
//!
//! Templates for every text-generation call the system makes.

pub mod agent;
pub mod research;
pub mod sanitize;
pub mod specialist;
mod template;

pub use agent::AgentPromptTemplate;
pub use research::{ResearchPromptTemplate, SecurityPromptTemplate};
pub use sanitize::sanitize_for_prompt;
pub use specialist::{EXECUTE_TASK, SpecialistAction, SpecialistPromptTemplate};
pub use template::PromptTemplate;
