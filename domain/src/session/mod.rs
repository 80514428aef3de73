//! LLM conversation domain.
//!
//! - [`entities::ChatMessage`]: a single message sent to the text-generation backend
//! - [`entities::CompletionOptions`]: model and temperature for one call

pub mod entities;

pub use entities::{ChatMessage, CompletionOptions, Role};
