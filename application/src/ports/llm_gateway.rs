//! LLM Gateway port
//!
//! Defines the interface for communicating with the text-generation backend.

use async_trait::async_trait;
use conclave_domain::{ChatMessage, CompletionOptions};
use thiserror::Error;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// Gateway for LLM communication
///
/// This port defines how the application layer asks for generated text.
/// Implementations (adapters) live in the infrastructure layer. There is no
/// retry policy here; callers degrade on failure.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Complete a conversation and return the generated text
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, GatewayError>;
}
