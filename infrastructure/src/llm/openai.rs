//! OpenAI-compatible chat-completions adapter
//!
//! Works with any server that speaks `POST {base_url}/chat/completions`:
//! OpenAI itself, Ollama, vLLM, LM Studio and friends.

use crate::config::FileLlmConfig;
use async_trait::async_trait;
use conclave_application::{GatewayError, LlmGateway};
use conclave_domain::{ChatMessage, CompletionOptions};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Connection settings for [`OpenAiCompatibleGateway`]
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub base_url: String,
    /// Model used when a call does not override it
    pub model: String,
    /// Sent as a bearer token when present
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
}

impl OpenAiSettings {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key: None,
            max_tokens: None,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Settings from the `[llm]` section, reading the key from `api_key_env`
    pub fn from_config(config: &FileLlmConfig) -> Self {
        let mut settings = Self::new(&config.base_url, &config.model)
            .with_max_tokens(config.max_tokens)
            .with_timeout(Duration::from_secs(config.timeout_seconds));
        match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => settings = settings.with_api_key(key),
            _ => debug!(
                "{} is not set; sending requests without an API key",
                config.api_key_env
            ),
        }
        settings
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// [`LlmGateway`] over the OpenAI chat-completions protocol
pub struct OpenAiCompatibleGateway {
    client: reqwest::Client,
    settings: OpenAiSettings,
}

impl OpenAiCompatibleGateway {
    pub fn new(settings: OpenAiSettings) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| GatewayError::Other(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &OpenAiSettings {
        &self.settings
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl LlmGateway for OpenAiCompatibleGateway {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, GatewayError> {
        let model = options.model.as_deref().unwrap_or(&self.settings.model);
        let request = ChatRequest {
            model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: options.temperature,
            max_tokens: self.settings.max_tokens,
        };

        debug!(model, messages = messages.len(), "Sending chat completion");

        let mut builder = self.client.post(self.endpoint()).json(&request);
        if let Some(key) = &self.settings.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout
            } else {
                GatewayError::ConnectionError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), model, "Chat completion rejected");
            return Err(match status.as_u16() {
                401 | 403 => GatewayError::RequestFailed(format!("Authentication failed: {}", body)),
                404 => GatewayError::ModelNotAvailable(model.to_string()),
                429 => GatewayError::RequestFailed("Rate limited".to_string()),
                _ => GatewayError::RequestFailed(format!("HTTP {}: {}", status, body)),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GatewayError::InvalidResponse("No content in response".to_string()))
    }
}
