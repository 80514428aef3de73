//! Text-generation backend configuration from TOML (`[llm]` section)

use serde::{Deserialize, Serialize};

/// Raw LLM configuration from TOML
///
/// Any server speaking the OpenAI chat-completions protocol works; the API
/// key is read from the environment variable named by `api_key_env`, never
/// from the file.
///
/// # Example
///
/// ```toml
/// [llm]
/// base_url = "http://localhost:11434/v1"
/// model = "llama3.1"
/// api_key_env = "OLLAMA_API_KEY"
/// timeout_seconds = 300
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLlmConfig {
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the bearer key
    pub api_key_env: String,
    pub max_tokens: Option<u32>,
    pub decomposition_temperature: f64,
    pub think_temperature: f64,
    pub reflect_temperature: f64,
    /// Per-request timeout
    pub timeout_seconds: u64,
}

impl Default for FileLlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_tokens: Some(4000),
            decomposition_temperature: 0.3,
            think_temperature: 0.7,
            reflect_temperature: 0.5,
            timeout_seconds: 120,
        }
    }
}

impl FileLlmConfig {
    /// The `(field, value)` pairs holding temperatures
    pub(super) fn temperatures(&self) -> [(&'static str, f64); 3] {
        [
            ("llm.decomposition_temperature", self.decomposition_temperature),
            ("llm.think_temperature", self.think_temperature),
            ("llm.reflect_temperature", self.reflect_temperature),
        ]
    }
}
