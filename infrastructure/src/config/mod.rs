//! Configuration file loading for conclave
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `CONCLAVE_*` environment variables (`CONCLAVE_LLM__MODEL=llama3.1`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./conclave.toml` or `./.conclave.toml`
//! 4. Global: `$XDG_CONFIG_HOME/conclave/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileAgentsConfig, FileConfig, FileCustomAgent, FileKnowledgeConfig,
    FileLlmConfig, FileLoggingConfig, FileMemoryConfig, FileOrchestratorConfig, FileStorageConfig,
};
pub use loader::ConfigLoader;
