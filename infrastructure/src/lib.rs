//! Infrastructure layer for conclave
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, plus configuration file loading.
//!
//! | Port | Adapter |
//! |------|---------|
//! | `LlmGateway` | [`OpenAiCompatibleGateway`] |
//! | `ProjectStore` | [`JsonFileProjectStore`] |
//! | `KnowledgeRetriever` | [`KeywordKnowledgeBase`] |
//! | `ConversationLogger` | [`JsonlConversationLogger`] |

pub mod config;
pub mod knowledge;
pub mod llm;
pub mod logging;
pub mod storage;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileAgentsConfig, FileConfig, FileKnowledgeConfig,
    FileLlmConfig, FileLoggingConfig, FileMemoryConfig, FileOrchestratorConfig, FileStorageConfig,
};
pub use knowledge::KeywordKnowledgeBase;
pub use llm::{OpenAiCompatibleGateway, OpenAiSettings};
pub use logging::JsonlConversationLogger;
pub use storage::JsonFileProjectStore;
