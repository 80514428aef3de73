//! Log, storage and knowledge locations from TOML (`[logging]`, `[storage]`,
//! `[knowledge]`)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration from TOML
///
/// # Example
///
/// ```toml
/// [logging]
/// directory = "~/.local/state/conclave/logs"
/// conversation_log = "conversation.jsonl"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Daily-rolling diagnostic log files are written here when set
    pub directory: Option<PathBuf>,
    /// JSONL transcript of routed messages and orchestration events
    pub conversation_log: Option<PathBuf>,
}

impl FileLoggingConfig {
    /// Conversation log path; relative paths resolve against `directory`
    pub fn conversation_log_path(&self) -> Option<PathBuf> {
        let path = self.conversation_log.as_ref()?;
        match &self.directory {
            Some(dir) if path.is_relative() => Some(dir.join(path)),
            _ => Some(path.clone()),
        }
    }
}

/// Raw storage configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    /// One `{project_id}.json` file per saved project; saving is off when unset
    pub projects_dir: Option<PathBuf>,
}

/// Raw knowledge configuration from TOML
///
/// `.md` and `.txt` files under `directory` feed the research agent;
/// a subdirectory name becomes the document kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileKnowledgeConfig {
    pub directory: Option<PathBuf>,
}
