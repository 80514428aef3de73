//! Knowledge retrieval port
//!
//! Ranked snippet lookup used by specialists that ground their output in
//! stored documentation. How snippets are indexed is up to the adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the knowledge subsystem
#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("Knowledge source unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),
}

/// A ranked piece of stored knowledge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub content: String,
    /// Document category, e.g. "best_practice" or "documentation"
    pub kind: String,
    /// Relevance in [0, 1], higher is better
    pub score: f64,
}

impl Snippet {
    pub fn new(content: impl Into<String>, kind: impl Into<String>, score: f64) -> Self {
        Self {
            content: content.into(),
            kind: kind.into(),
            score,
        }
    }
}

/// Port for knowledge retrieval
#[async_trait]
pub trait KnowledgeRetriever: Send + Sync {
    /// Up to `top_k` snippets for `query`, best first
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Snippet>, KnowledgeError>;
}

/// Retriever that never finds anything.
pub struct NoKnowledge;

#[async_trait]
impl KnowledgeRetriever for NoKnowledge {
    async fn retrieve(&self, _query: &str, _top_k: usize) -> Result<Vec<Snippet>, KnowledgeError> {
        Ok(Vec::new())
    }
}
