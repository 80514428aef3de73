//! Knowledge adapters implementing the
//! [`KnowledgeRetriever`](conclave_application::KnowledgeRetriever) port.

mod keyword;

pub use keyword::{DEFAULT_KIND, KeywordKnowledgeBase};
