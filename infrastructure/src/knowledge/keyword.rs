//! In-memory knowledge base with keyword scoring.
//!
//! A document that contains the whole query scores `0.5 + 0.2` per
//! occurrence, capped at 1.0. Otherwise it scores by the share of query
//! terms it contains, scaled into `(0, 0.5]`, so phrase hits always rank
//! above partial overlaps.

use async_trait::async_trait;
use conclave_application::{KnowledgeError, KnowledgeRetriever, Snippet};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

/// Kind given to files directly inside the loaded directory
pub const DEFAULT_KIND: &str = "documentation";

/// Terms shorter than this are ignored when scoring overlap
const MIN_TERM_LEN: usize = 3;

#[derive(Debug, Clone)]
struct Document {
    content: String,
    lowered: String,
    kind: String,
}

/// [`KnowledgeRetriever`] over documents held in memory
#[derive(Debug, Default)]
pub struct KeywordKnowledgeBase {
    documents: RwLock<Vec<Document>>,
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= MIN_TERM_LEN)
        .map(str::to_lowercase)
        .collect()
}

impl KeywordKnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, content: impl Into<String>, kind: impl Into<String>) -> Self {
        self.add(content, kind);
        self
    }

    pub fn add(&self, content: impl Into<String>, kind: impl Into<String>) {
        let content = content.into();
        let document = Document {
            lowered: content.to_lowercase(),
            content,
            kind: kind.into(),
        };
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(document);
    }

    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load every `.md` and `.txt` file under `dir`.
    ///
    /// Files in a subdirectory take its name as their kind
    /// (`best_practice/sql.md` has kind `best_practice`); files at the top
    /// level get [`DEFAULT_KIND`]. Deeper nesting is not searched.
    pub async fn load_dir(dir: &Path) -> Result<Self, KnowledgeError> {
        let base = Self::new();
        base.load_files(dir, DEFAULT_KIND).await?;

        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| KnowledgeError::Unavailable(format!("{}: {}", dir.display(), e)))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| KnowledgeError::Unavailable(e.to_string()))?
        {
            let path = entry.path();
            if path.is_dir()
                && let Some(kind) = path.file_name().and_then(|n| n.to_str())
            {
                base.load_files(&path, kind).await?;
            }
        }

        info!("Loaded {} knowledge documents from {}", base.len(), dir.display());
        Ok(base)
    }

    async fn load_files(&self, dir: &Path, kind: &str) -> Result<(), KnowledgeError> {
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| KnowledgeError::Unavailable(format!("{}: {}", dir.display(), e)))?;

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| KnowledgeError::Unavailable(e.to_string()))?
        {
            let path = entry.path();
            let readable = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("md") | Some("txt")
            );
            if readable && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            match tokio::fs::read_to_string(&path).await {
                Ok(content) if !content.trim().is_empty() => self.add(content, kind),
                Ok(_) => {}
                Err(e) => debug!("Skipping {}: {}", path.display(), e),
            }
        }
        Ok(())
    }

    fn score(query_lower: &str, query_terms: &HashSet<String>, document: &Document) -> f64 {
        let phrase_hits = document.lowered.matches(query_lower).count();
        if phrase_hits > 0 {
            return (phrase_hits as f64 * 0.2 + 0.5).min(1.0);
        }
        if query_terms.is_empty() {
            return 0.0;
        }
        let document_terms = terms(&document.lowered);
        let shared = query_terms.intersection(&document_terms).count();
        0.5 * shared as f64 / query_terms.len() as f64
    }
}

#[async_trait]
impl KnowledgeRetriever for KeywordKnowledgeBase {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Snippet>, KnowledgeError> {
        let query_lower = query.trim().to_lowercase();
        if query_lower.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        let query_terms = terms(&query_lower);

        let mut ranked: Vec<Snippet> = self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(|doc| {
                let score = Self::score(&query_lower, &query_terms, doc);
                (score > 0.0).then(|| Snippet::new(doc.content.clone(), doc.kind.clone(), score))
            })
            .collect();

        // stable: equal scores keep insertion order
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(top_k);

        debug!(results = ranked.len(), "Knowledge searched");
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> KeywordKnowledgeBase {
        KeywordKnowledgeBase::new()
            .with_document(
                "Use parameterized queries. Parameterized queries stop SQL injection.",
                "best_practice",
            )
            .with_document("Index foreign keys used in joins.", "best_practice")
            .with_document("The orders API returns paginated results.", DEFAULT_KIND)
    }

    #[tokio::test]
    async fn test_phrase_hits_rank_first() {
        let results = base().retrieve("parameterized queries", 5).await.unwrap();
        assert_eq!(results.len(), 1);
        // two occurrences: 0.5 + 0.4
        assert!((results[0].score - 0.9).abs() < 1e-9);
        assert_eq!(results[0].kind, "best_practice");
    }

    #[tokio::test]
    async fn test_term_overlap() {
        let results = base()
            .retrieve("paginated orders for the api", 5)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].content.contains("orders API"));
        assert!(results[0].score > 0.0 && results[0].score <= 0.5);
    }

    #[tokio::test]
    async fn test_top_k_and_empty_query() {
        let kb = base();
        assert!(kb.retrieve("   ", 5).await.unwrap().is_empty());
        assert!(kb.retrieve("keys", 0).await.unwrap().is_empty());

        let results = kb.retrieve("queries keys results", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn test_phrase_score_is_capped() {
        let kb = KeywordKnowledgeBase::new().with_document("xss xss xss xss xss", "note");
        let results = kb.retrieve("xss", 1).await.unwrap();
        assert_eq!(results[0].score, 1.0);
    }

    #[tokio::test]
    async fn test_load_dir_uses_subdirectory_as_kind() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.md"), "Service overview and API notes").unwrap();
        std::fs::write(dir.path().join("image.png"), "binary").unwrap();
        std::fs::create_dir(dir.path().join("best_practice")).unwrap();
        std::fs::write(
            dir.path().join("best_practice").join("sql.txt"),
            "Always use parameterized queries",
        )
        .unwrap();

        let kb = KeywordKnowledgeBase::load_dir(dir.path()).await.unwrap();
        assert_eq!(kb.len(), 2);

        let results = kb.retrieve("parameterized queries", 3).await.unwrap();
        assert_eq!(results[0].kind, "best_practice");
        let results = kb.retrieve("api notes", 3).await.unwrap();
        assert_eq!(results[0].kind, DEFAULT_KIND);
    }

    #[tokio::test]
    async fn test_load_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            KeywordKnowledgeBase::load_dir(&dir.path().join("absent")).await,
            Err(KnowledgeError::Unavailable(_))
        ));
    }
}
