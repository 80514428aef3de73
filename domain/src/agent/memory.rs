//! Agent memory.
//!
//! Two tiers:
//!
//! | Tier | Contents | Bound |
//! |------|----------|-------|
//! | Short-term | Conversation [`ChatMessage`]s | `max_short_term`, oldest dropped first |
//! | Log | Thoughts, insights and [`MemoryEntry`] records | unbounded |
//!
//! The log can be exported with [`AgentMemory::snapshot`] and restored into
//! a fresh memory with [`AgentMemory::restore`].

use super::value_objects::{Insight, Thought};
use crate::core::string::truncate;
use crate::session::ChatMessage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default size of the conversation window
pub const DEFAULT_MAX_SHORT_TERM: usize = 100;

/// Default number of messages replayed into a prompt
pub const DEFAULT_RECENT_WINDOW: usize = 10;

/// What a memory entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryEntryKind {
    Thought,
    Insight,
    Action,
    Message,
}

/// A single logged memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Rendered, searchable content
    pub content: String,
    pub kind: MemoryEntryKind,
    pub timestamp: DateTime<Utc>,
    /// Relevance weight in [0, 1]
    pub importance: f64,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl MemoryEntry {
    pub fn new(kind: MemoryEntryKind, content: impl Into<String>, importance: f64) -> Self {
        Self {
            content: content.into(),
            kind,
            timestamp: Utc::now(),
            importance: importance.clamp(0.0, 1.0),
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Serializable export of an agent's memory log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub agent_name: String,
    pub entries: Vec<MemoryEntry>,
}

/// Memory owned by one agent
#[derive(Debug, Clone)]
pub struct AgentMemory {
    agent_name: String,
    max_short_term: usize,
    messages: VecDeque<ChatMessage>,
    thoughts: Vec<Thought>,
    insights: Vec<Insight>,
    entries: Vec<MemoryEntry>,
}

impl AgentMemory {
    pub fn new(agent_name: impl Into<String>) -> Self {
        Self::with_capacity(agent_name, DEFAULT_MAX_SHORT_TERM)
    }

    pub fn with_capacity(agent_name: impl Into<String>, max_short_term: usize) -> Self {
        Self {
            agent_name: agent_name.into(),
            max_short_term: max_short_term.max(1),
            messages: VecDeque::new(),
            thoughts: Vec::new(),
            insights: Vec::new(),
            entries: Vec::new(),
        }
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn max_short_term(&self) -> usize {
        self.max_short_term
    }

    // ==================== Short-term ====================

    /// Append a conversation message, dropping the oldest past the bound
    pub fn add_message(&mut self, message: ChatMessage) {
        self.messages.push_back(message);
        while self.messages.len() > self.max_short_term {
            self.messages.pop_front();
        }
    }

    /// The last `limit` conversation messages, oldest first
    pub fn recent_messages(&self, limit: usize) -> Vec<ChatMessage> {
        let skip = self.messages.len().saturating_sub(limit);
        self.messages.iter().skip(skip).cloned().collect()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn clear_short_term(&mut self) {
        self.messages.clear();
        tracing::debug!(agent = %self.agent_name, "Short-term memory cleared");
    }

    // ==================== Log ====================

    pub fn add_thought(&mut self, thought: Thought) {
        self.entries.push(MemoryEntry::new(
            MemoryEntryKind::Thought,
            thought.content.clone(),
            thought.confidence,
        ));
        self.thoughts.push(thought);
    }

    pub fn add_insight(&mut self, insight: Insight) {
        let importance = if insight.should_update_knowledge { 1.0 } else { 0.5 };
        self.entries.push(MemoryEntry::new(
            MemoryEntryKind::Insight,
            insight.lesson.clone(),
            importance,
        ));
        self.insights.push(insight);
    }

    pub fn add_entry(&mut self, entry: MemoryEntry) {
        self.entries.push(entry);
    }

    pub fn thoughts(&self) -> &[Thought] {
        &self.thoughts
    }

    pub fn insights(&self) -> &[Insight] {
        &self.insights
    }

    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    /// Keyword search over the log, newest first
    pub fn search(
        &self,
        query: &str,
        kind: Option<MemoryEntryKind>,
        limit: usize,
    ) -> Vec<MemoryEntry> {
        let query = query.to_lowercase();
        self.entries
            .iter()
            .rev()
            .filter(|e| kind.is_none_or(|k| e.kind == k))
            .filter(|e| e.content.to_lowercase().contains(&query))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Summary of recent thoughts and insights for prompts
    pub fn context_summary(&self) -> String {
        let mut parts = Vec::new();

        if !self.thoughts.is_empty() {
            parts.push("Recent thoughts:".to_string());
            for t in last_n(&self.thoughts, 3) {
                parts.push(format!(
                    "  - {} (conf: {:.1})",
                    truncate(&t.content, 100),
                    t.confidence
                ));
            }
        }

        if !self.insights.is_empty() {
            parts.push("\nRecent insights:".to_string());
            for i in last_n(&self.insights, 3) {
                parts.push(format!("  - {}", truncate(&i.lesson, 100)));
            }
        }

        if !self.messages.is_empty() {
            parts.push(format!("\nConversation: {} messages", self.messages.len()));
        }

        if parts.is_empty() {
            "No context yet.".to_string()
        } else {
            parts.join("\n")
        }
    }

    // ==================== Persistence ====================

    pub fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot {
            agent_name: self.agent_name.clone(),
            entries: self.entries.clone(),
        }
    }

    /// Replace the log with the snapshot's entries
    pub fn restore(&mut self, snapshot: MemorySnapshot) {
        tracing::info!(
            agent = %self.agent_name,
            entries = snapshot.entries.len(),
            "Memory restored"
        );
        self.entries = snapshot.entries;
    }
}

fn last_n<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}
