//! In-process fakes shared by the unit tests.

use crate::ports::knowledge::{KnowledgeError, KnowledgeRetriever, Snippet};
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use async_trait::async_trait;
use conclave_domain::{ChatMessage, CompletionOptions};
use std::collections::VecDeque;
use std::sync::Mutex;

type Rule = Box<dyn Fn(&[ChatMessage]) -> Option<String> + Send + Sync>;

/// Gateway answering from rules first, then from a queue of responses.
///
/// With neither matching, the call fails.
pub(crate) struct ScriptedGateway {
    script: Mutex<VecDeque<String>>,
    rules: Vec<Rule>,
    calls: Mutex<Vec<(Vec<ChatMessage>, CompletionOptions)>>,
}

impl ScriptedGateway {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(responses.into_iter().map(Into::into).collect()),
            rules: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self::new(Vec::<String>::new())
    }

    /// Answer with `response` whenever the last message contains `needle`
    pub fn when(mut self, needle: &'static str, response: impl Into<String>) -> Self {
        let response = response.into();
        self.rules.push(Box::new(move |messages| {
            messages
                .last()
                .filter(|m| m.content.contains(needle))
                .map(|_| response.clone())
        }));
        self
    }

    /// Answer with `response` whenever the system prompt contains `needle`
    pub fn when_system(mut self, needle: &'static str, response: impl Into<String>) -> Self {
        let response = response.into();
        self.rules.push(Box::new(move |messages| {
            messages
                .first()
                .filter(|m| m.content.contains(needle))
                .map(|_| response.clone())
        }));
        self
    }

    pub fn calls(&self) -> Vec<(Vec<ChatMessage>, CompletionOptions)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push((messages.to_vec(), options.clone()));

        if let Some(response) = self.rules.iter().find_map(|rule| rule(messages)) {
            return Ok(response);
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GatewayError::RequestFailed("no scripted response".to_string()))
    }
}

/// Retriever returning a fixed list of snippets
pub(crate) struct StaticKnowledge(pub Vec<Snippet>);

#[async_trait]
impl KnowledgeRetriever for StaticKnowledge {
    async fn retrieve(&self, _query: &str, top_k: usize) -> Result<Vec<Snippet>, KnowledgeError> {
        Ok(self.0.iter().take(top_k).cloned().collect())
    }
}
