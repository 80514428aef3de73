//! Research specialist: grounds recommendations in retrieved knowledge.

use super::AgentError;
use super::specialist::{Specialist, SpecialistContext};
use crate::ports::knowledge::{KnowledgeRetriever, Snippet};
use async_trait::async_trait;
use conclave_domain::agent::extract_confidence;
use conclave_domain::core::string::truncate;
use conclave_domain::prompt::{EXECUTE_TASK, ResearchPromptTemplate, sanitize_for_prompt};
use conclave_domain::{Action, ActionResult};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

/// Snippets retrieved per research query
pub const DEFAULT_TOP_K: usize = 5;

/// Specialist answering `research`, `validate` and `compare` (and
/// `execute_task` as research on the task description).
pub struct ResearchSpecialist {
    knowledge: Arc<dyn KnowledgeRetriever>,
    top_k: usize,
}

impl ResearchSpecialist {
    pub fn new(knowledge: Arc<dyn KnowledgeRetriever>) -> Self {
        Self {
            knowledge,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    async fn research(
        &self,
        ctx: &SpecialistContext,
        query: &str,
        context: &str,
    ) -> Result<Value, AgentError> {
        info!("{} researching: {}", ctx.profile.name, truncate(query, 100));

        let snippets = match self.knowledge.retrieve(query, self.top_k).await {
            Ok(snippets) => snippets,
            Err(e) => {
                warn!("Knowledge retrieval failed, continuing without: {}", e);
                Vec::new()
            }
        };
        let findings: Vec<String> = snippets.iter().map(describe_snippet).collect();

        let prompt = ResearchPromptTemplate::synthesize(query, context, &findings);
        let recommendation = ctx.generate(&prompt, 0.3).await?;
        let confidence = extract_confidence(&recommendation);

        info!(
            "Research completed: {} findings, confidence {:.2}",
            snippets.len(),
            confidence
        );

        Ok(json!({
            "query": query,
            "findings": snippets,
            "recommendation": recommendation,
            "confidence": confidence,
        }))
    }

    async fn validate(
        &self,
        ctx: &SpecialistContext,
        approach: &str,
        requirements: &[String],
    ) -> Result<Value, AgentError> {
        let analysis = ctx
            .generate(&ResearchPromptTemplate::validate(approach, requirements), 0.3)
            .await?;
        let confidence = extract_confidence(&analysis);
        Ok(json!({
            "valid": confidence >= ctx.profile.confidence_threshold,
            "confidence": confidence,
            "analysis": analysis,
        }))
    }

    async fn compare(
        &self,
        ctx: &SpecialistContext,
        approaches: &[String],
        criteria: &[String],
    ) -> Result<Value, AgentError> {
        let content = ctx
            .generate(&ResearchPromptTemplate::compare(approaches, criteria), 0.3)
            .await?;
        let scores = parse_scores(&content, approaches.len());
        let scores: serde_json::Map<String, Value> = approaches
            .iter()
            .zip(scores)
            .map(|(approach, score)| (approach.clone(), json!(score)))
            .collect();
        Ok(json!({ "scores": scores, "analysis": content }))
    }
}

#[async_trait]
impl Specialist for ResearchSpecialist {
    async fn act(
        &self,
        ctx: &SpecialistContext,
        action: &Action,
    ) -> Result<ActionResult, AgentError> {
        let output = match action.action_type.as_str() {
            "research" => {
                let query = sanitize_for_prompt(action.str_param("query", &action.description));
                let context = action
                    .parameters
                    .get("context")
                    .map(Value::to_string)
                    .unwrap_or_else(|| "{}".to_string());
                self.research(ctx, &query, &context).await?
            }
            EXECUTE_TASK => {
                let query =
                    sanitize_for_prompt(action.str_param("description", &action.description));
                self.research(ctx, &query, "{}").await?
            }
            "validate" => {
                let approach = sanitize_for_prompt(action.str_param("approach", ""));
                let requirements = string_list(action, "requirements");
                self.validate(ctx, &approach, &requirements).await?
            }
            "compare" => {
                let approaches = string_list(action, "approaches");
                let criteria = string_list(action, "criteria");
                self.compare(ctx, &approaches, &criteria).await?
            }
            other => {
                return Ok(ActionResult::failure(format!(
                    "Unknown action type: {}",
                    other
                )));
            }
        };
        Ok(ActionResult::success(output))
    }
}

fn describe_snippet(snippet: &Snippet) -> String {
    format!(
        "Source: {}\nConfidence: {:.2}\n{}",
        snippet.kind, snippet.score, snippet.content
    )
}

/// String items of an array parameter; other values are skipped
pub(crate) fn string_list(action: &Action, key: &str) -> Vec<String> {
    action
        .parameters
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(sanitize_for_prompt)
                .collect()
        })
        .unwrap_or_default()
}

/// Score per approach: the last number on the line starting with its
/// 1-based index. Values above 1 are percentages; missing scores are 0.5.
fn parse_scores(content: &str, count: usize) -> Vec<f64> {
    (1..=count)
        .map(|n| {
            let prefix_dot = format!("{}.", n);
            let prefix_paren = format!("{})", n);
            content
                .lines()
                .map(str::trim)
                .find(|line| line.starts_with(&prefix_dot) || line.starts_with(&prefix_paren))
                .and_then(|line| last_number(&line[prefix_dot.len()..]))
                .map(|score| if score > 1.0 { score / 100.0 } else { score })
                .map(|score| score.clamp(0.0, 1.0))
                .unwrap_or(0.5)
        })
        .collect()
}

fn last_number(text: &str) -> Option<f64> {
    text.split(|c: char| !(c.is_ascii_digit() || c == '.'))
        .filter(|token| !token.is_empty() && token.chars().any(|c| c.is_ascii_digit()))
        .filter_map(|token| token.trim_matches('.').parse::<f64>().ok())
        .last()
}
