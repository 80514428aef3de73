//! Specialist contract and the prompt-driven specialists.
//!
//! A [`Specialist`] is the kind-specific part of an agent: what `act` does
//! and, optionally, how the agent reviews a peer's change. The shared
//! think/reflect loop lives in [`Agent`](super::Agent).

use super::AgentError;
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use async_trait::async_trait;
use conclave_domain::agent::extract_code_blocks;
use conclave_domain::prompt::{SpecialistPromptTemplate, sanitize_for_prompt};
use conclave_domain::{
    Action, ActionResult, AgentKind, AgentProfile, ChatMessage, CompletionOptions, ReviewRequest,
    Vote,
};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// What a specialist sees of its agent while acting
pub struct SpecialistContext {
    pub profile: AgentProfile,
    /// Agent system prompt, including the memory summary
    pub system_prompt: String,
    gateway: Arc<dyn LlmGateway>,
    model: Option<String>,
}

impl SpecialistContext {
    pub fn new(
        profile: AgentProfile,
        system_prompt: impl Into<String>,
        gateway: Arc<dyn LlmGateway>,
        model: Option<String>,
    ) -> Self {
        Self {
            profile,
            system_prompt: system_prompt.into(),
            gateway,
            model,
        }
    }

    fn options(&self, temperature: f64) -> CompletionOptions {
        let options = CompletionOptions::with_temperature(temperature);
        match &self.model {
            Some(model) => options.with_model(model.clone()),
            None => options,
        }
    }

    /// Generate with the agent's own system prompt
    pub async fn generate(&self, prompt: &str, temperature: f64) -> Result<String, GatewayError> {
        self.generate_with_system(&self.system_prompt, prompt, temperature)
            .await
    }

    /// Generate with an explicit system prompt
    pub async fn generate_with_system(
        &self,
        system: &str,
        prompt: &str,
        temperature: f64,
    ) -> Result<String, GatewayError> {
        let messages = [ChatMessage::system(system), ChatMessage::user(prompt)];
        self.gateway
            .complete(&messages, &self.options(temperature))
            .await
    }
}

/// Kind-specific behaviour of an agent.
///
/// `act` returns a failed [`ActionResult`] for actions it does not know and
/// `Err` when a collaborator failed.
#[async_trait]
pub trait Specialist: Send + Sync {
    async fn act(
        &self,
        ctx: &SpecialistContext,
        action: &Action,
    ) -> Result<ActionResult, AgentError>;

    /// Review a change in a specialist-specific way; `None` falls back to
    /// the agent's generic review.
    async fn review(&self, _ctx: &SpecialistContext, _request: &ReviewRequest) -> Option<Vote> {
        None
    }
}

/// Specialist driven by the action catalogue of
/// [`SpecialistPromptTemplate`]: one generation per action, code blocks in
/// the answer become artifacts.
pub struct PromptSpecialist {
    kind: AgentKind,
}

impl PromptSpecialist {
    pub fn new(kind: AgentKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl Specialist for PromptSpecialist {
    async fn act(
        &self,
        ctx: &SpecialistContext,
        action: &Action,
    ) -> Result<ActionResult, AgentError> {
        let Some(spec) = SpecialistPromptTemplate::find(self.kind, &action.action_type) else {
            return Ok(ActionResult::failure(format!(
                "Unknown action type: {}",
                action.action_type
            )));
        };

        let description = sanitize_for_prompt(action.str_param("description", &action.description));
        let prompt = SpecialistPromptTemplate::action_prompt(&spec, &description, &action.parameters);
        debug!(
            "{} running {} ({} chars)",
            ctx.profile.name,
            spec.action_type,
            prompt.len()
        );

        let content = ctx.generate(&prompt, spec.temperature).await?;
        let blocks = extract_code_blocks(&content);
        let artifacts = blocks
            .iter()
            .enumerate()
            .map(|(i, block)| format!("{}-{}.{}", spec.action_type, i + 1, block.language))
            .collect();
        let code = blocks
            .iter()
            .map(|b| json!({ "language": b.language, "code": b.code }))
            .collect::<Vec<_>>();

        Ok(ActionResult::success(json!({
            "action_type": spec.action_type,
            "content": content,
            "code_blocks": code,
        }))
        .with_artifacts(artifacts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGateway;
    use conclave_domain::prompt::EXECUTE_TASK;

    fn ctx(gateway: Arc<ScriptedGateway>, kind: AgentKind) -> SpecialistContext {
        SpecialistContext::new(AgentProfile::for_kind(kind), "system", gateway, None)
    }

    #[tokio::test]
    async fn test_execute_task_collects_code_blocks() {
        let gateway = Arc::new(ScriptedGateway::new([
            "Here is the endpoint:\n```rust\nfn users() {}\n```",
        ]));
        let specialist = PromptSpecialist::new(AgentKind::Backend);
        let action = Action::new(EXECUTE_TASK, "Design an api for users");

        let result = specialist
            .act(&ctx(gateway.clone(), AgentKind::Backend), &action)
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.artifacts, vec!["execute_task-1.rust"]);
        assert_eq!(result.output["code_blocks"][0]["code"], "fn users() {}");
        assert_eq!(gateway.calls()[0].1.temperature, 0.4);
    }

    #[tokio::test]
    async fn test_unknown_action_fails_without_generation() {
        let gateway = Arc::new(ScriptedGateway::new(Vec::<String>::new()));
        let specialist = PromptSpecialist::new(AgentKind::Frontend);
        let action = Action::new("design_api", "nope");

        let result = specialist
            .act(&ctx(gateway.clone(), AgentKind::Frontend), &action)
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Unknown action type: design_api"));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_gateway_failure_is_an_error() {
        let gateway = Arc::new(ScriptedGateway::failing());
        let specialist = PromptSpecialist::new(AgentKind::Testing);
        let action = Action::new("generate_unit_tests", "cover the parser");

        let result = specialist
            .act(&ctx(gateway, AgentKind::Testing), &action)
            .await;
        assert!(matches!(result, Err(AgentError::Gateway(_))));
    }
}
