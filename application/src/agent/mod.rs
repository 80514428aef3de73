//! Agent runtime
//!
//! An [`Agent`] drives one think → act → reflect loop around a
//! [`Specialist`]. It owns its lifecycle state, memory and inbox; the
//! orchestrator refers to it by name and shares it as `Arc<Agent>`.
//!
//! ```text
//!          think()                 act()
//!   Idle ──────────▶ Thinking   Idle ──▶ Acting ──ok──▶ Idle
//!    ▲                  │                   │
//!    └──────────────────┘                   └─fail─▶ Error ──▶ Idle
//!
//!   Idle ──review opened──▶ Waiting ──verdict──▶ Idle
//! ```
//!
//! State, memory and inbox sit behind short `std::sync::Mutex` sections
//! that are never held across an `.await`.

pub mod research;
pub mod security;
pub mod specialist;

pub use research::ResearchSpecialist;
pub use security::SecuritySpecialist;
pub use specialist::{PromptSpecialist, Specialist, SpecialistContext};

use crate::config::AgentConfig;
use crate::ports::knowledge::{KnowledgeError, KnowledgeRetriever};
use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use conclave_domain::agent::{extract_confidence, extract_pattern, parse_thought};
use conclave_domain::consensus::parsing::MAX_CONCERNS;
use conclave_domain::consensus::{extract_bullets, parse_review_response};
use conclave_domain::core::string::truncate;
use conclave_domain::prompt::AgentPromptTemplate;
use conclave_domain::{
    Action, ActionResult, AgentKind, AgentMemory, AgentMessage, AgentProfile, AgentState,
    ChatMessage, CompletionOptions, Insight, MessageContent, MessageType, Recipient,
    ReviewRequest, Thought, Vote,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while an agent acts
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Knowledge error: {0}")]
    Knowledge(#[from] KnowledgeError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Temperature of generic peer reviews
const REVIEW_TEMPERATURE: f64 = 0.3;

/// Longest reasoning kept on a review vote, in characters
const MAX_REVIEW_REASONING: usize = 500;

/// A registered worker: profile, specialist, state, memory and inbox.
pub struct Agent {
    profile: AgentProfile,
    specialist: Arc<dyn Specialist>,
    gateway: Arc<dyn LlmGateway>,
    config: AgentConfig,
    state: Mutex<AgentState>,
    memory: Mutex<AgentMemory>,
    inbox: Mutex<VecDeque<AgentMessage>>,
    last_error: Mutex<Option<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Agent {
    pub fn new(
        profile: AgentProfile,
        specialist: Arc<dyn Specialist>,
        gateway: Arc<dyn LlmGateway>,
        config: AgentConfig,
    ) -> Self {
        let memory = AgentMemory::with_capacity(profile.name.clone(), config.max_short_term);
        info!(
            "Agent {} initialized ({}), capabilities: {:?}",
            profile.name, profile.role, profile.capabilities
        );
        Self {
            profile,
            specialist,
            gateway,
            config,
            state: Mutex::new(AgentState::Idle),
            memory: Mutex::new(memory),
            inbox: Mutex::new(VecDeque::new()),
            last_error: Mutex::new(None),
        }
    }

    /// Agent with the kind's default profile and specialist
    pub fn for_kind(
        kind: AgentKind,
        gateway: Arc<dyn LlmGateway>,
        knowledge: Arc<dyn KnowledgeRetriever>,
        config: AgentConfig,
    ) -> Self {
        Self::with_profile(AgentProfile::for_kind(kind), gateway, knowledge, config)
    }

    /// Agent with a custom profile and the specialist of its kind
    pub fn with_profile(
        profile: AgentProfile,
        gateway: Arc<dyn LlmGateway>,
        knowledge: Arc<dyn KnowledgeRetriever>,
        config: AgentConfig,
    ) -> Self {
        let specialist: Arc<dyn Specialist> = match profile.kind {
            AgentKind::Research => Arc::new(ResearchSpecialist::new(knowledge)),
            AgentKind::Security => Arc::new(SecuritySpecialist::new()),
            kind => Arc::new(PromptSpecialist::new(kind)),
        };
        Self::new(profile, specialist, gateway, config)
    }

    // ==================== Accessors ====================

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn kind(&self) -> AgentKind {
        self.profile.kind
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn state(&self) -> AgentState {
        *lock(&self.state)
    }

    pub fn last_error(&self) -> Option<String> {
        lock(&self.last_error).clone()
    }

    /// Run `f` with the agent's memory locked
    pub fn with_memory<R>(&self, f: impl FnOnce(&mut AgentMemory) -> R) -> R {
        f(&mut lock(&self.memory))
    }

    /// System prompt with the current memory summary
    pub fn system_prompt(&self) -> String {
        let summary = lock(&self.memory).context_summary();
        AgentPromptTemplate::system(&self.profile, &summary)
    }

    /// Move to `next` if the state machine allows it.
    ///
    /// Illegal transitions are logged and leave the state unchanged.
    pub fn set_state(&self, next: AgentState) -> bool {
        let mut state = lock(&self.state);
        if !state.can_transition_to(next) {
            warn!(
                "{}: illegal state transition {} -> {}",
                self.profile.name, *state, next
            );
            return false;
        }
        debug!("{}: {} -> {}", self.profile.name, *state, next);
        *state = next;
        true
    }

    fn options(&self, temperature: f64) -> CompletionOptions {
        let options = CompletionOptions::with_temperature(temperature);
        match &self.config.model {
            Some(model) => options.with_model(model.clone()),
            None => options,
        }
    }

    fn specialist_context(&self) -> SpecialistContext {
        SpecialistContext::new(
            self.profile.clone(),
            self.system_prompt(),
            Arc::clone(&self.gateway),
            self.config.model.clone(),
        )
    }

    // ==================== Think / Act / Reflect ====================

    /// Analyze `prompt` and plan an approach.
    ///
    /// The request carries the system prompt, the recent conversation window
    /// and the think prompt. A failed generation yields
    /// [`Thought::fallback`].
    pub async fn think(&self, prompt: &str) -> Thought {
        self.set_state(AgentState::Thinking);
        info!("{} thinking: {}", self.profile.name, truncate(prompt, 100));

        let user = ChatMessage::user(AgentPromptTemplate::think(prompt));
        let mut messages = vec![ChatMessage::system(self.system_prompt())];
        messages.extend(lock(&self.memory).recent_messages(self.config.recent_window));
        messages.push(user.clone());

        let thought = match self
            .gateway
            .complete(&messages, &self.options(self.config.think_temperature))
            .await
        {
            Ok(content) => {
                let mut memory = lock(&self.memory);
                memory.add_message(user);
                memory.add_message(ChatMessage::assistant(content.clone()));
                parse_thought(&content)
            }
            Err(e) => {
                warn!("{}: think failed, using fallback: {}", self.profile.name, e);
                Thought::fallback(format!("Unable to analyze: {}", e))
            }
        };

        lock(&self.memory).add_thought(thought.clone());
        self.set_state(AgentState::Idle);
        thought
    }

    /// Execute `action` through the specialist.
    ///
    /// A failure passes through [`AgentState::Error`], is recorded as the
    /// last error and leaves the agent Idle.
    pub async fn act(&self, action: Action) -> ActionResult {
        self.set_state(AgentState::Acting);
        info!(
            "{} acting: {} ({})",
            self.profile.name, action.action_type, action.risk_level
        );

        let started = Instant::now();
        let ctx = self.specialist_context();
        let result = match self.specialist.act(&ctx, &action).await {
            Ok(result) => result,
            Err(e) => ActionResult::failure(e.to_string()),
        };
        let result = result.with_duration_ms(started.elapsed().as_millis() as u64);

        if result.success {
            *lock(&self.last_error) = None;
        } else {
            let error = result
                .error
                .clone()
                .unwrap_or_else(|| "action failed".to_string());
            warn!("{}: {} failed: {}", self.profile.name, action.action_type, error);
            self.set_state(AgentState::Error);
            *lock(&self.last_error) = Some(error);
        }
        self.set_state(AgentState::Idle);
        result
    }

    /// Draw a lesson from `result`.
    ///
    /// A failed result always asks for a knowledge update. Without generated
    /// text the lesson is a summary of the result.
    pub async fn reflect(&self, result: &ActionResult) -> Insight {
        let messages = [
            ChatMessage::system(self.system_prompt()),
            ChatMessage::user(AgentPromptTemplate::reflect(result)),
        ];

        let insight = match self
            .gateway
            .complete(&messages, &self.options(self.config.reflect_temperature))
            .await
        {
            Ok(content) => Insight {
                should_update_knowledge: !result.success
                    || content.to_lowercase().contains("pattern"),
                pattern_identified: extract_pattern(&content),
                lesson: content,
                improvement_suggestion: None,
            },
            Err(e) => {
                warn!("{}: reflect failed: {}", self.profile.name, e);
                let lesson = match &result.error {
                    Some(error) if !result.success => format!("Action failed: {}", error),
                    _ if !result.success => "Action failed".to_string(),
                    _ => format!("Action succeeded in {}ms", result.duration_ms),
                };
                Insight {
                    lesson,
                    should_update_knowledge: !result.success,
                    pattern_identified: None,
                    improvement_suggestion: None,
                }
            }
        };

        lock(&self.memory).add_insight(insight.clone());
        insight
    }

    /// Escalation addressed to the orchestrator, with the memory summary
    pub fn escalate(&self, reason: impl Into<String>) -> AgentMessage {
        let reason = reason.into();
        warn!("{} escalating: {}", self.profile.name, reason);
        let context = lock(&self.memory).context_summary();
        AgentMessage::new(
            self.profile.name.clone(),
            Recipient::orchestrator(),
            MessageType::Escalation,
            MessageContent::Escalation { reason, context },
            0.0,
        )
    }

    /// Peer-review a change.
    ///
    /// Specialists may supply their own verdict (security does); otherwise
    /// the answer is read for APPROVE / REJECT and "-" bullet concerns. A
    /// failed generation abstains.
    pub async fn review(&self, request: &ReviewRequest) -> Vote {
        let ctx = self.specialist_context();
        if let Some(vote) = self.specialist.review(&ctx, request).await {
            return vote;
        }

        let messages = [
            ChatMessage::system(ctx.system_prompt),
            ChatMessage::user(AgentPromptTemplate::review(request)),
        ];
        let vote = match self
            .gateway
            .complete(&messages, &self.options(REVIEW_TEMPERATURE))
            .await
        {
            Ok(text) => {
                let (approved, feedback) = parse_review_response(&text);
                let concerns = extract_bullets(&feedback, MAX_CONCERNS);
                let reasoning: String = feedback.chars().take(MAX_REVIEW_REASONING).collect();
                let confidence = extract_confidence(&feedback);
                if approved {
                    Vote::approve(self.name(), reasoning).with_confidence(confidence)
                } else {
                    Vote::reject(self.name(), reasoning)
                        .with_confidence(confidence)
                        .with_concerns(concerns)
                }
            }
            Err(e) => {
                warn!("{}: review of {} failed: {}", self.profile.name, request.change_id, e);
                Vote::abstain(self.name(), format!("Review unavailable: {}", e)).with_confidence(0.0)
            }
        };
        vote.with_voter_kind(self.profile.kind)
    }

    // ==================== Messaging ====================

    /// Enqueue a message; nothing is processed here
    pub fn receive_message(&self, message: AgentMessage) {
        info!(
            "{} received {} from {}",
            self.profile.name, message.message_type, message.sender
        );
        lock(&self.inbox).push_back(message);
    }

    /// Build a message from this agent; delivery is the orchestrator's job
    pub fn send_message(
        &self,
        receiver: impl Into<Recipient>,
        content: impl Into<MessageContent>,
        message_type: MessageType,
        confidence: f64,
    ) -> AgentMessage {
        let message = AgentMessage::new(
            self.profile.name.clone(),
            receiver,
            message_type,
            content,
            confidence,
        );
        info!(
            "{} sending {} to {}",
            self.profile.name, message.message_type, message.receiver
        );
        message
    }

    /// Drain the inbox, oldest first
    pub fn take_messages(&self) -> Vec<AgentMessage> {
        lock(&self.inbox).drain(..).collect()
    }

    pub fn pending_messages(&self) -> usize {
        lock(&self.inbox).len()
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.profile.name)
            .field("kind", &self.profile.kind)
            .field("state", &self.state())
            .finish()
    }
}
