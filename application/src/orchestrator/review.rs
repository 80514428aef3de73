//! Peer review, conflict resolution and task completion

use super::{Orchestrator, OrchestratorError, PendingReview, lock};
use crate::agent::Agent;
use crate::ports::conversation_logger::ConversationEvent;
use conclave_domain::core::id::generate_short_id;
use conclave_domain::prompt::PromptTemplate;
use conclave_domain::{
    AgentMessage, AgentState, ConsensusBuilder, ConsensusResult, MessageContent, MessageType,
    ORCHESTRATOR, Recipient, ReviewRequest, TaskRef, TaskResult, TaskStatus, Vote, VoteType,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Longest reasoning kept on a conflict vote, in characters
const MAX_CONFLICT_REASONING: usize = 200;

impl Orchestrator {
    /// Open a review of `change` by `author`.
    ///
    /// Reviewers are selected automatically when `reviewers` is `None`. Each
    /// registered reviewer receives a Review message; the returned builder
    /// requires `review_required_approvals` and honors the security veto.
    pub fn coordinate_review(
        &self,
        change_id: &str,
        change: &str,
        author: &str,
        reviewers: Option<Vec<String>>,
    ) -> ConsensusBuilder {
        let reviewers = self.resolve_reviewers(author, reviewers);
        let (builder, _) = self.open_review(
            change_id,
            change,
            author,
            &reviewers,
            self.config.review_required_approvals,
        );
        builder
    }

    fn resolve_reviewers(&self, author: &str, names: Option<Vec<String>>) -> Vec<Arc<Agent>> {
        match names {
            Some(names) => names
                .iter()
                .filter_map(|name| {
                    let agent = self.agent(name);
                    if agent.is_none() {
                        warn!("Reviewer {} is not registered", name);
                    }
                    agent
                })
                .collect(),
            None => self.select_reviewers(author, self.config.reviewer_count),
        }
    }

    fn open_review(
        &self,
        change_id: &str,
        change: &str,
        author: &str,
        reviewers: &[Arc<Agent>],
        required_approvals: usize,
    ) -> (ConsensusBuilder, ReviewRequest) {
        let request = ReviewRequest::new(change_id, change, author)
            .with_reviewers_needed(required_approvals);
        let builder = ConsensusBuilder::new(change_id, change, required_approvals, true);

        for reviewer in reviewers {
            let message = AgentMessage::new(
                ORCHESTRATOR,
                Recipient::agent(reviewer.name()),
                MessageType::Review,
                MessageContent::ReviewRequest(request.clone()),
                1.0,
            );
            self.logger.log(ConversationEvent::message_routed(&message));
            reviewer.receive_message(message);
        }

        info!(
            "Review {} opened by {} with reviewers {:?}",
            change_id,
            author,
            reviewers.iter().map(|r| r.name()).collect::<Vec<_>>()
        );
        (builder, request)
    }

    /// Ask each party of a disagreement to reconsider and vote.
    ///
    /// A party approves the compromise when its confidence exceeds
    /// `conflict_approval_threshold`. Every listed agent must approve.
    /// Returns the final decision text.
    pub async fn handle_conflict(
        &self,
        agents: &[String],
        topic: &str,
        positions: &[(String, String)],
    ) -> String {
        let decision_id = format!("conflict-{}", generate_short_id());
        let mut builder = ConsensusBuilder::new(&decision_id, topic, agents.len(), true);

        for name in agents {
            let Some(agent) = self.agent(name) else {
                warn!("Conflict party {} is not registered", name);
                continue;
            };
            let own = positions
                .iter()
                .find(|(party, _)| party == name)
                .map(|(_, position)| position.as_str())
                .unwrap_or("");
            let others: Vec<(String, String)> = positions
                .iter()
                .filter(|(party, _)| party != name)
                .cloned()
                .collect();

            let thought = agent
                .think(&PromptTemplate::conflict(topic, own, &others))
                .await;
            let vote_type = if thought.confidence > self.config.conflict_approval_threshold {
                VoteType::Approve
            } else {
                VoteType::Reject
            };
            let reasoning: String = thought.content.chars().take(MAX_CONFLICT_REASONING).collect();
            builder.add_vote(
                Vote::new(name.as_str(), vote_type, reasoning)
                    .with_confidence(thought.confidence)
                    .with_voter_kind(agent.kind()),
            );
        }

        let result = builder.get_result();
        info!("Conflict on {:?} resolved: {}", topic, result.final_decision);
        self.log_event(
            "conflict_resolved",
            json!({
                "decision_id": decision_id,
                "topic": topic,
                "agents": agents,
                "approved": result.approved,
                "final_decision": result.final_decision,
            }),
        );
        result.final_decision
    }

    /// Record the result of an executed task.
    ///
    /// With `review_completed_tasks`, a successful result puts the task
    /// under review and parks its author in Waiting until the verdict.
    /// Otherwise the task becomes Completed or Failed.
    pub fn complete_task(&self, task: &TaskRef, result: TaskResult) -> Result<(), OrchestratorError> {
        let snapshot = self
            .task(task)
            .ok_or_else(|| OrchestratorError::TaskNotFound(task.to_string()))?;
        let author = snapshot
            .assigned_agent
            .clone()
            .unwrap_or_else(|| "unknown".to_string());

        if self.config.review_completed_tasks && result.success {
            let reviewers = self.select_reviewers(&author, self.config.reviewer_count);
            if reviewers.is_empty() {
                debug!("No reviewers for {}, completing directly", task);
            } else {
                return self.review_task(task, &snapshot.description, &author, result, &reviewers);
            }
        }

        let success = result.success;
        let artifacts = result.artifacts.clone();
        self.update_project(&task.project_id, |project| {
            project.require_task_mut(&task.task_id)?.finish(result)?;
            for artifact in artifacts {
                project.add_artifact(artifact);
            }
            Ok::<_, OrchestratorError>(())
        })
        .ok_or_else(|| OrchestratorError::ProjectNotFound(task.project_id.clone()))??;

        info!(
            "Task {} {} by {}",
            task,
            if success { "completed" } else { "failed" },
            author
        );
        self.log_event(
            "task_completed",
            json!({
                "project_id": task.project_id,
                "task_id": task.task_id,
                "agent": author,
                "success": success,
            }),
        );
        Ok(())
    }

    fn review_task(
        &self,
        task: &TaskRef,
        description: &str,
        author: &str,
        result: TaskResult,
        reviewers: &[Arc<Agent>],
    ) -> Result<(), OrchestratorError> {
        let change_id = format!("review-{}", task.task_id);
        let change = format!("{}\n\nResult:\n{}", description, result.summary());

        self.update_project(&task.project_id, |project| {
            let slot = project.require_task_mut(&task.task_id)?;
            slot.transition_to(TaskStatus::Review)?;
            slot.result = Some(result);
            Ok::<_, OrchestratorError>(())
        })
        .ok_or_else(|| OrchestratorError::ProjectNotFound(task.project_id.clone()))??;

        if let Some(agent) = self.agent(author) {
            agent.set_state(AgentState::Waiting);
        }

        // weighted approvals can never exceed the number of reviewers
        let required = self
            .config
            .review_required_approvals
            .min(reviewers.len())
            .max(1);
        let (builder, request) = self.open_review(&change_id, &change, author, reviewers, required);
        lock(&self.reviews).insert(
            change_id.clone(),
            PendingReview {
                task: task.clone(),
                author: Some(author.to_string()),
                builder,
            },
        );

        for reviewer in reviewers {
            let reviewer = Arc::clone(reviewer);
            let request = request.clone();
            let tx = self.message_tx.clone();
            tokio::spawn(async move {
                let vote = reviewer.review(&request).await;
                let message_type = if vote.vote_type == VoteType::Approve {
                    MessageType::Approval
                } else {
                    MessageType::Rejection
                };
                let confidence = vote.confidence;
                let message = reviewer.send_message(
                    Recipient::orchestrator(),
                    MessageContent::Vote {
                        change_id: request.change_id.clone(),
                        vote,
                    },
                    message_type,
                    confidence,
                );
                if tx.send(message).is_err() {
                    debug!("Orchestrator gone, dropping vote on {}", request.change_id);
                }
            });
        }
        Ok(())
    }

    /// Add a vote to an open task review.
    ///
    /// Returns the outcome once the review is complete: the task becomes
    /// Completed when approved, Failed otherwise, and its author returns to
    /// Idle.
    pub fn record_review_vote(&self, change_id: &str, vote: Vote) -> Option<ConsensusResult> {
        let pending = {
            let mut reviews = lock(&self.reviews);
            let Some(pending) = reviews.get_mut(change_id) else {
                warn!("Vote from {} on unknown review {}", vote.voter, change_id);
                return None;
            };
            pending.builder.add_vote(vote);
            if !pending.builder.is_complete() {
                return None;
            }
            reviews.remove(change_id)?
        };

        let result = pending.builder.get_result();
        let task = &pending.task;
        let outcome = self.update_project(&task.project_id, |project| {
            let slot = project.require_task_mut(&task.task_id)?;
            if result.approved {
                slot.transition_to(TaskStatus::Completed)?;
            } else {
                slot.transition_to(TaskStatus::Failed)?;
                let mut failed = slot
                    .result
                    .take()
                    .unwrap_or_else(|| TaskResult::failure(&task.task_id, ""));
                failed.success = false;
                failed.error = Some(result.final_decision.clone());
                slot.result = Some(failed);
            }
            Ok::<_, OrchestratorError>(())
        });
        match outcome {
            Some(Ok(())) => {}
            Some(Err(e)) => warn!("Cannot apply review {} to {}: {}", change_id, task, e),
            None => warn!("Project of reviewed task {} is gone", task),
        }

        if let Some(agent) = pending.author.as_deref().and_then(|name| self.agent(name)) {
            agent.set_state(AgentState::Idle);
        }

        info!("Review {} finished: {}", change_id, result.final_decision);
        self.log_event(
            "review_completed",
            json!({
                "change_id": change_id,
                "task_id": task.task_id,
                "approved": result.approved,
                "final_decision": result.final_decision,
                "dissenting_opinions": result.dissenting_opinions,
            }),
        );
        Some(result)
    }

    /// Reviews waiting for votes
    pub fn open_reviews(&self) -> Vec<String> {
        lock(&self.reviews).keys().cloned().collect()
    }
}
