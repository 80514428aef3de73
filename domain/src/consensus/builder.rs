//! Weighted consensus with security veto
//!
//! # Rules
//!
//! | Situation | Outcome |
//! |-----------|---------|
//! | A Reject from a security-oversight voter with at least one concern, veto allowed | Vetoed permanently, `approved = false` |
//! | Σ Approve confidence ≥ required **and** > Σ Reject confidence | Approved |
//! | Otherwise | Rejected |
//!
//! Abstain votes carry no weight. RequestChanges votes carry no weight but
//! contribute their concerns as conditions.

use super::vote::{Vote, VoteType};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Outcome of a consensus-building process
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsensusResult {
    pub decision_id: String,
    pub approved: bool,
    pub votes: Vec<Vote>,
    /// "Approved", "Rejected" or the veto reason
    pub final_decision: String,
    pub dissenting_opinions: Vec<String>,
    /// Concerns attached to RequestChanges votes
    pub conditions: Vec<String>,
}

/// Collects votes for one decision and computes the weighted outcome
///
/// # Example
///
/// ```
/// use conclave_domain::consensus::{ConsensusBuilder, Vote};
///
/// let mut builder = ConsensusBuilder::new("d1", "Adopt the schema", 2, true);
/// builder.add_vote(Vote::approve("a", "ok").with_confidence(0.9));
/// builder.add_vote(Vote::approve("b", "ok").with_confidence(0.8));
/// builder.add_vote(Vote::approve("c", "ok").with_confidence(0.7));
///
/// let result = builder.get_result();
/// assert!(result.approved);
/// assert_eq!(result.final_decision, "Approved");
/// ```
#[derive(Debug, Clone)]
pub struct ConsensusBuilder {
    decision_id: String,
    topic: String,
    required_approvals: usize,
    allow_veto: bool,
    votes: Vec<Vote>,
    veto_reason: Option<String>,
}

impl ConsensusBuilder {
    pub fn new(
        decision_id: impl Into<String>,
        topic: impl Into<String>,
        required_approvals: usize,
        allow_veto: bool,
    ) -> Self {
        Self {
            decision_id: decision_id.into(),
            topic: topic.into(),
            required_approvals,
            allow_veto,
            votes: Vec::new(),
            veto_reason: None,
        }
    }

    pub fn decision_id(&self) -> &str {
        &self.decision_id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn required_approvals(&self) -> usize {
        self.required_approvals
    }

    /// Record a vote. A second vote from the same voter is ignored.
    ///
    /// Returns `true` if the vote was recorded.
    pub fn add_vote(&mut self, vote: Vote) -> bool {
        if self.has_voted(&vote.voter) {
            warn!(
                voter = %vote.voter,
                decision = %self.decision_id,
                "Duplicate vote ignored"
            );
            return false;
        }

        if self.allow_veto && self.veto_reason.is_none() && vote.can_veto() {
            // can_veto guarantees a first concern
            let concern = vote.concerns.first().cloned().unwrap_or_default();
            let reason = format!("Security veto: {}", concern);
            warn!(voter = %vote.voter, reason = %reason, "Decision vetoed");
            self.veto_reason = Some(reason);
        }

        info!(
            decision = %self.decision_id,
            voter = %vote.voter,
            vote = %vote.vote_type,
            confidence = vote.confidence,
            "Vote recorded"
        );
        self.votes.push(vote);
        true
    }

    pub fn has_voted(&self, voter: &str) -> bool {
        self.votes.iter().any(|v| v.voter == voter)
    }

    pub fn votes(&self) -> &[Vote] {
        &self.votes
    }

    pub fn is_vetoed(&self) -> bool {
        self.veto_reason.is_some()
    }

    /// Sum of Approve confidences
    pub fn approval_weight(&self) -> f64 {
        self.weight_of(VoteType::Approve)
    }

    /// Sum of Reject confidences
    pub fn rejection_weight(&self) -> f64 {
        self.weight_of(VoteType::Reject)
    }

    fn weight_of(&self, vote_type: VoteType) -> f64 {
        self.votes
            .iter()
            .filter(|v| v.vote_type == vote_type)
            .map(|v| v.confidence)
            .sum()
    }

    /// Compute the outcome from the votes collected so far
    pub fn get_result(&self) -> ConsensusResult {
        if let Some(reason) = &self.veto_reason {
            let mut dissent = vec![reason.clone()];
            dissent.extend(
                self.votes
                    .iter()
                    .filter(|v| v.vote_type.is_dissent())
                    .map(|v| v.reasoning.clone()),
            );
            return ConsensusResult {
                decision_id: self.decision_id.clone(),
                approved: false,
                votes: self.votes.clone(),
                final_decision: reason.clone(),
                dissenting_opinions: dissent,
                conditions: Vec::new(),
            };
        }

        let approvals = self.approval_weight();
        let rejections = self.rejection_weight();
        let approved = approvals >= self.required_approvals as f64 && approvals > rejections;

        let conditions = self
            .votes
            .iter()
            .filter(|v| v.vote_type == VoteType::RequestChanges)
            .flat_map(|v| v.concerns.iter().cloned())
            .collect();

        ConsensusResult {
            decision_id: self.decision_id.clone(),
            approved,
            votes: self.votes.clone(),
            final_decision: if approved { "Approved" } else { "Rejected" }.to_string(),
            dissenting_opinions: self
                .votes
                .iter()
                .filter(|v| v.vote_type == VoteType::Reject)
                .map(|v| v.reasoning.clone())
                .collect(),
            conditions,
        }
    }

    /// Vetoed, or at least `required_approvals` distinct voters have voted
    pub fn is_complete(&self) -> bool {
        self.is_vetoed() || self.votes.len() >= self.required_approvals
    }

    /// Votes still needed before the decision is complete
    pub fn pending_count(&self) -> usize {
        self.required_approvals.saturating_sub(self.votes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::kind::AgentKind;

    #[test]
    fn test_threshold_approval_without_veto() {
        let mut builder = ConsensusBuilder::new("d", "t", 2, true);
        builder.add_vote(Vote::approve("a", "").with_confidence(0.9));
        builder.add_vote(Vote::approve("b", "").with_confidence(0.8));
        builder.add_vote(Vote::approve("c", "").with_confidence(0.7));

        let result = builder.get_result();
        assert!(result.approved);
        assert_eq!(result.final_decision, "Approved");
        assert!((builder.approval_weight() - 2.4).abs() < 1e-9);
    }

    #[test]
    fn test_insufficient_weight_rejected() {
        let mut builder = ConsensusBuilder::new("d", "t", 2, true);
        builder.add_vote(Vote::approve("a", "").with_confidence(0.9));
        builder.add_vote(Vote::approve("b", "").with_confidence(0.8));

        let result = builder.get_result();
        assert!(!result.approved);
        assert_eq!(result.final_decision, "Rejected");
        // two distinct voters reached the required count
        assert!(builder.is_complete());
    }

    #[test]
    fn test_rejection_weight_must_be_exceeded() {
        let mut builder = ConsensusBuilder::new("d", "t", 1, false);
        builder.add_vote(Vote::approve("a", "").with_confidence(1.0));
        builder.add_vote(Vote::reject("b", "bad").with_confidence(1.0));

        let result = builder.get_result();
        assert!(!result.approved);
        assert_eq!(result.dissenting_opinions, vec!["bad".to_string()]);
    }

    #[test]
    fn test_security_veto_is_permanent() {
        let mut builder = ConsensusBuilder::new("d", "t", 2, true);
        builder.add_vote(
            Vote::reject("security_agent", "unsafe").with_concerns(["SQL injection"]),
        );
        for voter in ["a", "b", "c"] {
            builder.add_vote(Vote::approve(voter, "fine").with_confidence(1.0));
        }

        let result = builder.get_result();
        assert!(!result.approved);
        assert_eq!(result.final_decision, "Security veto: SQL injection");
        assert_eq!(result.dissenting_opinions[0], "Security veto: SQL injection");
        assert_eq!(result.dissenting_opinions[1], "unsafe");
        assert!(builder.is_complete());
    }

    #[test]
    fn test_veto_by_kind_without_security_in_name() {
        let mut builder = ConsensusBuilder::new("d", "t", 2, true);
        builder.add_vote(
            Vote::reject("auditor", "no")
                .with_voter_kind(AgentKind::Security)
                .with_concerns(["Hardcoded key"]),
        );
        assert!(builder.is_vetoed());
    }

    #[test]
    fn test_veto_disabled() {
        let mut builder = ConsensusBuilder::new("d", "t", 1, false);
        builder.add_vote(Vote::reject("security_agent", "no").with_concerns(["x"]));
        assert!(!builder.is_vetoed());
        assert_eq!(builder.get_result().final_decision, "Rejected");
    }

    #[test]
    fn test_reject_without_concern_is_not_a_veto() {
        let mut builder = ConsensusBuilder::new("d", "t", 2, true);
        builder.add_vote(Vote::reject("security_agent", "meh"));
        assert!(!builder.is_vetoed());
        assert!(!builder.is_complete());
        assert_eq!(builder.pending_count(), 1);
    }

    #[test]
    fn test_duplicate_vote_keeps_first() {
        let mut builder = ConsensusBuilder::new("d", "t", 1, true);
        assert!(builder.add_vote(Vote::approve("a", "first").with_confidence(1.0)));
        assert!(!builder.add_vote(Vote::reject("a", "second")));

        assert_eq!(builder.votes().len(), 1);
        let result = builder.get_result();
        assert!(result.approved);
        assert_eq!(result.votes[0].reasoning, "first");
    }

    #[test]
    fn test_request_changes_become_conditions() {
        let mut builder = ConsensusBuilder::new("d", "t", 1, true);
        builder.add_vote(Vote::approve("a", "").with_confidence(1.0));
        builder.add_vote(
            Vote::request_changes("b", "tweak").with_concerns(["Add an index", "Rename column"]),
        );

        let result = builder.get_result();
        assert!(result.approved);
        assert_eq!(result.conditions, vec!["Add an index", "Rename column"]);
        assert!(result.dissenting_opinions.is_empty());
    }

    #[test]
    fn test_pending_count_saturates() {
        let mut builder = ConsensusBuilder::new("d", "t", 1, true);
        builder.add_vote(Vote::abstain("a", ""));
        builder.add_vote(Vote::abstain("b", ""));
        assert_eq!(builder.pending_count(), 0);
    }
}
