//! Security specialist: code scanning, dependency audits and veto-capable
//! review.

use super::AgentError;
use super::specialist::{PromptSpecialist, Specialist, SpecialistContext};
use async_trait::async_trait;
use conclave_domain::consensus::parse_security_review;
use conclave_domain::core::id::generate_short_id;
use conclave_domain::prompt::{AgentPromptTemplate, EXECUTE_TASK, SecurityPromptTemplate};
use conclave_domain::security::{
    SecurityReport, parse_dependency_findings, parse_model_findings, scan_patterns,
};
use conclave_domain::{Action, ActionResult, AgentKind, ReviewRequest, Vote};
use serde_json::{Value, json};
use std::time::Instant;
use tracing::{info, warn};

/// Temperature of review and audit calls
const REVIEW_TEMPERATURE: f64 = 0.2;

/// Longest reasoning kept on a security vote, in characters
const MAX_REASONING_CHARS: usize = 500;

/// Specialist answering `scan_code`, `review_change` and
/// `audit_dependencies`. Its reviews carry the security veto.
pub struct SecuritySpecialist {
    fallback: PromptSpecialist,
}

impl SecuritySpecialist {
    pub fn new() -> Self {
        Self {
            fallback: PromptSpecialist::new(AgentKind::Security),
        }
    }

    async fn scan_code(
        &self,
        ctx: &SpecialistContext,
        code: &str,
        filename: &str,
        language: &str,
    ) -> SecurityReport {
        let started = Instant::now();
        let scan_id = generate_short_id();
        info!("Security scan {} started for {}", scan_id, filename);

        let mut findings = scan_patterns(&scan_id, code, filename);

        let prompt = SecurityPromptTemplate::analyze_code(code, filename, language);
        match ctx.generate(&prompt, 0.3).await {
            Ok(analysis) => findings.extend(parse_model_findings(&analysis, filename)),
            Err(e) => warn!("Model analysis skipped for {}: {}", filename, e),
        }

        let report = SecurityReport::from_findings(
            scan_id,
            filename,
            findings,
            started.elapsed().as_millis() as u64,
        );
        info!(
            "Security scan {} completed: {} findings, passed={}, risk={:.1}",
            report.scan_id,
            report.findings.len(),
            report.passed,
            report.risk_score
        );
        report
    }

    /// Security verdict on a change.
    ///
    /// Risk vocabulary in the answer means Reject at 0.95 with the bulleted
    /// concerns; otherwise Approve at 0.8.
    pub async fn security_vote(
        &self,
        ctx: &SpecialistContext,
        request: &ReviewRequest,
    ) -> Result<Vote, AgentError> {
        let system = AgentPromptTemplate::security_review_system(&ctx.system_prompt);
        let text = ctx
            .generate_with_system(
                &system,
                &AgentPromptTemplate::security_review(request),
                REVIEW_TEMPERATURE,
            )
            .await?;

        let (rejected, concerns) = parse_security_review(&text);
        let reasoning: String = text.chars().take(MAX_REASONING_CHARS).collect();
        let vote = if rejected {
            warn!(
                "Security veto candidate on {}: {:?}",
                request.change_id,
                concerns.iter().take(3).collect::<Vec<_>>()
            );
            Vote::reject(&ctx.profile.name, reasoning)
                .with_confidence(0.95)
                .with_concerns(concerns)
        } else {
            Vote::approve(&ctx.profile.name, reasoning).with_confidence(0.8)
        };
        Ok(vote.with_voter_kind(ctx.profile.kind))
    }

    async fn audit_dependencies(
        &self,
        ctx: &SpecialistContext,
        dependencies: &[(String, String)],
    ) -> Result<Value, AgentError> {
        let text = ctx
            .generate_with_system(
                SecurityPromptTemplate::audit_system(),
                &SecurityPromptTemplate::audit_dependencies(dependencies),
                REVIEW_TEMPERATURE,
            )
            .await?;
        let findings = parse_dependency_findings(&text);
        Ok(json!({ "findings": findings }))
    }
}

impl Default for SecuritySpecialist {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Specialist for SecuritySpecialist {
    async fn act(
        &self,
        ctx: &SpecialistContext,
        action: &Action,
    ) -> Result<ActionResult, AgentError> {
        let output = match action.action_type.as_str() {
            "scan_code" => {
                let report = self
                    .scan_code(
                        ctx,
                        action.str_param("code", ""),
                        action.str_param("filename", "unknown"),
                        action.str_param("language", "python"),
                    )
                    .await;
                serde_json::to_value(report)?
            }
            "review_change" => {
                let request = ReviewRequest::new(
                    action.str_param("change_id", "adhoc"),
                    action.str_param("context", &action.description),
                    action.str_param("author", "unknown"),
                )
                .with_diff(action.str_param("diff", ""));
                serde_json::to_value(self.security_vote(ctx, &request).await?)?
            }
            "audit_dependencies" => {
                let dependencies = action
                    .parameters
                    .get("dependencies")
                    .and_then(Value::as_object)
                    .map(|deps| {
                        deps.iter()
                            .map(|(pkg, ver)| {
                                let ver = ver.as_str().map(str::to_string).unwrap_or_else(|| ver.to_string());
                                (pkg.clone(), ver)
                            })
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();
                self.audit_dependencies(ctx, &dependencies).await?
            }
            EXECUTE_TASK => return self.fallback.act(ctx, action).await,
            other => {
                return Ok(ActionResult::failure(format!(
                    "Unknown action type: {}",
                    other
                )));
            }
        };
        Ok(ActionResult::success(output))
    }

    async fn review(&self, ctx: &SpecialistContext, request: &ReviewRequest) -> Option<Vote> {
        let vote = match self.security_vote(ctx, request).await {
            Ok(vote) => vote,
            Err(e) => {
                warn!("Security review of {} unavailable: {}", request.change_id, e);
                Vote::abstain(&ctx.profile.name, format!("Security review unavailable: {}", e))
                    .with_confidence(0.0)
                    .with_voter_kind(ctx.profile.kind)
            }
        };
        Some(vote)
    }
}
