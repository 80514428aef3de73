//! Prompt templates for the agent loop

use crate::agent::{ActionResult, AgentProfile};
use crate::protocol::ReviewRequest;

/// Templates for think / reflect / review prompts
pub struct AgentPromptTemplate;

impl AgentPromptTemplate {
    /// System prompt identifying the agent, its capabilities and memory context
    pub fn system(profile: &AgentProfile, memory_summary: &str) -> String {
        let capabilities = profile
            .capabilities
            .iter()
            .map(|c| format!("- {}", c))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"You are {name}, a specialized AI agent.

Role: {role}

Capabilities:
{capabilities}

Guidelines:
1. Always think systematically before acting
2. Research current best practices before implementation
3. Escalate when confidence is below {threshold}
4. Document your reasoning clearly
5. Consider security implications at all times

Current context from memory:
{memory_summary}
"#,
            name = profile.name,
            role = profile.role,
            threshold = profile.confidence_threshold,
        )
    }

    /// User prompt for the think step
    pub fn think(prompt: &str) -> String {
        format!(
            r#"Analyze this task and plan your approach:

{}

Respond with:
1. Your understanding of the task
2. Step-by-step reasoning
3. Confidence level (0.0-1.0)
4. Whether you need more research
5. Whether this should be escalated"#,
            prompt
        )
    }

    /// User prompt for the reflect step
    pub fn reflect(result: &ActionResult) -> String {
        format!(
            r#"Reflect on this result:

Success: {}
Output: {}
Error: {}
Duration: {}ms

What can we learn? Should we update our knowledge base?
Identify any patterns or improvement opportunities."#,
            result.success,
            result.output,
            result.error.as_deref().unwrap_or("None"),
            result.duration_ms
        )
    }

    /// User prompt asking a peer for an APPROVE / REJECT verdict
    pub fn review(request: &ReviewRequest) -> String {
        let mut prompt = format!(
            r#"Review this {change_type} change by {author} (change id {change_id}):

{description}
"#,
            change_type = request.change_type,
            author = request.author,
            change_id = request.change_id,
            description = request.description,
        );

        if !request.diff.is_empty() {
            prompt.push_str(&format!("\nDiff:\n```\n{}\n```\n", request.diff));
        }

        prompt.push_str(
            r#"
Evaluate it from the perspective of your role.
List any concerns as bullet points starting with "-".

End with a single line: APPROVE if the change is acceptable, or REJECT if it must be revised."#,
        );
        prompt
    }

    /// System prompt addendum for security reviews
    pub fn security_review_system(base_system: &str) -> String {
        format!(
            r#"{}

You are conducting a SECURITY REVIEW. You have VETO POWER.
If you identify ANY of these issues, you MUST REJECT:
- SQL injection vulnerabilities
- Cross-site scripting (XSS)
- Authentication/authorization bypasses
- Sensitive data exposure
- Insecure cryptography
- Known vulnerable dependencies

Be thorough. Security is the highest priority."#,
            base_system
        )
    }

    /// User prompt for a security review of a change
    pub fn security_review(request: &ReviewRequest) -> String {
        let body = if request.diff.is_empty() {
            &request.description
        } else {
            &request.diff
        };
        format!(
            r#"Review this code change for security issues:

Context: {} change by {} ({})

Diff:
```
{}
```

Analyze for:
1. Security vulnerabilities introduced
2. Security best practices violated
3. Potential attack vectors
4. Missing security controls

List each issue as a bullet point starting with "-".
Decision: APPROVE (no security issues) or REJECT (security issues found)
Provide detailed reasoning."#,
            request.change_type, request.author, request.change_id, body
        )
    }
}
