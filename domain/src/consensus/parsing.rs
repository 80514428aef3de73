//! Review response parsing.
//!
//! These functions turn free-form LLM review responses into verdicts. They
//! are pure domain logic: no I/O, just text pattern matching.
//!
//! | Function | Use Case | Signal |
//! |----------|----------|--------|
//! | [`parse_review_response`] | Peer review by any agent | APPROVE / REJECT keywords |
//! | [`parse_security_review`] | Security review with veto | Risk vocabulary |
//! | [`extract_bullets`] | Concerns list | `-` / `*` lines |

/// Words that turn a security review into a rejection
const SECURITY_REJECTION_MARKERS: [&str; 9] = [
    "reject",
    "veto",
    "vulnerability",
    "critical",
    "high risk",
    "injection",
    "bypass",
    "exposed",
    "insecure",
];

/// Upper bound on concerns attached to one vote
pub const MAX_CONCERNS: usize = 5;

/// Parse a review response to extract approval status and feedback.
///
/// Checks for explicit APPROVE/REJECT keywords in the response text.
/// Conservative: defaults to rejection when ambiguous.
///
/// # Returns
///
/// `(approved, full_response_as_feedback)`
pub fn parse_review_response(response: &str) -> (bool, String) {
    let response_upper = response.to_uppercase();

    let approved = response_upper.contains("APPROVE")
        && !response_upper.contains("NOT APPROVE")
        && !response_upper.contains("DON'T APPROVE")
        && !response_upper.contains("CANNOT APPROVE");

    let rejected = response_upper.contains("REJECT")
        || response_upper.contains("REVISE")
        || response_upper.contains("NOT APPROVE")
        || response_upper.contains("CANNOT APPROVE");

    (approved && !rejected, response.to_string())
}

/// Parse a security review.
///
/// Any risk vocabulary in the text makes it a rejection; the bulleted lines
/// then become the concerns (at most [`MAX_CONCERNS`]). An approval carries
/// no concerns.
///
/// # Returns
///
/// `(rejected, concerns)`
pub fn parse_security_review(response: &str) -> (bool, Vec<String>) {
    let lower = response.to_lowercase();
    let rejected = SECURITY_REJECTION_MARKERS.iter().any(|m| lower.contains(m));
    if !rejected {
        return (false, Vec::new());
    }
    (true, extract_bullets(response, MAX_CONCERNS))
}

/// Collect `-` / `*` bulleted lines, stripped of their markers.
pub fn extract_bullets(text: &str, max: usize) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.starts_with('-') || line.starts_with('*'))
        .map(|line| line.trim_start_matches(['-', '*', ' ']).to_string())
        .filter(|line| !line.is_empty())
        .take(max)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== parse_review_response Tests ====================

    #[test]
    fn test_approve_response() {
        let (approved, _) = parse_review_response("I APPROVE this change. It looks good.");
        assert!(approved);
    }

    #[test]
    fn test_reject_response() {
        let (approved, _) = parse_review_response("I REJECT this change. It needs work.");
        assert!(!approved);
    }

    #[test]
    fn test_cannot_approve() {
        let (approved, _) = parse_review_response("I CANNOT APPROVE this change.");
        assert!(!approved);
    }

    #[test]
    fn test_ambiguous_defaults_to_reject() {
        let (approved, feedback) = parse_review_response("This change has some issues.");
        assert!(!approved);
        assert_eq!(feedback, "This change has some issues.");
    }

    // ==================== parse_security_review Tests ====================

    #[test]
    fn test_security_review_rejection_with_concerns() {
        let response = "REJECT\n\nFindings:\n- SQL injection in login query\n* Password logged in plaintext\nPlease fix.";
        let (rejected, concerns) = parse_security_review(response);
        assert!(rejected);
        assert_eq!(
            concerns,
            vec!["SQL injection in login query", "Password logged in plaintext"]
        );
    }

    #[test]
    fn test_security_review_approval_drops_bullets() {
        let response = "APPROVE\n- uses parameterized queries\n- secrets come from env";
        let (rejected, concerns) = parse_security_review(response);
        assert!(!rejected);
        assert!(concerns.is_empty());
    }

    #[test]
    fn test_concerns_capped() {
        let response = (0..8)
            .map(|i| format!("- issue {i}"))
            .collect::<Vec<_>>()
            .join("\nvulnerability\n");
        let (_, concerns) = parse_security_review(&response);
        assert_eq!(concerns.len(), MAX_CONCERNS);
        assert_eq!(concerns[0], "issue 0");
    }
}
