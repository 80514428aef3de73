//! Prompt templates for the research and security specialists

use crate::core::string::excerpt;

/// Longest code excerpt sent for model-based security analysis, in bytes
pub const MAX_ANALYZED_CODE: usize = 3000;

/// Templates for research, validation and comparison
pub struct ResearchPromptTemplate;

impl ResearchPromptTemplate {
    /// Synthesize retrieved snippets into one recommendation
    pub fn synthesize(query: &str, context: &str, findings: &[String]) -> String {
        let findings = if findings.is_empty() {
            "No stored knowledge matched this query.".to_string()
        } else {
            findings.join("\n\n")
        };

        format!(
            r#"Synthesize these research findings into a recommendation:

Query: {query}

Context: {context}

Findings:
{findings}

Provide:
1. Clear recommendation
2. Overall confidence (0-1)
3. Key considerations"#
        )
    }

    pub fn validate(approach: &str, requirements: &[String]) -> String {
        let requirements = requirements
            .iter()
            .map(|r| format!("- {}", r))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"Validate this approach:

Approach: {approach}

Requirements:
{requirements}

Does the approach satisfy all requirements?
List any concerns or gaps."#
        )
    }

    pub fn compare(approaches: &[String], criteria: &[String]) -> String {
        let approaches = approaches
            .iter()
            .enumerate()
            .map(|(i, a)| format!("{}. {}", i + 1, a))
            .collect::<Vec<_>>()
            .join("\n");
        let criteria = criteria
            .iter()
            .map(|c| format!("- {}", c))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"Compare these approaches:

Approaches:
{approaches}

Criteria:
{criteria}

Score each approach 0-1 on each criterion. Provide final weighted scores, one line per approach starting with its number."#
        )
    }
}

/// Templates for code scanning and dependency audits
pub struct SecurityPromptTemplate;

impl SecurityPromptTemplate {
    pub fn analyze_code(code: &str, filename: &str, language: &str) -> String {
        format!(
            r#"Perform a comprehensive security analysis of this {language} code:

File: {filename}
```{language}
{code}
```

Check for:
1. OWASP Top 10 vulnerabilities
2. Language-specific security issues
3. Authentication/authorization flaws
4. Data validation issues
5. Cryptographic weaknesses
6. Error handling that leaks information

For each issue found, provide:
- Severity (critical/high/medium/low)
- Line number if possible
- Description
- Recommendation"#,
            code = excerpt(code, MAX_ANALYZED_CODE),
        )
    }

    pub fn audit_system() -> &'static str {
        "You are a security expert checking dependencies for known vulnerabilities. Check each package version against known CVEs."
    }

    pub fn audit_dependencies(dependencies: &[(String, String)]) -> String {
        let listing = dependencies
            .iter()
            .map(|(pkg, ver)| format!("{}: {}", pkg, ver))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"Check these dependencies for known vulnerabilities:

{listing}

For each vulnerable package, provide:
- Package name and version
- CVE ID if known
- Severity (critical/high/medium/low)
- Recommended version"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesize_without_findings() {
        let prompt = ResearchPromptTemplate::synthesize("jwt", "{}", &[]);
        assert!(prompt.contains("No stored knowledge matched"));
    }

    #[test]
    fn test_compare_numbers_approaches() {
        let prompt = ResearchPromptTemplate::compare(
            &["REST".to_string(), "GraphQL".to_string()],
            &["simplicity".to_string()],
        );
        assert!(prompt.contains("1. REST\n2. GraphQL"));
        assert!(prompt.contains("- simplicity"));
    }

    #[test]
    fn test_analyze_code_caps_length() {
        let code = "a".repeat(MAX_ANALYZED_CODE * 2);
        let prompt = SecurityPromptTemplate::analyze_code(&code, "x.py", "python");
        assert!(prompt.len() < MAX_ANALYZED_CODE + 1000);
        assert!(prompt.contains("```python"));
    }
}
