//! Security findings and reports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Contribution to the risk score
    pub fn weight(&self) -> f64 {
        match self {
            Severity::Critical => 3.0,
            Severity::High => 2.0,
            Severity::Medium => 1.0,
            Severity::Low => 0.5,
            Severity::Info => 0.1,
        }
    }

    /// Severity named in a line of text, checked from most to least severe
    pub fn mentioned_in(line: &str) -> Option<Severity> {
        let lower = line.to_lowercase();
        [
            Severity::Critical,
            Severity::High,
            Severity::Medium,
            Severity::Low,
        ]
        .into_iter()
        .find(|s| lower.contains(s.as_str()))
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Category of vulnerability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VulnerabilityType {
    SqlInjection,
    Xss,
    Csrf,
    Authentication,
    Authorization,
    SensitiveData,
    Dependency,
    Configuration,
    Cryptography,
    InputValidation,
}

impl VulnerabilityType {
    pub fn as_str(&self) -> &str {
        match self {
            VulnerabilityType::SqlInjection => "sql_injection",
            VulnerabilityType::Xss => "xss",
            VulnerabilityType::Csrf => "csrf",
            VulnerabilityType::Authentication => "authentication",
            VulnerabilityType::Authorization => "authorization",
            VulnerabilityType::SensitiveData => "sensitive_data",
            VulnerabilityType::Dependency => "dependency",
            VulnerabilityType::Configuration => "configuration",
            VulnerabilityType::Cryptography => "cryptography",
            VulnerabilityType::InputValidation => "input_validation",
        }
    }

    /// Human-readable title, e.g. "Sql Injection"
    pub fn title(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            VulnerabilityType::SqlInjection
            | VulnerabilityType::Authentication
            | VulnerabilityType::Authorization => Severity::Critical,
            VulnerabilityType::Xss
            | VulnerabilityType::SensitiveData
            | VulnerabilityType::Cryptography
            | VulnerabilityType::Dependency => Severity::High,
            VulnerabilityType::Csrf
            | VulnerabilityType::Configuration
            | VulnerabilityType::InputValidation => Severity::Medium,
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            VulnerabilityType::SqlInjection => "Use parameterized queries or ORM",
            VulnerabilityType::Xss => "Sanitize user input, use CSP headers",
            VulnerabilityType::Authentication => "Use secure password hashing, implement MFA",
            VulnerabilityType::Authorization => "Implement proper RBAC, validate permissions",
            VulnerabilityType::SensitiveData => "Use environment variables, encrypt at rest",
            VulnerabilityType::Cryptography => "Use vetted libraries, avoid deprecated algorithms",
            VulnerabilityType::Csrf => "Implement CSRF tokens",
            VulnerabilityType::Configuration => "Review security configuration",
            VulnerabilityType::Dependency => "Update to patched version",
            VulnerabilityType::InputValidation => "Validate and sanitize all inputs",
        }
    }
}

/// A detected vulnerability or concern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityFinding {
    pub finding_id: String,
    pub vulnerability_type: VulnerabilityType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    /// `file:line` or component name
    pub location: String,
    pub recommendation: String,
}

/// Outcome of a security scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityReport {
    pub scan_id: String,
    /// What was scanned
    pub target: String,
    pub findings: Vec<SecurityFinding>,
    pub passed: bool,
    /// 0 to 10
    pub risk_score: f64,
    pub recommendations: Vec<String>,
    pub scan_duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl SecurityReport {
    /// Build a report, deriving score, verdict and recommendations
    pub fn from_findings(
        scan_id: impl Into<String>,
        target: impl Into<String>,
        findings: Vec<SecurityFinding>,
        scan_duration_ms: u64,
    ) -> Self {
        let risk_score = risk_score(&findings);
        let passed = risk_score < 5.0
            && findings
                .iter()
                .all(|f| !matches!(f.severity, Severity::Critical | Severity::High));
        let recommendations = recommendations(&findings);

        Self {
            scan_id: scan_id.into(),
            target: target.into(),
            findings,
            passed,
            risk_score,
            recommendations,
            scan_duration_ms,
            timestamp: Utc::now(),
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }
}

/// Sum of severity weights, capped at 10
pub fn risk_score(findings: &[SecurityFinding]) -> f64 {
    findings
        .iter()
        .map(|f| f.severity.weight())
        .sum::<f64>()
        .min(10.0)
}

/// Prioritized remediation list, at most 10 entries
pub fn recommendations(findings: &[SecurityFinding]) -> Vec<String> {
    let mut out = Vec::new();

    let critical = findings
        .iter()
        .filter(|f| f.severity == Severity::Critical)
        .count();
    let high = findings
        .iter()
        .filter(|f| f.severity == Severity::High)
        .count();

    if critical > 0 {
        out.push(format!("CRITICAL: Fix {} critical issues immediately", critical));
    }
    if high > 0 {
        out.push(format!("HIGH: Address {} high-severity issues", high));
    }

    for finding in findings {
        if !out.contains(&finding.recommendation) {
            out.push(finding.recommendation.clone());
        }
    }

    out.truncate(10);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(vt: VulnerabilityType) -> SecurityFinding {
        SecurityFinding {
            finding_id: "f".to_string(),
            vulnerability_type: vt,
            severity: vt.default_severity(),
            title: vt.title(),
            description: String::new(),
            location: "app.py:1".to_string(),
            recommendation: vt.recommendation().to_string(),
        }
    }

    #[test]
    fn test_title() {
        assert_eq!(VulnerabilityType::SqlInjection.title(), "Sql Injection");
        assert_eq!(VulnerabilityType::Xss.title(), "Xss");
    }

    #[test]
    fn test_risk_score_capped() {
        let findings = vec![finding(VulnerabilityType::SqlInjection); 5];
        assert_eq!(risk_score(&findings), 10.0);
        assert_eq!(risk_score(&[]), 0.0);
    }

    #[test]
    fn test_report_verdict() {
        let clean = SecurityReport::from_findings("s", "a.py", vec![], 1);
        assert!(clean.passed);

        let medium = SecurityReport::from_findings(
            "s",
            "a.py",
            vec![finding(VulnerabilityType::Csrf)],
            1,
        );
        assert!(medium.passed);

        let xss = SecurityReport::from_findings("s", "a.py", vec![finding(VulnerabilityType::Xss)], 1);
        assert!(!xss.passed);
        assert_eq!(xss.count(Severity::High), 1);
    }

    #[test]
    fn test_recommendations_deduplicated() {
        let findings = vec![
            finding(VulnerabilityType::SqlInjection),
            finding(VulnerabilityType::SqlInjection),
            finding(VulnerabilityType::Xss),
        ];
        let recs = recommendations(&findings);
        assert_eq!(recs[0], "CRITICAL: Fix 2 critical issues immediately");
        assert_eq!(recs[1], "HIGH: Address 1 high-severity issues");
        assert_eq!(recs.len(), 4);
    }

    #[test]
    fn test_severity_mentioned_in() {
        assert_eq!(Severity::mentioned_in("Severity: HIGH"), Some(Severity::High));
        assert_eq!(Severity::mentioned_in("nothing here"), None);
    }
}
