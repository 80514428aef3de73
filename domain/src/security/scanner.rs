//! Pattern-based vulnerability scanning and parsing of model findings.

use super::findings::{SecurityFinding, Severity, VulnerabilityType};
use crate::core::string::truncate;
use regex::Regex;
use std::sync::LazyLock;

const PATTERN_SOURCES: &[(VulnerabilityType, &str)] = &[
    (VulnerabilityType::SqlInjection, r#"(?i)execute\s*\(\s*['"].*%"#),
    (VulnerabilityType::SqlInjection, r#"(?i)cursor\.execute\s*\(\s*f['"]"#),
    (VulnerabilityType::SqlInjection, r#"(?i)query\s*=\s*['"].*\+"#),
    (VulnerabilityType::Xss, r"(?i)innerHTML\s*="),
    (VulnerabilityType::Xss, r"(?i)document\.write\s*\("),
    (VulnerabilityType::Xss, r"(?i)dangerouslySetInnerHTML"),
    (VulnerabilityType::SensitiveData, r#"(?i)password\s*=\s*['"][^'"]+['"]"#),
    (VulnerabilityType::SensitiveData, r#"(?i)api_key\s*=\s*['"][^'"]+['"]"#),
    (VulnerabilityType::SensitiveData, r#"(?i)secret\s*=\s*['"][^'"]+['"]"#),
    (VulnerabilityType::Authentication, r"(?i)verify\s*=\s*False"),
    (VulnerabilityType::Authentication, r"(?i)check_password.*=="),
];

static PATTERNS: LazyLock<Vec<(VulnerabilityType, Regex)>> = LazyLock::new(|| {
    PATTERN_SOURCES
        .iter()
        .filter_map(|(vt, src)| Regex::new(src).ok().map(|re| (*vt, re)))
        .collect()
});

/// Maximum findings taken from a model's free-text analysis
pub const MAX_MODEL_FINDINGS: usize = 10;

/// Scan source code line by line against the known vulnerability patterns.
///
/// Finding ids are `{scan_id}-{n}`, locations `{filename}:{line}`.
pub fn scan_patterns(scan_id: &str, code: &str, filename: &str) -> Vec<SecurityFinding> {
    let mut findings = Vec::new();
    for (vt, re) in PATTERNS.iter() {
        for (idx, line) in code.lines().enumerate() {
            if re.is_match(line) {
                findings.push(SecurityFinding {
                    finding_id: format!("{}-{}", scan_id, findings.len()),
                    vulnerability_type: *vt,
                    severity: vt.default_severity(),
                    title: format!("Potential {}", vt.title()),
                    description: format!("Pattern match detected: {}", re.as_str()),
                    location: format!("{}:{}", filename, idx + 1),
                    recommendation: vt.recommendation().to_string(),
                });
            }
        }
    }
    findings
}

/// Turn a model's security analysis into findings.
///
/// A severity word sets the severity for following lines; lines mentioning
/// a vulnerability, issue, flaw or weakness become findings.
pub fn parse_model_findings(analysis: &str, location: &str) -> Vec<SecurityFinding> {
    let mut findings = Vec::new();
    let mut severity = Severity::Medium;

    for line in analysis.lines() {
        let line = line.trim().to_lowercase();
        if let Some(s) = Severity::mentioned_in(&line) {
            severity = s;
        }
        if ["vulnerability", "issue", "flaw", "weakness"]
            .iter()
            .any(|w| line.contains(w))
        {
            findings.push(SecurityFinding {
                finding_id: format!("llm-{}", findings.len()),
                vulnerability_type: VulnerabilityType::InputValidation,
                severity,
                title: "Model-detected security issue".to_string(),
                description: truncate(&line, 200),
                location: location.to_string(),
                recommendation: "Review and remediate".to_string(),
            });
        }
        if findings.len() >= MAX_MODEL_FINDINGS {
            break;
        }
    }

    findings
}

/// Dependency audit lines mentioning a CVE or vulnerability become findings.
pub fn parse_dependency_findings(analysis: &str) -> Vec<SecurityFinding> {
    analysis
        .lines()
        .map(str::trim)
        .filter(|line| {
            let lower = line.to_lowercase();
            lower.contains("cve") || lower.contains("vulnerability")
        })
        .enumerate()
        .map(|(i, line)| SecurityFinding {
            finding_id: format!("dep-{}", i),
            vulnerability_type: VulnerabilityType::Dependency,
            severity: Severity::High,
            title: "Vulnerable Dependency".to_string(),
            description: line.to_string(),
            location: "dependencies".to_string(),
            recommendation: "Upgrade to patched version".to_string(),
        })
        .collect()
}
