//! Security analysis domain
//!
//! Findings, severities and the pattern scanner used by the security
//! specialist. Risk score is the sum of severity weights, capped at 10; a
//! report passes when the score is below 5 and nothing is High or Critical.

pub mod findings;
pub mod scanner;

pub use findings::{SecurityFinding, SecurityReport, Severity, VulnerabilityType};
pub use scanner::{parse_dependency_findings, parse_model_findings, scan_patterns};
