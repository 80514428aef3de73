//! Extraction of structure from generated reasoning text.
//!
//! Pure functions used by the agent runtime to turn think/reflect responses
//! into [`Thought`] and [`Insight`](super::value_objects::Insight) fields.

use super::value_objects::Thought;
use regex::Regex;
use std::sync::LazyLock;

/// Maximum reasoning steps kept on a thought
pub const MAX_REASONING_STEPS: usize = 10;

/// Confidence assumed when the text states none
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

static CONFIDENCE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"confidence[:\s]+(\d+\.?\d*)",
        r"(\d+\.?\d*)\s*%",
        r"(\d+\.?\d*)\s*/\s*1",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static STEP_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(?:\d+\.|[-*])\s*(.+)$").ok());

static CODE_BLOCK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```([\w+-]*)[^\n]*\n(.*?)```").ok());

/// A fenced code block found in generated text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Info string after the opening fence, `"text"` when absent
    pub language: String,
    pub code: String,
}

/// Parse a think response into a [`Thought`].
pub fn parse_thought(content: &str) -> Thought {
    let lower = content.to_lowercase();
    Thought {
        content: content.to_string(),
        confidence: extract_confidence(content),
        reasoning_steps: extract_steps(content),
        requires_research: lower.contains("research") && lower.contains("need"),
        requires_escalation: lower.contains("escalate"),
    }
}

/// Extract a confidence value in [0, 1].
///
/// Patterns are tried in order: `confidence: x`, `x%`, `x/1`. Values above 1
/// are read as percentages. Defaults to [`DEFAULT_CONFIDENCE`].
pub fn extract_confidence(content: &str) -> f64 {
    let lower = content.to_lowercase();
    for pattern in CONFIDENCE_PATTERNS.iter() {
        let value = pattern
            .captures(&lower)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok());
        if let Some(value) = value {
            let value = if value > 1.0 { value / 100.0 } else { value };
            return value.clamp(0.0, 1.0);
        }
    }
    DEFAULT_CONFIDENCE
}

/// Numbered (`1.`) or bulleted (`-`, `*`) lines, at most [`MAX_REASONING_STEPS`].
pub fn extract_steps(content: &str) -> Vec<String> {
    let Some(pattern) = STEP_PATTERN.as_ref() else {
        return Vec::new();
    };
    pattern
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end().to_string())
        .take(MAX_REASONING_STEPS)
        .collect()
}

/// First line mentioning "pattern", trimmed.
pub fn extract_pattern(content: &str) -> Option<String> {
    content
        .lines()
        .find(|line| line.to_lowercase().contains("pattern"))
        .map(|line| line.trim().to_string())
}

/// Fenced code blocks in order of appearance.
pub fn extract_code_blocks(content: &str) -> Vec<CodeBlock> {
    let Some(pattern) = CODE_BLOCK.as_ref() else {
        return Vec::new();
    };
    pattern
        .captures_iter(content)
        .map(|caps| {
            let language = caps
                .get(1)
                .map(|m| m.as_str())
                .filter(|s| !s.is_empty())
                .unwrap_or("text");
            CodeBlock {
                language: language.to_string(),
                code: caps
                    .get(2)
                    .map(|m| m.as_str().trim_end().to_string())
                    .unwrap_or_default(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== extract_confidence Tests ====================

    #[test]
    fn test_confidence_label() {
        assert_eq!(extract_confidence("Confidence: 0.85"), 0.85);
        assert_eq!(extract_confidence("confidence 0.4 overall"), 0.4);
    }

    #[test]
    fn test_confidence_percentage() {
        assert_eq!(extract_confidence("I am 85% sure"), 0.85);
        assert_eq!(extract_confidence("Confidence: 90"), 0.9);
    }

    #[test]
    fn test_confidence_clamped() {
        assert_eq!(extract_confidence("confidence: 250"), 1.0);
    }

    #[test]
    fn test_confidence_default() {
        assert_eq!(extract_confidence("No idea at all"), DEFAULT_CONFIDENCE);
        assert_eq!(extract_confidence(""), DEFAULT_CONFIDENCE);
    }

    // ==================== extract_steps Tests ====================

    #[test]
    fn test_steps_numbered_and_bulleted() {
        let text = "Plan:\n1. Read the schema\n2. Draft endpoints\n- check auth\n* add tests\nDone";
        assert_eq!(
            extract_steps(text),
            vec!["Read the schema", "Draft endpoints", "check auth", "add tests"]
        );
    }

    #[test]
    fn test_steps_capped() {
        let text = (1..=15)
            .map(|i| format!("{i}. step {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let steps = extract_steps(&text);
        assert_eq!(steps.len(), MAX_REASONING_STEPS);
        assert_eq!(steps[9], "step 10");
    }

    // ==================== parse_thought Tests ====================

    #[test]
    fn test_parse_thought_flags() {
        let thought = parse_thought("We need more research. I would escalate. Confidence: 0.3");
        assert!(thought.requires_research);
        assert!(thought.requires_escalation);
        assert_eq!(thought.confidence, 0.3);
    }

    #[test]
    fn test_parse_thought_research_needs_both_words() {
        let thought = parse_thought("Research is done.");
        assert!(!thought.requires_research);
    }

    #[test]
    fn test_extract_pattern() {
        let text = "Went fine.\n  A retry Pattern emerged here  \nOther pattern";
        assert_eq!(
            extract_pattern(text).as_deref(),
            Some("A retry Pattern emerged here")
        );
        assert_eq!(extract_pattern("nothing"), None);
    }

    #[test]
    fn test_extract_code_blocks() {
        let text = "Here:\n```tsx\nexport const A = () => <div/>;\n```\nand\n```\nplain\n```";
        let blocks = extract_code_blocks(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].language, "tsx");
        assert_eq!(blocks[0].code, "export const A = () => <div/>;");
        assert_eq!(blocks[1].language, "text");
        assert_eq!(blocks[1].code, "plain");
        assert!(extract_code_blocks("no code").is_empty());
    }
}
