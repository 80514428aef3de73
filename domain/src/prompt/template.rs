//! Prompt templates for orchestration

/// Templates for decomposition and conflict resolution
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for task decomposition, listing the registered agents
    pub fn decompose_system(agents: &[(String, Vec<String>)]) -> String {
        let table = agents
            .iter()
            .map(|(name, caps)| format!("- {}: {}", name, caps.join(", ")))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"You are a task decomposition expert. Break down tasks into
subtasks that can be assigned to specialized agents.

Available agents and their capabilities:
{}"#,
            table
        )
    }

    /// User prompt for task decomposition
    pub fn decompose(description: &str) -> String {
        format!(
            r#"Decompose this task into subtasks:

{}

For each subtask, specify:
1. id (short, unique within this answer)
2. description
3. agent: which agent should handle it
4. dependencies: ids of subtasks that must finish first (may be empty)

Format as a JSON array, for example:
[{{"id": "1", "description": "...", "agent": "...", "dependencies": []}}]"#,
            description
        )
    }

    /// Prompt asking one party of a conflict to reconsider
    pub fn conflict(topic: &str, own_position: &str, others: &[(String, String)]) -> String {
        let others = others
            .iter()
            .map(|(agent, position)| format!("{}: {}", agent, position))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"Conflict resolution needed on: {}

Your position: {}

Other positions:
{}

Can you find a compromise? Vote APPROVE for compromise, REJECT to maintain position."#,
            topic, own_position, others
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decompose_system_table() {
        let prompt = PromptTemplate::decompose_system(&[
            ("backend_agent".to_string(), vec!["api design".to_string(), "caching".to_string()]),
            ("testing_agent".to_string(), vec!["analyze_coverage".to_string()]),
        ]);
        assert!(prompt.contains("- backend_agent: api design, caching"));
        assert!(prompt.contains("- testing_agent: analyze_coverage"));
    }

    #[test]
    fn test_conflict_lists_other_positions() {
        let prompt = PromptTemplate::conflict(
            "ORM choice",
            "Use Diesel",
            &[("database_agent".to_string(), "Use sqlx".to_string())],
        );
        assert!(prompt.contains("Your position: Use Diesel"));
        assert!(prompt.contains("database_agent: Use sqlx"));
    }
}
