//! Subtask parsing from decomposition responses.
//!
//! Accepts a JSON array of items, either as the whole response or inside a
//! fenced code block:
//!
//! ```json
//! [
//!   {"id": "1", "description": "Design schema", "agent": "database_agent"},
//!   {"id": "2", "description": "Build API", "dependencies": ["1"]}
//! ]
//! ```
//!
//! `id` (string or number), `agent` and `dependencies` are optional. An
//! object wrapping the array under `tasks` or `subtasks` is accepted too.

use super::entities::SubTask;
use serde_json::Value;

/// Parse subtasks, falling back to a single subtask holding the raw text.
pub fn parse_subtasks(parent_id: &str, response: &str) -> Vec<SubTask> {
    match try_parse_subtasks(parent_id, response) {
        Some(tasks) => tasks,
        None => vec![SubTask::generated(response).with_parent(parent_id)],
    }
}

/// Parse subtasks; `None` when no item array is found.
///
/// An empty array is a valid plan with no subtasks.
pub fn try_parse_subtasks(parent_id: &str, response: &str) -> Option<Vec<SubTask>> {
    if let Ok(parsed) = serde_json::from_str::<Value>(response.trim())
        && let Some(tasks) = parse_subtask_json(parent_id, &parsed)
    {
        return Some(tasks);
    }

    fenced_blocks(response)
        .iter()
        .filter_map(|block| serde_json::from_str::<Value>(block).ok())
        .find_map(|parsed| parse_subtask_json(parent_id, &parsed))
}

/// Build subtasks from an already parsed JSON value.
pub fn parse_subtask_json(parent_id: &str, json: &Value) -> Option<Vec<SubTask>> {
    let items = match json {
        Value::Array(items) => items,
        Value::Object(map) => map
            .get("tasks")
            .or_else(|| map.get("subtasks"))
            .and_then(Value::as_array)?,
        _ => return None,
    };

    let tasks = items
        .iter()
        .map(|item| {
            let description = item
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| item.to_string());

            let mut task = match item.get("id").and_then(json_value_to_string) {
                Some(id) => SubTask::new(id, description),
                None => SubTask::generated(description),
            }
            .with_parent(parent_id);

            if let Some(agent) = item.get("agent").and_then(Value::as_str)
                && !agent.is_empty()
            {
                task = task.with_agent(agent);
            }

            if let Some(deps) = item.get("dependencies").and_then(Value::as_array) {
                task = task.with_dependencies(deps.iter().filter_map(json_value_to_string).collect());
            }

            task
        })
        .collect();

    Some(tasks)
}

/// JSON value as an id string (numbers are stringified, null and "" are None)
fn json_value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Bodies of ``` fenced blocks, any language tag
fn fenced_blocks(response: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Option<String> = None;

    for line in response.lines() {
        let trimmed = line.trim();
        if current.is_none() {
            if trimmed.starts_with("```") {
                current = Some(String::new());
            }
        } else if trimmed == "```" {
            blocks.extend(current.take());
        } else if let Some(block) = current.as_mut() {
            block.push_str(line);
            block.push('\n');
        }
    }

    blocks
}
