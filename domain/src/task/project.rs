//! Project aggregate: the task graph of one goal

use super::entities::{SubTask, TaskStatus};
use crate::core::error::DomainError;
use crate::core::id::generate_short_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Current state of a project
///
/// Owns its subtasks exclusively; everything outside refers to them by
/// [`TaskRef`](super::TaskRef).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    pub project_id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tasks: BTreeMap<String, SubTask>,
    #[serde(default)]
    pub artifacts: Vec<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl ProjectState {
    pub fn new(
        project_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            name: name.into(),
            description: description.into(),
            tasks: BTreeMap::new(),
            artifacts: Vec::new(),
            metadata: Map::new(),
            created_at: Utc::now(),
        }
    }

    /// Insert a subtask, replacing any task with the same id.
    ///
    /// Dependencies naming tasks outside this project are kept verbatim.
    pub fn add_task(&mut self, task: SubTask) {
        for dep in &task.dependencies {
            if dep != &task.task_id && !self.tasks.contains_key(dep) {
                tracing::debug!(
                    project = %self.project_id,
                    task = %task.task_id,
                    dependency = %dep,
                    "Dependency not (yet) in project"
                );
            }
        }
        self.tasks.insert(task.task_id.clone(), task);
    }

    /// Insert a decomposed batch without touching existing tasks.
    ///
    /// A task whose id is already taken, in the project or earlier in the
    /// batch, gets a fresh id. Dependencies inside the batch on a renamed id
    /// follow the rename. Returns the tasks as stored.
    pub fn add_subtasks(&mut self, mut batch: Vec<SubTask>) -> Vec<SubTask> {
        let mut renamed: HashMap<String, String> = HashMap::new();
        let mut seen: HashSet<String> = HashSet::new();

        for task in &mut batch {
            let original = task.task_id.clone();
            let in_batch = !seen.insert(original.clone());
            if !in_batch && !self.tasks.contains_key(&original) {
                continue;
            }
            let fresh = generate_short_id();
            tracing::debug!(
                project = %self.project_id,
                task = %original,
                renamed = %fresh,
                "Task id already taken"
            );
            if !in_batch {
                renamed.insert(original, fresh.clone());
            }
            task.task_id = fresh;
        }

        for task in &mut batch {
            for dep in &mut task.dependencies {
                if let Some(fresh) = renamed.get(dep) {
                    *dep = fresh.clone();
                }
            }
            self.add_task(task.clone());
        }
        batch
    }

    pub fn task(&self, task_id: &str) -> Option<&SubTask> {
        self.tasks.get(task_id)
    }

    pub fn task_mut(&mut self, task_id: &str) -> Option<&mut SubTask> {
        self.tasks.get_mut(task_id)
    }

    pub fn require_task_mut(&mut self, task_id: &str) -> Result<&mut SubTask, DomainError> {
        self.tasks
            .get_mut(task_id)
            .ok_or_else(|| DomainError::TaskNotFound(task_id.to_string()))
    }

    pub fn add_artifact(&mut self, artifact: impl Into<String>) {
        self.artifacts.push(artifact.into());
    }

    /// Number of tasks in each status
    pub fn status_counts(&self) -> BTreeMap<TaskStatus, usize> {
        let mut counts = BTreeMap::new();
        for task in self.tasks.values() {
            *counts.entry(task.status).or_insert(0) += 1;
        }
        counts
    }

    /// All tasks reached Completed or Failed
    pub fn is_finished(&self) -> bool {
        !self.tasks.is_empty() && self.tasks.values().all(|t| t.status.is_terminal())
    }

    // ==================== Records ====================

    /// Export as a JSON object with RFC 3339 timestamps
    pub fn to_record(&self) -> Result<Map<String, Value>, DomainError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(DomainError::MalformedRecord(
                "project did not serialize to an object".to_string(),
            )),
            Err(e) => Err(DomainError::MalformedRecord(e.to_string())),
        }
    }

    pub fn from_record(record: Map<String, Value>) -> Result<Self, DomainError> {
        serde_json::from_value(Value::Object(record))
            .map_err(|e| DomainError::MalformedRecord(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::TaskResult;
    use serde_json::json;

    fn sample() -> ProjectState {
        let mut project = ProjectState::new("p1", "Shop", "Online shop");
        project.add_task(SubTask::new("a", "Design schema").with_agent("database_agent"));
        project.add_task(
            SubTask::new("b", "Build API").with_dependencies(vec!["a".to_string()]),
        );
        project.add_artifact("schema.sql");
        project
            .metadata
            .insert("owner".to_string(), json!("team-a"));
        project
    }

    #[test]
    fn test_record_round_trip() {
        let mut project = sample();
        {
            let task = project.task_mut("a").unwrap();
            task.transition_to(TaskStatus::Assigned).unwrap();
            task.finish(TaskResult::success("a", json!("done"))).unwrap();
        }

        let record = project.to_record().unwrap();
        assert!(record["created_at"].as_str().unwrap().contains('T'));

        let restored = ProjectState::from_record(record).unwrap();
        assert_eq!(restored, project);
        assert_eq!(restored.task("a").unwrap().status, TaskStatus::Completed);
    }

    #[test]
    fn test_from_record_rejects_garbage() {
        let mut record = Map::new();
        record.insert("project_id".to_string(), json!(3));
        let err = ProjectState::from_record(record).unwrap_err();
        assert!(matches!(err, DomainError::MalformedRecord(_)));
    }

    #[test]
    fn test_status_counts_and_finished() {
        let mut project = sample();
        assert!(!project.is_finished());
        assert_eq!(project.status_counts()[&TaskStatus::Pending], 2);

        for id in ["a", "b"] {
            let task = project.task_mut(id).unwrap();
            task.transition_to(TaskStatus::Failed).unwrap();
        }
        assert!(project.is_finished());
    }

    #[test]
    fn test_add_subtasks_keeps_existing_tasks() {
        let mut project = sample();
        project.task_mut("a").unwrap().status = TaskStatus::Completed;

        let stored = project.add_subtasks(vec![
            SubTask::new("a", "Add indexes").with_parent("T2"),
            SubTask::new("c", "Add search").with_dependencies(vec!["a".to_string()]),
        ]);

        assert_eq!(project.tasks.len(), 4);
        let original = project.task("a").unwrap();
        assert_eq!(original.status, TaskStatus::Completed);
        assert_eq!(original.description, "Design schema");

        let renamed = &stored[0].task_id;
        assert_ne!(renamed, "a");
        assert_eq!(project.task(renamed).unwrap().description, "Add indexes");
        assert_eq!(stored[1].task_id, "c");
        assert_eq!(project.task("c").unwrap().dependencies, vec![renamed.clone()]);
    }

    #[test]
    fn test_add_subtasks_duplicate_ids_in_batch() {
        let mut project = ProjectState::new("p1", "Shop", "");
        let stored = project.add_subtasks(vec![
            SubTask::new("1", "first"),
            SubTask::new("1", "second"),
            SubTask::new("2", "third").with_dependencies(vec!["1".to_string()]),
        ]);

        assert_eq!(project.tasks.len(), 3);
        assert_eq!(stored[0].task_id, "1");
        assert_ne!(stored[1].task_id, "1");
        // batch dependencies point at the first task with that id
        assert_eq!(project.task("2").unwrap().dependencies, vec!["1"]);
    }

    #[test]
    fn test_require_task_mut() {
        let mut project = sample();
        assert!(project.require_task_mut("zzz").is_err());
        assert!(project.require_task_mut("a").is_ok());
    }
}
