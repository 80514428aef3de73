//! Decomposition and assignment

use super::{Orchestrator, dependencies_met_in, read, write};
use crate::agent::Agent;
use crate::ports::conversation_logger::ConversationEvent;
use conclave_domain::prompt::{PromptTemplate, sanitize_for_prompt};
use conclave_domain::task::parse_subtasks;
use conclave_domain::{
    AgentMessage, ChatMessage, CompletionOptions, MessageContent, MessageType, ORCHESTRATOR,
    Recipient, SubTask, TaskRef, TaskRequest, TaskStatus,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

impl Orchestrator {
    /// Break a goal into subtasks with the text-generation port.
    ///
    /// The prompt lists every registered agent with its capabilities. An
    /// unusable answer yields one subtask holding the raw answer; a failed
    /// call yields one subtask holding the goal. Tasks are inserted into the
    /// project when it exists and returned either way; ids already taken in
    /// the project are replaced by fresh ones.
    pub async fn decompose_task(
        &self,
        task_id: &str,
        description: &str,
        project_id: &str,
    ) -> Vec<SubTask> {
        let table: Vec<(String, Vec<String>)> = self
            .agents()
            .iter()
            .map(|a| (a.name().to_string(), a.profile().capabilities.clone()))
            .collect();
        let messages = [
            ChatMessage::system(PromptTemplate::decompose_system(&table)),
            ChatMessage::user(PromptTemplate::decompose(&sanitize_for_prompt(description))),
        ];
        let options = CompletionOptions::with_temperature(self.config.decomposition_temperature);

        let subtasks = match self.gateway.complete(&messages, &options).await {
            Ok(response) => parse_subtasks(task_id, &response),
            Err(e) => {
                warn!("Decomposition of {} failed, using the goal as one task: {}", task_id, e);
                vec![SubTask::generated(description).with_parent(task_id)]
            }
        };

        let stored =
            self.update_project(project_id, |project| project.add_subtasks(subtasks.clone()));
        let inserted = stored.is_some();
        let subtasks = stored.unwrap_or(subtasks);
        if inserted {
            info!(
                "Decomposed {} into {} subtasks in project {}",
                task_id,
                subtasks.len(),
                project_id
            );
        } else {
            warn!(
                "Project {} not found, {} subtasks of {} not stored",
                project_id,
                subtasks.len(),
                task_id
            );
        }

        self.log_event(
            "task_decomposed",
            json!({
                "project_id": project_id,
                "task_id": task_id,
                "subtasks": subtasks
                    .iter()
                    .map(|t| json!({
                        "task_id": t.task_id,
                        "description": t.description,
                        "agent": t.assigned_agent,
                        "dependencies": t.dependencies,
                    }))
                    .collect::<Vec<_>>(),
            }),
        );
        subtasks
    }

    /// Hand a task to an agent.
    ///
    /// Returns `false` when the task is unknown, its dependencies are not all
    /// Completed (the task becomes Blocked), no agent can take it, or its
    /// pre-assigned agent is not registered.
    pub fn assign_task(&self, task: &TaskRef) -> bool {
        self.assign(task).is_some()
    }

    /// Assignment returning the chosen agent and the delivered request
    pub(crate) fn assign(&self, task_ref: &TaskRef) -> Option<(Arc<Agent>, AgentMessage)> {
        let Some(task) = self.task(task_ref) else {
            debug!("Cannot assign unknown task {}", task_ref);
            return None;
        };

        let met = dependencies_met_in(
            &read(&self.projects),
            &task_ref.project_id,
            &task.dependencies,
        );
        if !met {
            info!("Task {} blocked on {:?}", task_ref, task.dependencies);
            if let Err(e) = self.transition_task(task_ref, TaskStatus::Blocked) {
                warn!("Cannot block {}: {}", task_ref, e);
            }
            return None;
        }

        let agent = match &task.assigned_agent {
            Some(name) => match self.agent(name) {
                Some(agent) => agent,
                None => {
                    warn!("Task {} is assigned to unregistered agent {}", task_ref, name);
                    return None;
                }
            },
            None => match self.select_agent(&task.description) {
                Some(agent) => agent,
                None => {
                    warn!("No agent available for task {}", task_ref);
                    return None;
                }
            },
        };

        {
            let mut projects = write(&self.projects);
            let Some(slot) = projects
                .get_mut(&task_ref.project_id)
                .and_then(|p| p.task_mut(&task_ref.task_id))
            else {
                debug!("Task {} disappeared during assignment", task_ref);
                return None;
            };
            if let Err(e) = slot.transition_to(TaskStatus::Assigned) {
                warn!("Cannot assign {}: {}", task_ref, e);
                return None;
            }
            slot.assigned_agent = Some(agent.name().to_string());
        }

        let request = TaskRequest::new(&task_ref.project_id, &task_ref.task_id, &task.description)
            .with_dependencies(task.dependencies.clone());
        let message = AgentMessage::new(
            ORCHESTRATOR,
            Recipient::agent(agent.name()),
            MessageType::Request,
            MessageContent::TaskRequest(request),
            1.0,
        );
        self.logger.log(ConversationEvent::message_routed(&message));
        agent.receive_message(message.clone());
        info!("Assigned task {} to {}", task_ref, agent.name());

        Some((agent, message))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{agent_with, orchestrator};
    use super::*;
    use crate::testing::ScriptedGateway;
    use conclave_domain::{AgentKind, TaskResult};
    use serde_json::json;

    const TWO_TASKS: &str = r#"Here is the plan:
```json
[
  {"id": "1", "description": "Design database schema", "agent": "database_agent"},
  {"id": "2", "description": "Build the API", "dependencies": ["1"]}
]
```"#;

    #[tokio::test]
    async fn test_decompose_inserts_tasks() {
        let gateway = Arc::new(ScriptedGateway::new([TWO_TASKS]));
        let orch = orchestrator(gateway.clone());
        orch.register_agent(agent_with(
            gateway.clone(),
            "database_agent",
            AgentKind::Database,
            &["schema design"],
        ));
        orch.create_project("P1", "Shop", "web shop").unwrap();

        let tasks = orch.decompose_task("T1", "Build a shop", "P1").await;

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].assigned_agent.as_deref(), Some("database_agent"));
        assert_eq!(tasks[1].dependencies, vec!["1"]);
        assert_eq!(tasks[1].parent_id.as_deref(), Some("T1"));
        assert_eq!(orch.project("P1").unwrap().tasks.len(), 2);

        let calls = gateway.calls();
        let call = &calls[0];
        assert!(call.0[0].content.contains("- database_agent: schema design"));
        assert_eq!(call.1.temperature, 0.3);
    }

    #[tokio::test]
    async fn test_second_decomposition_keeps_earlier_tasks() {
        let gateway = Arc::new(ScriptedGateway::new([TWO_TASKS, TWO_TASKS]));
        let orch = orchestrator(gateway);
        orch.create_project("P1", "Shop", "web shop").unwrap();

        orch.decompose_task("T1", "Build a shop", "P1").await;
        orch.update_project("P1", |p| {
            p.task_mut("1").unwrap().status = TaskStatus::Completed;
        });
        let again = orch.decompose_task("T2", "Add a wishlist", "P1").await;

        let project = orch.project("P1").unwrap();
        assert_eq!(project.tasks.len(), 4);
        let first = project.task("1").unwrap();
        assert_eq!(first.status, TaskStatus::Completed);
        assert_eq!(first.parent_id.as_deref(), Some("T1"));

        assert_ne!(again[0].task_id, "1");
        assert_ne!(again[1].task_id, "2");
        assert_eq!(again[1].dependencies, vec![again[0].task_id.clone()]);
        let second = project.task(&again[1].task_id).unwrap();
        assert_eq!(second.parent_id.as_deref(), Some("T2"));
    }

    #[tokio::test]
    async fn test_decompose_empty_plan() {
        let orch = orchestrator(Arc::new(ScriptedGateway::new(["[]"])));
        orch.create_project("P1", "Shop", "").unwrap();

        let tasks = orch.decompose_task("T1", "Nothing to do", "P1").await;
        assert!(tasks.is_empty());
        assert!(orch.project("P1").unwrap().tasks.is_empty());
    }

    #[tokio::test]
    async fn test_decompose_unparseable_keeps_raw_text() {
        let gateway = Arc::new(ScriptedGateway::new(["Just build it."]));
        let orch = orchestrator(gateway);
        orch.create_project("P1", "Shop", "").unwrap();

        let tasks = orch.decompose_task("T1", "Build a shop", "P1").await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].description, "Just build it.");
    }

    #[tokio::test]
    async fn test_decompose_failure_uses_goal() {
        let orch = orchestrator(Arc::new(ScriptedGateway::failing()));

        // unknown project: returned, not stored
        let tasks = orch.decompose_task("T1", "Build a shop", "missing").await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].description, "Build a shop");
        assert!(orch.project("missing").is_none());
    }

    #[test]
    fn test_assign_unknown_task() {
        let orch = orchestrator(Arc::new(ScriptedGateway::failing()));
        assert!(!orch.assign_task(&TaskRef::new("P1", "nope")));
    }

    #[test]
    fn test_assign_without_agents() {
        let orch = orchestrator(Arc::new(ScriptedGateway::failing()));
        orch.create_project("P1", "Shop", "").unwrap();
        orch.update_project("P1", |p| p.add_task(SubTask::new("a", "anything")));

        assert!(!orch.assign_task(&TaskRef::new("P1", "a")));
        assert_eq!(
            orch.task(&TaskRef::new("P1", "a")).unwrap().status,
            TaskStatus::Pending
        );
    }

    #[test]
    fn test_assign_to_unregistered_agent() {
        let gateway = Arc::new(ScriptedGateway::failing());
        let orch = orchestrator(gateway.clone());
        orch.register_agent(agent_with(gateway, "backend", AgentKind::Backend, &["api"]));
        orch.create_project("P1", "Shop", "").unwrap();
        orch.update_project("P1", |p| {
            p.add_task(SubTask::new("a", "api work").with_agent("ghost"))
        });

        assert!(!orch.assign_task(&TaskRef::new("P1", "a")));
    }

    #[test]
    fn test_dependency_gating() {
        let gateway = Arc::new(ScriptedGateway::failing());
        let orch = orchestrator(gateway.clone());
        let backend = agent_with(gateway, "backend", AgentKind::Backend, &["api"]);
        orch.register_agent(Arc::clone(&backend));
        orch.create_project("P1", "Shop", "").unwrap();
        orch.update_project("P1", |p| {
            p.add_task(SubTask::new("A", "schema"));
            p.add_task(SubTask::new("B", "api").with_dependencies(vec!["A".to_string()]));
        });
        let b = TaskRef::new("P1", "B");

        // A pending: B is blocked
        assert!(!orch.assign_task(&b));
        assert_eq!(orch.task(&b).unwrap().status, TaskStatus::Blocked);
        assert_eq!(backend.pending_messages(), 0);

        // A completed: B is assignable
        orch.update_project("P1", |p| {
            p.task_mut("A").unwrap().status = TaskStatus::Completed;
        });
        assert!(orch.assign_task(&b));
        let task = orch.task(&b).unwrap();
        assert_eq!(task.status, TaskStatus::Assigned);
        assert_eq!(task.assigned_agent.as_deref(), Some("backend"));

        let inbox = backend.take_messages();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].message_type, MessageType::Request);
        assert_eq!(inbox[0].sender, ORCHESTRATOR);
        match &inbox[0].content {
            MessageContent::TaskRequest(request) => {
                assert_eq!(request.task_id, "B");
                assert_eq!(request.dependencies, vec!["A"]);
            }
            other => panic!("unexpected content {:?}", other),
        }
    }

    #[test]
    fn test_dependency_is_resolved_in_own_project() {
        let gateway = Arc::new(ScriptedGateway::failing());
        let orch = orchestrator(gateway.clone());
        orch.register_agent(agent_with(gateway, "backend", AgentKind::Backend, &["api"]));
        for project in ["A", "B"] {
            orch.create_project(project, project, "").unwrap();
            orch.update_project(project, |p| {
                p.add_task(SubTask::new("1", "schema"));
                p.add_task(SubTask::new("2", "api").with_dependencies(vec!["1".to_string()]));
            });
        }
        orch.update_project("A", |p| {
            p.task_mut("1").unwrap().status = TaskStatus::Completed;
        });

        let b2 = TaskRef::new("B", "2");
        assert!(!orch.assign_task(&b2));
        assert_eq!(orch.task(&b2).unwrap().status, TaskStatus::Blocked);
        assert!(orch.assign_task(&TaskRef::new("A", "2")));
    }

    #[test]
    fn test_unknown_dependency_is_met() {
        let gateway = Arc::new(ScriptedGateway::failing());
        let orch = orchestrator(gateway.clone());
        orch.register_agent(agent_with(gateway, "backend", AgentKind::Backend, &["api"]));
        orch.create_project("P1", "Shop", "").unwrap();
        orch.update_project("P1", |p| {
            p.add_task(SubTask::new("B", "api").with_dependencies(vec!["nowhere".to_string()]))
        });

        assert!(orch.assign_task(&TaskRef::new("P1", "B")));
    }

    #[tokio::test]
    async fn test_end_to_end_two_subtasks() {
        let gateway = Arc::new(ScriptedGateway::new([TWO_TASKS]));
        let orch = orchestrator(gateway.clone());
        let database = agent_with(
            gateway.clone(),
            "database_agent",
            AgentKind::Database,
            &["schema design"],
        );
        let backend = agent_with(gateway, "backend_agent", AgentKind::Backend, &["api"]);
        orch.register_agent(Arc::clone(&database));
        orch.register_agent(Arc::clone(&backend));
        orch.create_project("P1", "Shop", "web shop").unwrap();

        let tasks = orch.decompose_task("T1", "Build a shop", "P1").await;
        let first = TaskRef::new("P1", &tasks[0].task_id);
        let second = TaskRef::new("P1", &tasks[1].task_id);

        assert!(!orch.assign_task(&second));
        assert_eq!(orch.task(&second).unwrap().status, TaskStatus::Blocked);

        assert!(orch.assign_task(&first));
        assert_eq!(database.pending_messages(), 1);

        orch.complete_task(&first, TaskResult::success("1", json!("schema.sql")))
            .unwrap();
        let done = orch.task(&first).unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert!(done.completed_at.is_some());

        assert!(orch.assign_task(&second));
        assert_eq!(
            orch.task(&second).unwrap().assigned_agent.as_deref(),
            Some("backend_agent")
        );
        assert_eq!(backend.pending_messages(), 1);
    }
}
