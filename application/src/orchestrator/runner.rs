//! Run loop, queues and message routing

use super::{Orchestrator, OrchestratorError, lock, read};
use crate::ports::conversation_logger::ConversationEvent;
use conclave_domain::prompt::EXECUTE_TASK;
use conclave_domain::{
    Action, ActionResult, AgentMessage, MessageContent, MessageType, ORCHESTRATOR, Recipient,
    TaskRef, TaskStatus,
};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Cloneable producer side of an orchestrator's queues.
///
/// Hand it to whatever feeds work in while [`Orchestrator::run`] is
/// driving the loop.
#[derive(Clone)]
pub struct OrchestratorHandle {
    task_tx: mpsc::UnboundedSender<TaskRef>,
    message_tx: mpsc::UnboundedSender<AgentMessage>,
    cancel: CancellationToken,
}

impl OrchestratorHandle {
    /// Queue a task; `false` once the orchestrator is gone
    pub fn submit_task(&self, task: TaskRef) -> bool {
        self.task_tx.send(task).is_ok()
    }

    /// Queue a message for routing; `false` once the orchestrator is gone
    pub fn send(&self, message: AgentMessage) -> bool {
        self.message_tx.send(message).is_ok()
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Orchestrator {
    pub fn handle(&self) -> OrchestratorHandle {
        OrchestratorHandle {
            task_tx: self.task_tx.clone(),
            message_tx: self.message_tx.clone(),
            cancel: self.cancel.clone(),
        }
    }

    pub fn submit_task(&self, task: TaskRef) {
        debug!("Task {} queued", task);
        // the receiver lives as long as self
        let _ = self.task_tx.send(task);
    }

    pub fn send(&self, message: AgentMessage) {
        let _ = self.message_tx.send(message);
    }

    /// Stop the run loop at its next await point
    pub fn stop(&self) {
        info!("Orchestrator stop requested");
        self.cancel.cancel();
    }

    /// Drive the queues until [`stop`](Self::stop).
    ///
    /// Each iteration waits up to `task_poll` for a task and processes it,
    /// then up to `message_poll` for a message and routes it. A failing or
    /// panicking step is logged and the loop goes on. The loop runs once per
    /// orchestrator.
    pub async fn run(&self) -> Result<(), OrchestratorError> {
        let mut task_rx = lock(&self.task_rx)
            .take()
            .ok_or(OrchestratorError::AlreadyRunning)?;
        let mut message_rx = lock(&self.message_rx)
            .take()
            .ok_or(OrchestratorError::AlreadyRunning)?;

        info!(
            "Orchestrator running with {} agents",
            read(&self.agents).len()
        );

        loop {
            let task = tokio::select! {
                _ = self.cancel.cancelled() => break,
                polled = tokio::time::timeout(self.config.task_poll, task_rx.recv()) => {
                    polled.ok().flatten()
                }
            };
            if let Some(task) = task {
                guarded("process_task", self.process_task(task)).await;
            }

            let message = tokio::select! {
                _ = self.cancel.cancelled() => break,
                polled = tokio::time::timeout(self.config.message_poll, message_rx.recv()) => {
                    polled.ok().flatten()
                }
            };
            if let Some(message) = message {
                guarded("route_message", async { self.route_message(message) }).await;
            }
        }

        info!("Orchestrator stopped");
        Ok(())
    }

    /// Assign a queued task and start its execution.
    ///
    /// Tasks whose dependencies are not yet Completed are blocked and queued
    /// again.
    pub(crate) async fn process_task(&self, task_ref: TaskRef) -> Result<(), OrchestratorError> {
        let task = self
            .task(&task_ref)
            .ok_or_else(|| OrchestratorError::TaskNotFound(task_ref.to_string()))?;

        if !matches!(task.status, TaskStatus::Pending | TaskStatus::Blocked) {
            debug!("Skipping task {} in status {}", task_ref, task.status);
            return Ok(());
        }

        if !self.dependencies_met(&task_ref.project_id, &task.dependencies) {
            self.transition_task(&task_ref, TaskStatus::Blocked)?;
            debug!("Task {} waiting on dependencies, requeued", task_ref);
            self.submit_task(task_ref);
            return Ok(());
        }

        let Some((agent, request)) = self.assign(&task_ref) else {
            warn!("Task {} could not be assigned", task_ref);
            return Ok(());
        };
        self.transition_task(&task_ref, TaskStatus::InProgress)?;
        lock(&self.executions).insert(request.message_id.clone(), task_ref.clone());

        let action = Action::new(EXECUTE_TASK, &task.description)
            .with_param("task_id", task_ref.task_id.as_str())
            .with_param("project_id", task_ref.project_id.as_str())
            .with_param("description", task.description.as_str());
        let tx = self.message_tx.clone();

        tokio::spawn(async move {
            let result = match AssertUnwindSafe(agent.act(action)).catch_unwind().await {
                Ok(result) => result,
                Err(_) => {
                    error!("{} panicked executing {}", agent.name(), task_ref);
                    ActionResult::failure("Agent panicked during execution")
                }
            };
            let confidence = if result.success { 1.0 } else { 0.0 };
            let reply = request.create_reply(
                agent.name(),
                MessageContent::TaskResult(result.into_task_result(&task_ref.task_id)),
                MessageType::Response,
                confidence,
            );
            if tx.send(reply).is_err() {
                debug!("Orchestrator gone, dropping result of {}", task_ref);
            }
        });
        Ok(())
    }

    /// Deliver a message to its recipients.
    ///
    /// Broadcasts reach every registered agent, the sender included;
    /// messages to `orchestrator` are handled here; unknown recipients are
    /// dropped.
    pub(crate) fn route_message(&self, message: AgentMessage) -> Result<(), OrchestratorError> {
        self.logger.log(ConversationEvent::message_routed(&message));

        match message.receiver.clone() {
            Recipient::Broadcast => {
                // the sender gets its own copy
                for agent in self.agents() {
                    agent.receive_message(message.clone());
                }
                Ok(())
            }
            Recipient::Agent(name) if name == ORCHESTRATOR => self.handle_message(message),
            Recipient::Agent(name) => {
                match self.agent(&name) {
                    Some(agent) => agent.receive_message(message),
                    None => warn!(
                        "Dropping {} from {}: unknown recipient {}",
                        message.message_type, message.sender, name
                    ),
                }
                Ok(())
            }
        }
    }

    fn handle_message(&self, message: AgentMessage) -> Result<(), OrchestratorError> {
        match (message.message_type, message.content) {
            (_, MessageContent::TaskResult(result)) => {
                let task = message
                    .in_reply_to
                    .as_ref()
                    .and_then(|id| lock(&self.executions).remove(id))
                    .or_else(|| self.find_task(&result.task_id))
                    .ok_or_else(|| OrchestratorError::TaskNotFound(result.task_id.clone()))?;
                self.complete_task(&task, result)
            }
            (
                MessageType::Approval | MessageType::Rejection,
                MessageContent::Vote { change_id, vote },
            ) => {
                self.record_review_vote(&change_id, vote);
                Ok(())
            }
            (_, MessageContent::Escalation { reason, .. }) => {
                warn!("Escalation from {}: {}", message.sender, reason);
                Ok(())
            }
            (message_type, content) => {
                debug!(
                    "Ignoring {} ({}) from {}",
                    message_type,
                    content.kind(),
                    message.sender
                );
                Ok(())
            }
        }
    }

    /// First task with this id in any project
    fn find_task(&self, task_id: &str) -> Option<TaskRef> {
        read(&self.projects)
            .values()
            .find(|p| p.tasks.contains_key(task_id))
            .map(|p| TaskRef::new(&p.project_id, task_id))
    }
}

/// Await one loop step, logging its error or panic
async fn guarded<F>(step: &str, fut: F)
where
    F: Future<Output = Result<(), OrchestratorError>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("{} failed: {}", step, e),
        Err(_) => error!("{} panicked", step),
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::agent_with;
    use super::*;
    use crate::config::OrchestratorConfig;
    use crate::testing::ScriptedGateway;
    use conclave_domain::{AgentKind, SubTask};
    use std::sync::Arc;
    use std::time::Duration;

    fn fast_orchestrator(gateway: Arc<ScriptedGateway>) -> Arc<Orchestrator> {
        Arc::new(Orchestrator::new(
            gateway,
            OrchestratorConfig::default()
                .with_task_poll(Duration::from_millis(20))
                .with_message_poll(Duration::from_millis(10)),
        ))
    }

    #[tokio::test]
    async fn test_stop_is_prompt() {
        let orch = Arc::new(Orchestrator::new(
            Arc::new(ScriptedGateway::failing()),
            OrchestratorConfig::default().with_task_poll(Duration::from_secs(30)),
        ));
        let runner = tokio::spawn({
            let orch = Arc::clone(&orch);
            async move { orch.run().await }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        orch.handle().stop();

        let finished = tokio::time::timeout(Duration::from_secs(1), runner).await;
        assert!(matches!(finished, Ok(Ok(Ok(())))));
    }

    #[tokio::test]
    async fn test_run_only_once() {
        let orch = fast_orchestrator(Arc::new(ScriptedGateway::failing()));
        orch.stop();
        orch.run().await.unwrap();
        assert!(matches!(
            orch.run().await,
            Err(OrchestratorError::AlreadyRunning)
        ));
    }

    #[tokio::test]
    async fn test_runs_dependent_tasks_to_completion() {
        let gateway = Arc::new(ScriptedGateway::new(["Schema done", "API done"]));
        let orch = fast_orchestrator(gateway.clone());
        orch.register_agent(agent_with(gateway, "backend", AgentKind::Backend, &["api", "schema"]));
        orch.create_project("P1", "Shop", "").unwrap();
        orch.update_project("P1", |p| {
            p.add_task(SubTask::new("A", "schema for orders"));
            p.add_task(SubTask::new("B", "api for orders").with_dependencies(vec!["A".to_string()]));
        });

        let handle = orch.handle();
        assert!(handle.submit_task(TaskRef::new("P1", "B")));
        assert!(handle.submit_task(TaskRef::new("P1", "A")));
        let runner = tokio::spawn({
            let orch = Arc::clone(&orch);
            async move { orch.run().await }
        });

        let finished = tokio::time::timeout(Duration::from_secs(5), async {
            while !orch.project("P1").is_some_and(|p| p.is_finished()) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        handle.stop();
        runner.await.unwrap().unwrap();

        assert!(finished.is_ok());
        let project = orch.project("P1").unwrap();
        for task in project.tasks.values() {
            assert_eq!(task.status, TaskStatus::Completed);
            assert_eq!(task.assigned_agent.as_deref(), Some("backend"));
        }
        let a = project.task("A").unwrap();
        let b = project.task("B").unwrap();
        assert!(a.completed_at <= b.completed_at);
    }

    #[tokio::test]
    async fn test_failed_execution_fails_task() {
        let gateway = Arc::new(ScriptedGateway::failing());
        let orch = fast_orchestrator(gateway.clone());
        orch.register_agent(agent_with(gateway, "backend", AgentKind::Backend, &["api"]));
        orch.create_project("P1", "Shop", "").unwrap();
        orch.update_project("P1", |p| p.add_task(SubTask::new("A", "api for orders")));

        orch.process_task(TaskRef::new("P1", "A")).await.unwrap();
        assert_eq!(
            orch.task(&TaskRef::new("P1", "A")).unwrap().status,
            TaskStatus::InProgress
        );

        // the execution reports back through the message queue
        let mut rx = lock(&orch.message_rx).take().unwrap();
        let reply = rx.recv().await.unwrap();
        assert_eq!(reply.receiver, Recipient::orchestrator());
        assert!(reply.in_reply_to.is_some());
        orch.route_message(reply).unwrap();

        let task = orch.task(&TaskRef::new("P1", "A")).unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.result.unwrap().error.is_some());
    }

    #[test]
    fn test_route_broadcast_and_unknown() {
        let gateway = Arc::new(ScriptedGateway::failing());
        let orch = fast_orchestrator(gateway.clone());
        let backend = agent_with(gateway.clone(), "backend", AgentKind::Backend, &["api"]);
        let frontend = agent_with(gateway, "frontend", AgentKind::Frontend, &["ui"]);
        orch.register_agent(Arc::clone(&backend));
        orch.register_agent(Arc::clone(&frontend));

        let broadcast = backend.send_message(
            Recipient::Broadcast,
            "schema changed",
            MessageType::Broadcast,
            0.9,
        );
        orch.route_message(broadcast).unwrap();
        // sender included
        assert_eq!(backend.pending_messages(), 1);
        assert_eq!(frontend.pending_messages(), 1);

        let direct = backend.send_message("frontend", "use v2", MessageType::Request, 0.9);
        orch.route_message(direct).unwrap();
        assert_eq!(frontend.pending_messages(), 2);

        let lost = backend.send_message("ghost", "hello?", MessageType::Request, 0.9);
        orch.route_message(lost).unwrap();
        assert_eq!(backend.pending_messages(), 1);
        assert_eq!(frontend.pending_messages(), 2);
    }

    #[test]
    fn test_escalation_to_orchestrator_is_handled() {
        let gateway = Arc::new(ScriptedGateway::failing());
        let orch = fast_orchestrator(gateway.clone());
        let backend = agent_with(gateway, "backend", AgentKind::Backend, &["api"]);
        orch.register_agent(Arc::clone(&backend));

        orch.route_message(backend.escalate("cannot reach database"))
            .unwrap();
        assert_eq!(backend.pending_messages(), 0);
    }
}
