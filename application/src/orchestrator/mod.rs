//! Orchestrator
//!
//! Owns the agent registry, the project task graphs, the task and message
//! queues and the pending reviews. Everything outside refers to agents by
//! name and to tasks by [`TaskRef`].
//!
//! ```text
//! goal ──decompose_task──▶ SubTasks ──submit_task──▶ task queue
//!                                                      │ run()
//!                                                      ▼
//!   agent.act() ◀── assign_task (Request) ◀── process_task
//!       │
//!       └── Response(TaskResult) ──▶ message queue ──route──▶ complete_task
//!                                                      │
//!                            review_completed_tasks ───┴──▶ coordinate_review
//!                                                            └─ votes ─▶ Completed / Failed
//! ```
//!
//! | Module | Operations |
//! |--------|-----------|
//! | this | registry, projects, agent/reviewer selection, dependency check |
//! | `planning` | `decompose_task`, `assign_task` |
//! | `review` | `coordinate_review`, `handle_conflict`, `complete_task`, `record_review_vote` |
//! | `runner` | `run`, `stop`, `submit_task`, `send`, routing, `process_task` |
//!
//! Registry and projects sit behind `RwLock`s held only for short sections
//! that clone what they need before any `.await`.

mod planning;
mod review;
mod runner;

pub use runner::OrchestratorHandle;

use crate::agent::Agent;
use crate::config::OrchestratorConfig;
use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger};
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::project_store::{ProjectStore, StoreError};
use conclave_domain::{ConsensusBuilder, DomainError, ProjectState, SubTask, TaskRef, TaskStatus};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors from orchestrator operations
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Project already exists: {0}")]
    ProjectExists(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Orchestrator is already running")]
    AlreadyRunning,

    #[error("No project store configured")]
    StoreNotConfigured,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// A review opened for a completed task
struct PendingReview {
    task: TaskRef,
    author: Option<String>,
    builder: ConsensusBuilder,
}

/// Coordinates agents, projects and reviews.
///
/// Shared as `Arc<Orchestrator>`; [`OrchestratorHandle`] is the cloneable
/// producer side of its queues.
pub struct Orchestrator {
    gateway: Arc<dyn LlmGateway>,
    config: OrchestratorConfig,
    store: Option<Arc<dyn ProjectStore>>,
    logger: Arc<dyn ConversationLogger>,
    agents: RwLock<Vec<Arc<Agent>>>,
    projects: RwLock<BTreeMap<String, ProjectState>>,
    reviews: Mutex<HashMap<String, PendingReview>>,
    /// Request message id → task being executed
    executions: Mutex<HashMap<String, TaskRef>>,
    task_tx: mpsc::UnboundedSender<TaskRef>,
    task_rx: Mutex<Option<mpsc::UnboundedReceiver<TaskRef>>>,
    message_tx: mpsc::UnboundedSender<conclave_domain::AgentMessage>,
    message_rx: Mutex<Option<mpsc::UnboundedReceiver<conclave_domain::AgentMessage>>>,
    cancel: CancellationToken,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl Orchestrator {
    pub fn new(gateway: Arc<dyn LlmGateway>, config: OrchestratorConfig) -> Self {
        let (task_tx, task_rx) = mpsc::unbounded_channel();
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        Self {
            gateway,
            config,
            store: None,
            logger: Arc::new(NoConversationLogger),
            agents: RwLock::new(Vec::new()),
            projects: RwLock::new(BTreeMap::new()),
            reviews: Mutex::new(HashMap::new()),
            executions: Mutex::new(HashMap::new()),
            task_tx,
            task_rx: Mutex::new(Some(task_rx)),
            message_tx,
            message_rx: Mutex::new(Some(message_rx)),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ProjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    fn log_event(&self, event_type: &'static str, payload: serde_json::Value) {
        self.logger.log(ConversationEvent::new(event_type, payload));
    }

    // ==================== Registry ====================

    /// Register an agent under its name.
    ///
    /// An agent with the same name is replaced in place, keeping its
    /// registration position.
    pub fn register_agent(&self, agent: impl Into<Arc<Agent>>) {
        let agent = agent.into();
        let mut agents = write(&self.agents);
        match agents.iter_mut().find(|a| a.name() == agent.name()) {
            Some(slot) => {
                info!("Replacing agent {}", agent.name());
                *slot = agent;
            }
            None => {
                info!("Registered agent {} ({})", agent.name(), agent.kind());
                agents.push(agent);
            }
        }
    }

    /// Remove an agent. Tasks already assigned to it are left as they are.
    pub fn unregister_agent(&self, name: &str) -> Option<Arc<Agent>> {
        let mut agents = write(&self.agents);
        let index = agents.iter().position(|a| a.name() == name)?;
        info!("Unregistered agent {}", name);
        Some(agents.remove(index))
    }

    pub fn agent(&self, name: &str) -> Option<Arc<Agent>> {
        read(&self.agents).iter().find(|a| a.name() == name).cloned()
    }

    /// Registered agents in registration order
    pub fn agents(&self) -> Vec<Arc<Agent>> {
        read(&self.agents).clone()
    }

    pub fn agent_names(&self) -> Vec<String> {
        read(&self.agents)
            .iter()
            .map(|a| a.name().to_string())
            .collect()
    }

    /// First agent with a capability tag occurring in `description`
    /// (case-insensitive), else the first registered agent.
    pub fn select_agent(&self, description: &str) -> Option<Arc<Agent>> {
        let agents = read(&self.agents);
        agents
            .iter()
            .find(|a| a.profile().matching_capability(description).is_some())
            .or_else(|| agents.first())
            .cloned()
    }

    /// The first security-role agent other than `author`, then other agents
    /// in registration order until `count` reviewers are chosen.
    pub fn select_reviewers(&self, author: &str, count: usize) -> Vec<Arc<Agent>> {
        let agents = read(&self.agents);
        let mut reviewers: Vec<Arc<Agent>> = agents
            .iter()
            .find(|a| a.name() != author && a.profile().has_security_role())
            .cloned()
            .into_iter()
            .collect();

        for agent in agents.iter() {
            if reviewers.len() >= count {
                break;
            }
            if agent.name() != author && !reviewers.iter().any(|r| r.name() == agent.name()) {
                reviewers.push(Arc::clone(agent));
            }
        }
        reviewers
    }

    // ==================== Projects ====================

    pub fn create_project(
        &self,
        project_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<ProjectState, OrchestratorError> {
        let project_id = project_id.into();
        let mut projects = write(&self.projects);
        if projects.contains_key(&project_id) {
            return Err(OrchestratorError::ProjectExists(project_id));
        }
        let project = ProjectState::new(project_id.clone(), name, description);
        projects.insert(project_id.clone(), project.clone());
        info!("Created project {}", project_id);
        Ok(project)
    }

    pub fn delete_project(&self, project_id: &str) -> bool {
        let removed = write(&self.projects).remove(project_id).is_some();
        if removed {
            info!("Deleted project {}", project_id);
        }
        removed
    }

    /// Snapshot of a project
    pub fn project(&self, project_id: &str) -> Option<ProjectState> {
        read(&self.projects).get(project_id).cloned()
    }

    pub fn project_ids(&self) -> Vec<String> {
        read(&self.projects).keys().cloned().collect()
    }

    /// Mutate a project in place
    pub fn update_project<R>(
        &self,
        project_id: &str,
        f: impl FnOnce(&mut ProjectState) -> R,
    ) -> Option<R> {
        write(&self.projects).get_mut(project_id).map(f)
    }

    /// Snapshot of one task
    pub fn task(&self, task: &TaskRef) -> Option<SubTask> {
        read(&self.projects)
            .get(&task.project_id)
            .and_then(|p| p.task(&task.task_id))
            .cloned()
    }

    /// Move a task along its lifecycle
    pub(crate) fn transition_task(
        &self,
        task: &TaskRef,
        next: TaskStatus,
    ) -> Result<(), OrchestratorError> {
        let mut projects = write(&self.projects);
        let project = projects
            .get_mut(&task.project_id)
            .ok_or_else(|| OrchestratorError::ProjectNotFound(task.project_id.clone()))?;
        project.require_task_mut(&task.task_id)?.transition_to(next)?;
        debug!("Task {} -> {}", task, next);
        Ok(())
    }

    pub async fn save_project(&self, project_id: &str) -> Result<(), OrchestratorError> {
        let store = self
            .store
            .as_ref()
            .ok_or(OrchestratorError::StoreNotConfigured)?;
        let project = self
            .project(project_id)
            .ok_or_else(|| OrchestratorError::ProjectNotFound(project_id.to_string()))?;
        store.save(&project).await?;
        info!("Saved project {}", project_id);
        Ok(())
    }

    /// Load a project from the store, replacing any in-memory copy
    pub async fn load_project(&self, project_id: &str) -> Result<ProjectState, OrchestratorError> {
        let store = self
            .store
            .as_ref()
            .ok_or(OrchestratorError::StoreNotConfigured)?;
        let project = store.load(project_id).await?;
        write(&self.projects).insert(project.project_id.clone(), project.clone());
        info!("Loaded project {} ({} tasks)", project_id, project.tasks.len());
        Ok(project)
    }

    // ==================== Dependencies ====================

    /// Every dependency of a task in `project_id` is Completed.
    ///
    /// A dependency id is looked up in `project_id` first. Only when it is
    /// not there are the other projects searched, and then every task with
    /// that id must be Completed. An id found in no project counts as met.
    pub fn dependencies_met(&self, project_id: &str, dependencies: &[String]) -> bool {
        let projects = read(&self.projects);
        dependencies_met_in(&projects, project_id, dependencies)
    }
}

pub(crate) fn dependencies_met_in(
    projects: &BTreeMap<String, ProjectState>,
    project_id: &str,
    dependencies: &[String],
) -> bool {
    dependencies.iter().all(|dep| {
        if let Some(task) = projects.get(project_id).and_then(|p| p.task(dep)) {
            return task.status == TaskStatus::Completed;
        }

        let mut elsewhere = projects
            .iter()
            .filter(|(id, _)| id.as_str() != project_id)
            .filter_map(|(_, p)| p.task(dep))
            .peekable();
        if elsewhere.peek().is_none() {
            debug!("Unknown dependency {} treated as met", dep);
            return true;
        }
        elsewhere.all(|task| task.status == TaskStatus::Completed)
    })
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        if !self.cancel.is_cancelled() {
            self.cancel.cancel();
        }
        let pending = lock(&self.reviews).len();
        if pending > 0 {
            warn!("Orchestrator dropped with {} open reviews", pending);
        }
    }
}
