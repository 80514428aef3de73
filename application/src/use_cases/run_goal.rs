//! Run Goal use case.
//!
//! Drives one goal end to end: create a project, decompose the goal into
//! subtasks, queue them and let the [`Orchestrator`] run loop execute them
//! until every task is Completed or Failed, or the wait budget runs out.

use crate::orchestrator::{Orchestrator, OrchestratorError};
use conclave_domain::core::id::generate_short_id;
use conclave_domain::core::string::truncate;
use conclave_domain::{ProjectState, SubTask, TaskRef};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

/// How often the project is checked for completion
const PROGRESS_POLL: Duration = Duration::from_millis(50);

#[derive(Error, Debug)]
pub enum RunGoalError {
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    #[error("Project {0} vanished while running")]
    ProjectVanished(String),
}

/// Input for the [`RunGoalUseCase`].
#[derive(Debug, Clone)]
pub struct RunGoalInput {
    pub project_id: String,
    pub goal: String,
    /// Upper bound on the time spent waiting for tasks.
    pub max_wait: Duration,
    /// Persist the final project state through the orchestrator's store.
    pub save: bool,
}

impl RunGoalInput {
    pub fn new(project_id: impl Into<String>, goal: impl Into<String>, max_wait: Duration) -> Self {
        Self {
            project_id: project_id.into(),
            goal: goal.into(),
            max_wait,
            save: false,
        }
    }

    pub fn with_save(mut self, save: bool) -> Self {
        self.save = save;
        self
    }
}

/// Final state of a goal run
#[derive(Debug, Clone)]
pub struct RunGoalOutput {
    pub project: ProjectState,
    /// Every task reached Completed or Failed before `max_wait`.
    pub finished: bool,
    pub elapsed: Duration,
}

/// Use case for running a goal through the orchestrator.
///
/// 1. Create the project
/// 2. [`decompose_task`](Orchestrator::decompose_task) the goal
/// 3. Queue the subtasks and start [`run`](Orchestrator::run)
/// 4. Wait until the project is finished or `max_wait` elapses, then stop
#[derive(Clone)]
pub struct RunGoalUseCase {
    orchestrator: Arc<Orchestrator>,
}

impl RunGoalUseCase {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }

    pub async fn execute(&self, input: RunGoalInput) -> Result<RunGoalOutput, RunGoalError> {
        let started = Instant::now();
        info!(
            "Running goal in project {}: {}",
            input.project_id,
            truncate(&input.goal, 100)
        );

        self.orchestrator
            .create_project(&input.project_id, truncate(&input.goal, 60), &input.goal)?;

        let root_id = generate_short_id();
        let subtasks = self
            .orchestrator
            .decompose_task(&root_id, &input.goal, &input.project_id)
            .await;

        let finished = if subtasks.is_empty() {
            info!("Goal in project {} needs no subtasks", input.project_id);
            true
        } else {
            self.run_until_finished(&input, &subtasks, started).await?
        };

        if input.save {
            self.orchestrator.save_project(&input.project_id).await?;
        }

        let project = self
            .orchestrator
            .project(&input.project_id)
            .ok_or_else(|| RunGoalError::ProjectVanished(input.project_id.clone()))?;
        let elapsed = started.elapsed();
        info!(
            "Goal in project {} {} after {:?}: {:?}",
            input.project_id,
            if finished { "finished" } else { "stopped" },
            elapsed,
            project.status_counts()
        );

        Ok(RunGoalOutput {
            project,
            finished,
            elapsed,
        })
    }

    /// Queue `subtasks`, run the loop and wait for the project to finish.
    ///
    /// Returns `false` when `max_wait` elapsed or the run was stopped first.
    async fn run_until_finished(
        &self,
        input: &RunGoalInput,
        subtasks: &[SubTask],
        started: Instant,
    ) -> Result<bool, RunGoalError> {
        let handle = self.orchestrator.handle();
        for task in subtasks {
            handle.submit_task(TaskRef::new(&input.project_id, &task.task_id));
        }

        let runner = tokio::spawn({
            let orchestrator = Arc::clone(&self.orchestrator);
            async move { orchestrator.run().await }
        });

        let deadline = started + input.max_wait;
        let finished = loop {
            if self
                .orchestrator
                .project(&input.project_id)
                .is_some_and(|p| p.is_finished())
            {
                break true;
            }
            if Instant::now() >= deadline {
                warn!(
                    "Goal in project {} not finished after {:?}",
                    input.project_id, input.max_wait
                );
                break false;
            }
            if handle.is_stopped() {
                warn!("Orchestrator stopped before goal in project {} finished", input.project_id);
                break false;
            }
            tokio::time::sleep(PROGRESS_POLL).await;
        };

        handle.stop();
        match runner.await {
            Ok(result) => result?,
            Err(e) => warn!("Run loop ended abnormally: {}", e),
        }

        Ok(finished)
    }
}
