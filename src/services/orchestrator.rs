//! Wave-based execution of orchestration task graphs.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::PlanningResult;
use crate::domain::models::{
    OrchestrationPlan, OrchestrationResult, OrchestrationState, OrchestrationTask, TaskFailure,
    TaskOutcome,
};
use crate::domain::ports::Agent;

use super::agent_factory::AgentFactory;
use super::dependency_resolver::DependencyResolver;

/// Default number of tasks of one wave running at once.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Progress notification emitted while a request runs.
#[derive(Debug, Clone, PartialEq)]
pub enum OrchestrationEvent {
    StateChanged { state: OrchestrationState },
    Planned { total_tasks: usize, wave_count: usize },
    WaveStarted { wave_number: usize, task_count: usize },
    TaskCompleted { task_id: String, agent_id: String },
    TaskFailed { task_id: String, error: String },
    /// Not dispatched because `dependency` did not complete
    TaskSkipped { task_id: String, dependency: String },
    WaveCompleted { wave_number: usize, succeeded: usize, failed: usize, skipped: usize },
}

/// Runs sets of [`OrchestrationTask`]s against agents from an [`AgentFactory`].
///
/// Tasks of one wave run concurrently, up to `max_concurrency` at a time.
/// A failed task only affects its transitive dependents, which are recorded
/// as skipped without being dispatched.
pub struct Orchestrator {
    factory: Arc<AgentFactory>,
    resolver: DependencyResolver,
    max_concurrency: usize,
    events: Option<mpsc::UnboundedSender<OrchestrationEvent>>,
}

impl Orchestrator {
    pub fn new(factory: Arc<AgentFactory>) -> Self {
        Self {
            factory,
            resolver: DependencyResolver::new(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            events: None,
        }
    }

    /// A `max_concurrency` of zero is treated as one.
    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Send progress events to `events`. A dropped receiver is ignored.
    #[must_use]
    pub fn with_events(mut self, events: mpsc::UnboundedSender<OrchestrationEvent>) -> Self {
        self.events = Some(events);
        self
    }

    fn emit(&self, event: OrchestrationEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }

    fn set_state(&self, state: OrchestrationState) {
        self.emit(OrchestrationEvent::StateChanged { state });
    }

    /// Validate and order `tasks` without running anything.
    pub fn plan(&self, tasks: &[OrchestrationTask]) -> PlanningResult<OrchestrationPlan> {
        self.resolver.plan(tasks)
    }

    /// Run every task and return one outcome per task.
    ///
    /// A planning error (duplicate id, unknown dependency, cycle) rejects
    /// the request before any agent is called.
    #[instrument(skip(self, tasks), fields(run_id = %Uuid::new_v4(), tasks = tasks.len()))]
    pub async fn execute(&self, tasks: &[OrchestrationTask]) -> PlanningResult<OrchestrationResult> {
        self.set_state(OrchestrationState::Received);

        let plan = match self.plan(tasks) {
            Ok(plan) => plan,
            Err(err) => {
                warn!(error = %err, "Orchestration rejected");
                self.set_state(OrchestrationState::Failed);
                return Err(err);
            }
        };
        self.set_state(OrchestrationState::Planned);
        self.emit(OrchestrationEvent::Planned {
            total_tasks: plan.task_count(),
            wave_count: plan.wave_count(),
        });
        info!(waves = plan.wave_count(), "Orchestration planned");

        self.set_state(OrchestrationState::Executing);
        let by_id: HashMap<&str, &OrchestrationTask> =
            tasks.iter().map(|task| (task.id.as_str(), task)).collect();
        let mut outcomes: HashMap<String, TaskOutcome> = HashMap::with_capacity(tasks.len());

        for (wave_idx, wave) in plan.waves.iter().enumerate() {
            let wave_number = wave_idx + 1;
            self.emit(OrchestrationEvent::WaveStarted {
                wave_number,
                task_count: wave.len(),
            });

            let wave_tasks: Vec<&OrchestrationTask> = wave
                .iter()
                .filter_map(|id| by_id.get(id.as_str()).copied())
                .collect();
            let wave_outcomes = self.execute_wave(&wave_tasks, &outcomes).await;

            let (mut succeeded, mut failed, mut skipped) = (0, 0, 0);
            for (task_id, outcome) in wave_outcomes {
                match &outcome {
                    TaskOutcome::Completed { .. } => succeeded += 1,
                    TaskOutcome::Failed { failure } if failure.is_skip() => skipped += 1,
                    TaskOutcome::Failed { .. } => failed += 1,
                }
                outcomes.insert(task_id, outcome);
            }

            self.emit(OrchestrationEvent::WaveCompleted {
                wave_number,
                succeeded,
                failed,
                skipped,
            });
        }

        let result = OrchestrationResult { outcomes };
        info!(
            completed = result.completed_count(),
            failed = result.failed_count(),
            skipped = result.skipped_count(),
            "Orchestration finished"
        );
        self.set_state(OrchestrationState::Completed);
        Ok(result)
    }

    /// Dispatch one wave, returning outcomes in wave order.
    async fn execute_wave(
        &self,
        wave: &[&OrchestrationTask],
        finished: &HashMap<String, TaskOutcome>,
    ) -> Vec<(String, TaskOutcome)> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut results = Vec::with_capacity(wave.len());
        let mut handles = Vec::new();

        for task in wave {
            if let Some(dependency) = task
                .depends_on
                .iter()
                .find(|dep| !finished.get(dep.as_str()).is_some_and(TaskOutcome::is_completed))
            {
                self.emit(OrchestrationEvent::TaskSkipped {
                    task_id: task.id.clone(),
                    dependency: dependency.clone(),
                });
                results.push((
                    task.id.clone(),
                    TaskOutcome::Failed {
                        failure: TaskFailure::dependency_failed(dependency.clone()),
                    },
                ));
                continue;
            }

            let Some(agent) = self.factory.get_agent(&task.agent_id) else {
                let failure = TaskFailure::agent_not_found(&task.agent_id);
                self.emit(OrchestrationEvent::TaskFailed {
                    task_id: task.id.clone(),
                    error: failure.message.clone(),
                });
                results.push((task.id.clone(), TaskOutcome::Failed { failure }));
                continue;
            };

            let input = compose_input(task, finished);
            let semaphore = semaphore.clone();
            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                agent.process(&input).await
            });
            handles.push((*task, handle));
        }

        for (task, handle) in handles {
            let outcome = match handle.await {
                Ok(Ok(response)) => {
                    self.emit(OrchestrationEvent::TaskCompleted {
                        task_id: task.id.clone(),
                        agent_id: task.agent_id.clone(),
                    });
                    TaskOutcome::Completed { response }
                }
                Ok(Err(err)) => self.task_failed(task, err.to_string()),
                Err(join_err) => self.task_failed(task, format!("task aborted: {join_err}")),
            };
            results.push((task.id.clone(), outcome));
        }

        results
    }

    fn task_failed(&self, task: &OrchestrationTask, error: String) -> TaskOutcome {
        warn!(task_id = %task.id, agent_id = %task.agent_id, error = %error, "Task failed");
        self.emit(OrchestrationEvent::TaskFailed {
            task_id: task.id.clone(),
            error: error.clone(),
        });
        TaskOutcome::Failed {
            failure: TaskFailure::agent_failed(error),
        }
    }
}

/// The task's input followed by one labelled section per dependency
/// output, in `depends_on` order.
pub fn compose_input(task: &OrchestrationTask, finished: &HashMap<String, TaskOutcome>) -> String {
    let mut input = task.input.clone();
    for dependency in &task.depends_on {
        if let Some(response) = finished.get(dependency).and_then(TaskOutcome::response) {
            let _ = write!(
                input,
                "\n\n--- Output of task '{dependency}' ---\n{}",
                response.content
            );
        }
    }
    input
}
