//! Orchestration domain models.
//!
//! Callers submit an unordered set of [`OrchestrationTask`]s; the orchestrator
//! layers them into an [`OrchestrationPlan`] and returns an
//! [`OrchestrationResult`] holding exactly one [`TaskOutcome`] per task.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::response::{AgentResponse, TokenUsage};

/// A unit of agent work with declared dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OrchestrationTask {
    /// Unique within one submission
    pub id: String,

    /// Registry id of the agent that runs this task
    #[serde(alias = "agentId")]
    pub agent_id: String,

    /// Input payload; dependency outputs are appended before dispatch
    pub input: String,

    #[serde(default, alias = "dependsOn")]
    pub depends_on: Vec<String>,
}

impl OrchestrationTask {
    pub fn new(id: impl Into<String>, agent_id: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            agent_id: agent_id.into(),
            input: input.into(),
            depends_on: Vec::new(),
        }
    }

    pub fn depends_on(mut self, task_id: impl Into<String>) -> Self {
        self.depends_on.push(task_id.into());
        self
    }
}

/// Dependency-respecting execution waves.
///
/// Every task in wave `k` depends only on tasks in waves `< k`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrchestrationPlan {
    pub waves: Vec<Vec<String>>,
}

impl OrchestrationPlan {
    pub fn wave_count(&self) -> usize {
        self.waves.len()
    }

    pub fn task_count(&self) -> usize {
        self.waves.iter().map(Vec::len).sum()
    }

    /// Index of the wave containing `task_id`.
    pub fn wave_of(&self, task_id: &str) -> Option<usize> {
        self.waves
            .iter()
            .position(|wave| wave.iter().any(|id| id == task_id))
    }
}

/// Lifecycle of one orchestration request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationState {
    Received,
    Planned,
    Executing,
    Completed,
    /// Planning rejected the request; nothing was dispatched.
    Failed,
}

impl OrchestrationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Why a task did not produce a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    /// The agent call itself failed.
    AgentFailed,
    /// No agent is registered under the task's agent id.
    AgentNotFound,
    /// Skipped without dispatch because a dependency did not complete.
    DependencyFailed { dependency: String },
}

/// Per-task failure record. Never thrown; stored in the result map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskFailure {
    #[serde(flatten)]
    pub kind: FailureKind,
    pub message: String,
}

impl TaskFailure {
    pub fn agent_failed(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::AgentFailed,
            message: message.into(),
        }
    }

    pub fn agent_not_found(agent_id: &str) -> Self {
        Self {
            kind: FailureKind::AgentNotFound,
            message: format!("Agent not found: {agent_id}"),
        }
    }

    pub fn dependency_failed(dependency: impl Into<String>) -> Self {
        let dependency = dependency.into();
        Self {
            message: format!("Skipped: dependency {dependency} did not complete"),
            kind: FailureKind::DependencyFailed { dependency },
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self.kind, FailureKind::DependencyFailed { .. })
    }
}

/// Outcome of a single task.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    Completed { response: AgentResponse },
    Failed { failure: TaskFailure },
}

impl TaskOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn response(&self) -> Option<&AgentResponse> {
        match self {
            Self::Completed { response } => Some(response),
            Self::Failed { .. } => None,
        }
    }

    pub fn failure(&self) -> Option<&TaskFailure> {
        match self {
            Self::Completed { .. } => None,
            Self::Failed { failure } => Some(failure),
        }
    }
}

/// Aggregated outcomes of one orchestration request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrchestrationResult {
    pub outcomes: HashMap<String, TaskOutcome>,
}

impl OrchestrationResult {
    pub fn get(&self, task_id: &str) -> Option<&TaskOutcome> {
        self.outcomes.get(task_id)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn completed_count(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_completed()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .values()
            .filter_map(TaskOutcome::failure)
            .filter(|f| f.is_skip())
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.len() - self.completed_count() - self.skipped_count()
    }

    pub fn all_completed(&self) -> bool {
        self.completed_count() == self.len()
    }

    /// Sum of token usage over completed tasks.
    pub fn total_usage(&self) -> TokenUsage {
        self.outcomes
            .values()
            .filter_map(TaskOutcome::response)
            .fold(TokenUsage::default(), |acc, r| acc + r.metadata.usage)
    }
}
