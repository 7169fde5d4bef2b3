//! Domain errors for the agent core.

use thiserror::Error;

/// Format a cycle path as a human-readable string: `A -> B -> C -> A`.
fn format_cycle_path(path: &[String]) -> String {
    path.join(" -> ")
}

/// Errors raised by agents and the completion layer beneath them.
#[derive(Debug, Error)]
pub enum AgentError {
    /// A required setting (usually the API credential) is missing.
    /// Raised before any network attempt.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The completion endpoint answered with a non-2xx status.
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The request never produced a response (DNS, connect, transport).
    #[error("Network error: {0}")]
    Network(String),

    /// A 2xx response whose body could not be interpreted.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),
}

impl AgentError {
    /// Returns true if this error is transient and worth retrying.
    ///
    /// Network failures, request timeouts (408), rate limiting (429)
    /// and server errors (5xx) are transient; everything else is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status, .. } => *status == 408 || *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// HTTP status carried by an [`AgentError::Api`], if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

pub type AgentResult<T> = Result<T, AgentError>;

/// Errors that reject a whole orchestration request before any task runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrchestrationError {
    #[error("Duplicate task id: {0}")]
    DuplicateTask(String),

    #[error("Task {task} depends on unknown task {dependency}")]
    UnknownDependency { task: String, dependency: String },

    #[error("Task dependency cycle detected: {}", format_cycle_path(.0))]
    DependencyCycle(Vec<String>),
}

pub type PlanningResult<T> = Result<T, OrchestrationError>;
