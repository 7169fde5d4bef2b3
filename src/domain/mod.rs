//! Domain layer for the agent core
//!
//! This module contains the core models, errors, and port traits.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{AgentError, AgentResult, OrchestrationError, PlanningResult};
