//! agentcore - agent orchestration and execution core
//!
//! LLM-backed agents with conversational memory, a registry of named agents,
//! and an orchestrator that runs dependency-ordered task graphs against them.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors, and the `Agent` / `CompletionClient` ports
//! - **Infrastructure Layer** (`infrastructure`): HTTP completion client, retry, rate limiting,
//!   templating, validation, configuration, logging
//! - **Service Layer** (`services`): model-backed and specialized agents, factory,
//!   orchestrator, manager facade, text utilities
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use agentcore::services::{AgentManager, SummaryOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let manager = AgentManager::global()?;
//!     let summary = manager.summarize("Long text...", SummaryOptions::default()).await?;
//!     println!("{summary}");
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{AgentError, AgentResult, OrchestrationError, PlanningResult};
pub use domain::models::{
    AgentConfig, AgentResponse, Config, OrchestrationResult, OrchestrationTask, TaskOutcome,
    TokenUsage,
};
pub use domain::ports::{Agent, CompletionClient};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::llm::HttpCompletionClient;
pub use services::{AgentFactory, AgentManager, ModelAgent, Orchestrator};
