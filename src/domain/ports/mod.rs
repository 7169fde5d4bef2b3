//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the interfaces the rest of the crate is written against:
//! - Agent: the agent contract (config, memory, `process`)
//! - CompletionClient: chat-completion backend operations
//!
//! Infrastructure adapters implement these so services stay independent of
//! a specific HTTP client or provider.

pub mod agent;
pub mod completion_client;

pub use agent::{Agent, AgentCore, TextStream};
pub use completion_client::{ChatMessage, ChatRequest, Completion, CompletionClient, ToolSpec};
