//! Completion client port - interface to a chat-completion endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::AgentResult;
use crate::domain::models::{Role, TokenUsage, ToolDeclaration};

use super::agent::TextStream;

/// A single message of a chat-completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Request body sent to the completion endpoint.
///
/// Serializes to `{model, temperature, max_tokens, messages, tools?, stream?}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub messages: Vec<ChatMessage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolSpec>>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

/// Tool entry in the wire format (`{"type": "function", "function": {...}}`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub tool_type: &'static str,
    pub function: ToolDeclaration,
}

impl From<&ToolDeclaration> for ToolSpec {
    fn from(tool: &ToolDeclaration) -> Self {
        Self {
            tool_type: "function",
            function: tool.clone(),
        }
    }
}

/// The parts of a successful completion the core cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// First choice's message content
    pub content: String,
    /// Model reported by the endpoint
    pub model: Option<String>,
    pub usage: TokenUsage,
}

/// Trait for chat-completion backends.
///
/// Implementations translate transport failures into the
/// [`AgentError`](crate::domain::errors::AgentError) taxonomy.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Issue a single non-streaming request.
    async fn complete(&self, request: &ChatRequest) -> AgentResult<Completion>;

    /// Issue a streaming request.
    ///
    /// Returns once response headers arrive. A non-2xx status is an `Err`
    /// here; failures after that point surface as stream items.
    async fn complete_stream(&self, request: &ChatRequest) -> AgentResult<TextStream<'static>>;
}
