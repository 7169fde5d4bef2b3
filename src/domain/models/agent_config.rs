//! Agent configuration.
//!
//! An [`AgentConfig`] is built once, handed to the agent that owns it,
//! and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Default model identifier for agents that do not name one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default maximum output size in tokens.
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// A tool the model may call, declared in the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    /// JSON schema of the tool arguments
    #[serde(default)]
    pub parameters: serde_json::Value,
}

impl ToolDeclaration {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Immutable agent configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Human-readable agent name
    pub name: String,

    /// What the agent is for
    #[serde(default)]
    pub description: String,

    /// Target model identifier
    pub model: String,

    /// Sampling temperature (0.0-2.0)
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// System prompt placed before the conversation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Tool declarations forwarded to the endpoint
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDeclaration>,
}

impl AgentConfig {
    /// Create a configuration with default sampling settings.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            model: model.into(),
            temperature: 0.7,
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: None,
            tools: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_tool(mut self, tool: ToolDeclaration) -> Self {
        self.tools.push(tool);
        self
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new("agent", DEFAULT_MODEL)
    }
}
