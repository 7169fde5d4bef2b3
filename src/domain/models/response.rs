//! Result envelope of a single `process` call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token counts reported by the completion endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt: u64,
    pub completion: u64,
    pub total: u64,
}

impl TokenUsage {
    pub fn new(prompt: u64, completion: u64) -> Self {
        Self {
            prompt,
            completion,
            total: prompt + completion,
        }
    }
}

impl std::ops::Add for TokenUsage {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            prompt: self.prompt + rhs.prompt,
            completion: self.completion + rhs.completion,
            total: self.total + rhs.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Model that produced the content
    pub model: String,
    pub usage: TokenUsage,
    /// Serialized as RFC 3339 / ISO 8601
    pub timestamp: DateTime<Utc>,
}

/// Immutable output of an agent call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub content: String,
    pub metadata: ResponseMetadata,
}

impl AgentResponse {
    pub fn new(content: impl Into<String>, model: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            content: content.into(),
            metadata: ResponseMetadata {
                model: model.into(),
                usage,
                timestamp: Utc::now(),
            },
        }
    }
}
