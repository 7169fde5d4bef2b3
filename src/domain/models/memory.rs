//! Agent memory model.
//!
//! Two independently clearable partitions:
//! - Short-term: the ordered conversation, replayed on every call
//! - Long-term: key/value context that outlives conversation resets

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Speaker of a conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn of short-term memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl MemoryEntry {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Which partition(s) a clear affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryScope {
    ShortTerm,
    LongTerm,
    #[default]
    All,
}

impl MemoryScope {
    fn includes_short_term(self) -> bool {
        matches!(self, Self::ShortTerm | Self::All)
    }

    fn includes_long_term(self) -> bool {
        matches!(self, Self::LongTerm | Self::All)
    }
}

/// Process-lifetime memory owned by a single agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentMemory {
    short_term: Vec<MemoryEntry>,
    long_term: HashMap<String, serde_json::Value>,
}

impl AgentMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn with a fresh timestamp.
    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.short_term.push(MemoryEntry::new(role, content));
    }

    /// The conversation so far, oldest first.
    pub fn short_term(&self) -> &[MemoryEntry] {
        &self.short_term
    }

    pub fn set_context(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.long_term.insert(key.into(), value);
    }

    pub fn get_context(&self, key: &str) -> Option<&serde_json::Value> {
        self.long_term.get(key)
    }

    pub fn long_term(&self) -> &HashMap<String, serde_json::Value> {
        &self.long_term
    }

    pub fn clear(&mut self, scope: MemoryScope) {
        if scope.includes_short_term() {
            self.short_term.clear();
        }
        if scope.includes_long_term() {
            self.long_term.clear();
        }
    }
}
