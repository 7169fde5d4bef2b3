//! Agent port - the contract every agent implements.

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::errors::AgentResult;
use crate::domain::models::{AgentConfig, AgentMemory, AgentResponse, MemoryEntry, MemoryScope, Role};

/// Lazy, finite, non-restartable sequence of text fragments.
pub type TextStream<'a> = BoxStream<'a, AgentResult<String>>;

/// Configuration plus memory shared by every agent implementation.
///
/// Memory sits behind a mutex so agents can be shared across tokio worker
/// threads. The lock is never held across an `.await`.
#[derive(Debug)]
pub struct AgentCore {
    config: AgentConfig,
    memory: Mutex<AgentMemory>,
}

impl AgentCore {
    pub fn new(config: AgentConfig) -> Self {
        Self {
            config,
            memory: Mutex::new(AgentMemory::new()),
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Lock the memory. A poisoned lock still holds consistent data since
    /// every mutation is a single push/insert/clear.
    pub fn memory(&self) -> MutexGuard<'_, AgentMemory> {
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Base trait for all agents.
///
/// `process` is the single required operation; memory management is
/// provided on top of [`AgentCore`].
#[async_trait]
pub trait Agent: Send + Sync {
    /// Configuration and memory of this agent.
    fn core(&self) -> &AgentCore;

    /// Produce a response for `input`.
    async fn process(&self, input: &str) -> AgentResult<AgentResponse>;

    /// Produce a response incrementally.
    ///
    /// The default implementation yields the whole `process` output as a
    /// single fragment. Nothing runs until the stream is first polled.
    fn process_stream<'a>(&'a self, input: &'a str) -> TextStream<'a> {
        Box::pin(futures::stream::once(async move {
            self.process(input).await.map(|response| response.content)
        }))
    }

    fn config(&self) -> &AgentConfig {
        self.core().config()
    }

    fn name(&self) -> &str {
        &self.core().config().name
    }

    /// Append a turn to short-term memory with a generated timestamp.
    fn add_to_memory(&self, role: Role, content: &str) {
        self.core().memory().push(role, content);
    }

    /// Snapshot of short-term memory, oldest first.
    fn history(&self) -> Vec<MemoryEntry> {
        self.core().memory().short_term().to_vec()
    }

    fn clear_memory(&self, scope: MemoryScope) {
        self.core().memory().clear(scope);
    }

    fn set_context(&self, key: &str, value: serde_json::Value) {
        self.core().memory().set_context(key, value);
    }

    fn get_context(&self, key: &str) -> Option<serde_json::Value> {
        self.core().memory().get_context(key).cloned()
    }
}
