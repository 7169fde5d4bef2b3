pub mod agent_config;
pub mod config;
pub mod memory;
pub mod orchestration;
pub mod response;

pub use agent_config::{AgentConfig, ToolDeclaration, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
pub use config::{
    Config, LlmConfig, LoggingConfig, MemoryConfig, OrchestratorConfig, RateLimitConfig,
    RetryConfig,
};
pub use memory::{AgentMemory, MemoryEntry, MemoryScope, Role};
pub use orchestration::{
    FailureKind, OrchestrationPlan, OrchestrationResult, OrchestrationState, OrchestrationTask,
    TaskFailure, TaskOutcome,
};
pub use response::{AgentResponse, ResponseMetadata, TokenUsage};
