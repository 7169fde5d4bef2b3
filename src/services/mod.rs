//! Service layer: agents, orchestration, and text utilities built on the domain ports.

pub mod agent_factory;
pub mod agent_manager;
pub mod context_truncation;
pub mod cost_tracker;
pub mod dependency_resolver;
pub mod model_agent;
pub mod orchestrator;
pub mod output_extraction;
pub mod specialists;

pub use agent_factory::AgentFactory;
pub use agent_manager::AgentManager;
pub use context_truncation::{estimate_tokens, truncate_to_token_limit};
pub use cost_tracker::{estimate_cost, get_model_pricing, CostSummary, ModelPricing};
pub use dependency_resolver::DependencyResolver;
pub use model_agent::ModelAgent;
pub use orchestrator::{OrchestrationEvent, Orchestrator};
pub use output_extraction::{extract_code_blocks, extract_json, extract_list, CodeBlock};
pub use specialists::{
    AnalysisAgent, ContentGenerationAgent, ExtractionAgent, GenerationOptions,
    QuestionAnsweringAgent, Specialist, SummarizationAgent, SummaryFormat, SummaryLength,
    SummaryOptions, TranslationAgent,
};
