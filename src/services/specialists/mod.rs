//! Pre-configured agents for common tasks.
//!
//! Each specialist wraps a [`ModelAgent`] with its own system prompt and
//! temperature, and adds a typed convenience method that folds its options
//! into the prompt and returns only the reply text.

use std::sync::Arc;

use crate::domain::models::AgentConfig;
use crate::domain::ports::{Agent, CompletionClient};

use super::model_agent::ModelAgent;

/// Implement [`Agent`] by delegating to the wrapped `inner` model agent.
macro_rules! delegate_agent {
    ($ty:ty) => {
        #[async_trait::async_trait]
        impl $crate::domain::ports::Agent for $ty {
            fn core(&self) -> &$crate::domain::ports::AgentCore {
                $crate::domain::ports::Agent::core(&self.inner)
            }

            async fn process(
                &self,
                input: &str,
            ) -> $crate::domain::errors::AgentResult<$crate::domain::models::AgentResponse> {
                $crate::domain::ports::Agent::process(&self.inner, input).await
            }

            fn process_stream<'a>(
                &'a self,
                input: &'a str,
            ) -> $crate::domain::ports::TextStream<'a> {
                $crate::domain::ports::Agent::process_stream(&self.inner, input)
            }
        }
    };
}
pub(crate) use delegate_agent;

pub mod analysis;
pub mod content_generation;
pub mod extraction;
pub mod question_answering;
pub mod summarization;
pub mod translation;

pub use analysis::AnalysisAgent;
pub use content_generation::{ContentGenerationAgent, GenerationOptions};
pub use extraction::ExtractionAgent;
pub use question_answering::QuestionAnsweringAgent;
pub use summarization::{SummarizationAgent, SummaryFormat, SummaryLength, SummaryOptions};
pub use translation::TranslationAgent;

/// A specialist's fixed identity and construction.
pub trait Specialist: Agent + Sized {
    /// Well-known registry id
    const ID: &'static str;

    /// Configuration for this specialist running on `model`.
    fn agent_config(model: &str) -> AgentConfig;

    /// Wrap an already configured model agent.
    fn from_model_agent(agent: ModelAgent) -> Self;

    fn new(client: Arc<dyn CompletionClient>, model: &str) -> Self {
        Self::from_model_agent(ModelAgent::new(Self::agent_config(model), client))
    }
}
