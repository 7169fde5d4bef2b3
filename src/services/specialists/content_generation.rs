use serde::{Deserialize, Serialize};

use crate::domain::errors::AgentResult;
use crate::domain::models::AgentConfig;
use crate::domain::ports::{Agent, TextStream};
use crate::services::model_agent::ModelAgent;

use super::{delegate_agent, Specialist};

const SYSTEM_PROMPT: &str = "You are a skilled writer. Produce original, engaging content that \
follows the requested tone, style, and length.";

/// Optional shaping of generated content. Unset fields are left to the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    /// e.g. "formal", "friendly", "persuasive"
    pub tone: Option<String>,
    /// e.g. "blog post", "email", "technical"
    pub style: Option<String>,
    /// e.g. "short", "500 words"
    pub length: Option<String>,
}

impl GenerationOptions {
    fn requirements(&self) -> Vec<String> {
        [
            ("Tone", &self.tone),
            ("Style", &self.style),
            ("Length", &self.length),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.as_ref().map(|v| format!("{label}: {v}")))
        .collect()
    }
}

/// Generates new content from a prompt (temperature 0.8)
pub struct ContentGenerationAgent {
    inner: ModelAgent,
}

impl Specialist for ContentGenerationAgent {
    const ID: &'static str = "generator";

    fn agent_config(model: &str) -> AgentConfig {
        AgentConfig::new("Content Generator", model)
            .with_description("Writes articles, emails, posts and other content")
            .with_temperature(0.8)
            .with_system_prompt(SYSTEM_PROMPT)
    }

    fn from_model_agent(agent: ModelAgent) -> Self {
        Self { inner: agent }
    }
}

delegate_agent!(ContentGenerationAgent);

impl ContentGenerationAgent {
    pub fn build_prompt(prompt: &str, options: &GenerationOptions) -> String {
        let requirements = options.requirements();
        if requirements.is_empty() {
            prompt.to_string()
        } else {
            format!("{prompt}\n\nRequirements:\n- {}", requirements.join("\n- "))
        }
    }

    pub async fn generate(&self, prompt: &str, options: &GenerationOptions) -> AgentResult<String> {
        let prompt = Self::build_prompt(prompt, options);
        self.process(&prompt).await.map(|response| response.content)
    }

    /// Streaming variant of [`ContentGenerationAgent::generate`]. Options are
    /// applied beforehand with [`ContentGenerationAgent::build_prompt`].
    pub fn generate_stream<'a>(&'a self, prompt: &'a str) -> TextStream<'a> {
        self.process_stream(prompt)
    }
}
