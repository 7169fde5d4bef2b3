use crate::domain::errors::AgentResult;
use crate::domain::models::AgentConfig;
use crate::domain::ports::Agent;
use crate::services::model_agent::ModelAgent;

use super::{delegate_agent, Specialist};

const SYSTEM_PROMPT: &str = "You are a professional translator. Translate faithfully, preserving \
meaning, tone, and formatting. Reply with the translation only.";

/// Translates text between languages (temperature 0.3)
pub struct TranslationAgent {
    inner: ModelAgent,
}

impl Specialist for TranslationAgent {
    const ID: &'static str = "translator";

    fn agent_config(model: &str) -> AgentConfig {
        AgentConfig::new("Translator", model)
            .with_description("Translates text into a target language")
            .with_temperature(0.3)
            .with_system_prompt(SYSTEM_PROMPT)
    }

    fn from_model_agent(agent: ModelAgent) -> Self {
        Self { inner: agent }
    }
}

delegate_agent!(TranslationAgent);

impl TranslationAgent {
    /// Translate `text` into `target`; the source language is detected when `None`.
    pub async fn translate(&self, text: &str, target: &str, source: Option<&str>) -> AgentResult<String> {
        let direction = match source {
            Some(source) => format!("from {source} to {target}"),
            None => format!("to {target}, detecting the source language automatically"),
        };
        let prompt = format!("Translate the following text {direction}.\n\nText:\n{text}");
        self.process(&prompt).await.map(|response| response.content)
    }
}
