use crate::domain::errors::AgentResult;
use crate::domain::models::AgentConfig;
use crate::domain::ports::Agent;
use crate::services::model_agent::ModelAgent;

use super::{delegate_agent, Specialist};

const SYSTEM_PROMPT: &str = "You are an analytical assistant. Examine content critically, \
support every observation with evidence from the text, and organize your findings clearly.";

/// Analyzes content along requested dimensions (temperature 0.5)
pub struct AnalysisAgent {
    inner: ModelAgent,
}

impl Specialist for AnalysisAgent {
    const ID: &'static str = "analyzer";

    fn agent_config(model: &str) -> AgentConfig {
        AgentConfig::new("Analyzer", model)
            .with_description("Analyzes sentiment, themes, structure and other aspects of text")
            .with_temperature(0.5)
            .with_system_prompt(SYSTEM_PROMPT)
    }

    fn from_model_agent(agent: ModelAgent) -> Self {
        Self { inner: agent }
    }
}

delegate_agent!(AnalysisAgent);

impl AnalysisAgent {
    /// Analyze `content`; with no `aspects`, a general analysis is requested.
    pub async fn analyze<S: AsRef<str>>(&self, content: &str, aspects: &[S]) -> AgentResult<String> {
        let focus = if aspects.is_empty() {
            "Provide a comprehensive analysis covering its main themes, tone, and key insights."
                .to_string()
        } else {
            let list: Vec<&str> = aspects.iter().map(AsRef::as_ref).collect();
            format!(
                "Analyze it with respect to the following aspects: {}. Address each aspect in its own section.",
                list.join(", ")
            )
        };

        let prompt = format!("Analyze the following content. {focus}\n\nContent:\n{content}");
        self.process(&prompt).await.map(|response| response.content)
    }
}
