use crate::domain::errors::AgentResult;
use crate::domain::models::AgentConfig;
use crate::domain::ports::Agent;
use crate::services::model_agent::ModelAgent;

use super::{delegate_agent, Specialist};

const SYSTEM_PROMPT: &str = "You answer questions accurately and concisely. When context is \
provided, base your answer on it and say so if the context does not contain the answer.";

/// Answers questions, optionally grounded in supplied context (temperature 0.4)
pub struct QuestionAnsweringAgent {
    inner: ModelAgent,
}

impl Specialist for QuestionAnsweringAgent {
    const ID: &'static str = "qa";

    fn agent_config(model: &str) -> AgentConfig {
        AgentConfig::new("Question Answerer", model)
            .with_description("Answers questions about supplied context or general knowledge")
            .with_temperature(0.4)
            .with_system_prompt(SYSTEM_PROMPT)
    }

    fn from_model_agent(agent: ModelAgent) -> Self {
        Self { inner: agent }
    }
}

delegate_agent!(QuestionAnsweringAgent);

impl QuestionAnsweringAgent {
    pub async fn answer(&self, question: &str, context: Option<&str>) -> AgentResult<String> {
        let prompt = match context {
            Some(context) => format!(
                "Answer the question using the context below.\n\nContext:\n{context}\n\nQuestion: {question}"
            ),
            None => format!("Question: {question}"),
        };
        self.process(&prompt).await.map(|response| response.content)
    }
}
