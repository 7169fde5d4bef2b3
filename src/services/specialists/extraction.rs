use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::errors::{AgentError, AgentResult};
use crate::domain::models::AgentConfig;
use crate::domain::ports::Agent;
use crate::services::model_agent::ModelAgent;
use crate::services::output_extraction::extract_json_object;

use super::{delegate_agent, Specialist};

const SYSTEM_PROMPT: &str = "You extract structured data from text. Reply with a single JSON \
object and nothing else. Copy values literally from the text; use null when a value is not present.";

/// Pulls named fields out of free text (temperature 0.1)
pub struct ExtractionAgent {
    inner: ModelAgent,
}

impl Specialist for ExtractionAgent {
    const ID: &'static str = "extractor";

    fn agent_config(model: &str) -> AgentConfig {
        AgentConfig::new("Extractor", model)
            .with_description("Extracts named fields from text as JSON")
            .with_temperature(0.1)
            .with_system_prompt(SYSTEM_PROMPT)
    }

    fn from_model_agent(agent: ModelAgent) -> Self {
        Self { inner: agent }
    }
}

delegate_agent!(ExtractionAgent);

impl ExtractionAgent {
    /// Extract `fields` from `content`.
    ///
    /// The result has exactly one entry per requested field; fields the
    /// model did not return are `null`, extra keys are dropped. A reply
    /// without a JSON object is [`AgentError::InvalidResponse`].
    pub async fn extract<S: AsRef<str>>(
        &self,
        content: &str,
        fields: &[S],
    ) -> AgentResult<Map<String, Value>> {
        let names: Vec<&str> = fields.iter().map(AsRef::as_ref).collect();
        let prompt = format!(
            "Extract the following fields from the content: {}.\n\
             Respond with a JSON object whose keys are exactly these field names.\n\nContent:\n{}",
            names.join(", "),
            content
        );

        let response = self.process(&prompt).await?;
        let mut parsed = extract_json_object(&response.content).ok_or_else(|| {
            warn!(reply_len = response.content.len(), "Extraction reply contained no JSON object");
            AgentError::InvalidResponse("extraction reply contained no JSON object".to_string())
        })?;

        Ok(names
            .into_iter()
            .map(|name| (name.to_string(), parsed.remove(name).unwrap_or(Value::Null)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::specialists::test_support::FixedReply;
    use serde_json::json;

    #[tokio::test]
    async fn test_extract_one_entry_per_field() {
        let client = FixedReply::new(
            "Here you go:\n```json\n{\"name\": \"Ada\", \"city\": \"London\", \"extra\": 1}\n```",
        );
        let agent = ExtractionAgent::new(client.clone(), "gpt-4o-mini");

        let fields = agent
            .extract("Ada lives in London.", &["name", "city", "email"])
            .await
            .unwrap();

        assert_eq!(fields.len(), 3);
        assert_eq!(fields["name"], json!("Ada"));
        assert_eq!(fields["city"], json!("London"));
        assert_eq!(fields["email"], Value::Null);
        assert!(!fields.contains_key("extra"));
        assert!(client.last_prompt().contains("name, city, email"));
        assert!((client.last_request().temperature - 0.1).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_reply_without_json_is_invalid() {
        let agent = ExtractionAgent::new(FixedReply::new("I could not find anything."), "gpt-4o-mini");
        let err = agent.extract("text", &["name"]).await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidResponse(_)));
    }
}
