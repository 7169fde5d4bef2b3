//! Wire types of the chat-completion endpoint.
//!
//! Only the fields the core reads are modelled; everything else in the
//! response body is ignored.

use serde::Deserialize;

use crate::domain::errors::{AgentError, AgentResult};
use crate::domain::models::TokenUsage;
use crate::domain::ports::Completion;

/// Non-streaming response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    /// Null when the model answered with tool calls only
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl From<Usage> for TokenUsage {
    fn from(usage: Usage) -> Self {
        Self {
            prompt: usage.prompt_tokens,
            completion: usage.completion_tokens,
            total: usage.total_tokens,
        }
    }
}

impl ChatCompletionResponse {
    /// Keep the first choice's content and the usage counters.
    pub fn into_completion(self) -> AgentResult<Completion> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::InvalidResponse("response contains no choices".to_string()))?;

        Ok(Completion {
            content: choice.message.content.unwrap_or_default(),
            model: self.model,
            usage: self.usage.unwrap_or_default().into(),
        })
    }
}

/// One `data:` payload of a streaming response.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub delta: Delta,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub content: Option<String>,
}

impl StreamChunk {
    /// Text carried by the first choice's delta, if non-empty.
    pub fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|text| !text.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_from_full_body() {
        let body = r#"{
            "id": "chatcmpl-1",
            "model": "gpt-4o-mini-2024",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Hello"}, "finish_reason": "stop"},
                {"index": 1, "message": {"role": "assistant", "content": "ignored"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }"#;

        let completion = serde_json::from_str::<ChatCompletionResponse>(body)
            .unwrap()
            .into_completion()
            .unwrap();

        assert_eq!(completion.content, "Hello");
        assert_eq!(completion.model.as_deref(), Some("gpt-4o-mini-2024"));
        assert_eq!(completion.usage, TokenUsage::new(12, 3));
    }

    #[test]
    fn test_missing_usage_defaults_to_zero() {
        let body = r#"{"choices": [{"message": {"content": "ok"}}]}"#;
        let completion = serde_json::from_str::<ChatCompletionResponse>(body)
            .unwrap()
            .into_completion()
            .unwrap();
        assert_eq!(completion.usage, TokenUsage::default());
        assert!(completion.model.is_none());
    }

    #[test]
    fn test_empty_choices_is_invalid() {
        let body = r#"{"choices": []}"#;
        let err = serde_json::from_str::<ChatCompletionResponse>(body)
            .unwrap()
            .into_completion()
            .unwrap_err();
        assert!(matches!(err, AgentError::InvalidResponse(_)));
    }

    #[test]
    fn test_stream_chunk_text() {
        let chunk: StreamChunk =
            serde_json::from_str(r#"{"choices":[{"index":0,"delta":{"content":"Hel"}}]}"#).unwrap();
        assert_eq!(chunk.into_text().as_deref(), Some("Hel"));

        let role_only: StreamChunk =
            serde_json::from_str(r#"{"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#).unwrap();
        assert!(role_only.into_text().is_none());
    }
}
