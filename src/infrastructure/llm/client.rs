//! HTTP client for OpenAI-compatible chat-completion endpoints.

use async_trait::async_trait;
use reqwest::{header, Client as ReqwestClient, Response};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{AgentError, AgentResult};
use crate::domain::models::LlmConfig;
use crate::domain::ports::{ChatRequest, Completion, CompletionClient, TextStream};

use super::streaming::SseStreamParser;
use super::types::ChatCompletionResponse;

/// Connection settings of [`HttpCompletionClient`].
#[derive(Debug, Clone)]
pub struct CompletionClientConfig {
    /// Base URL; `/chat/completions` is appended
    pub base_url: String,
    /// Explicit credential, checked before `api_key_env`
    pub api_key: Option<String>,
    /// Environment variable holding the credential
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for CompletionClientConfig {
    fn default() -> Self {
        Self::from(&LlmConfig::default())
    }
}

impl From<&LlmConfig> for CompletionClientConfig {
    fn from(config: &LlmConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            api_key_env: config.api_key_env.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

/// Redact a credential for logging, keeping a short prefix.
pub fn redact_key(key: &str) -> String {
    match key.get(..8) {
        Some(prefix) if key.len() > 12 => format!("{prefix}...[REDACTED]"),
        _ => "[REDACTED]".to_string(),
    }
}

/// [`CompletionClient`] backed by reqwest.
///
/// The credential is resolved per request, so a missing key surfaces as
/// [`AgentError::Configuration`] on the first call rather than at
/// construction, and no request is sent without one.
#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    http_client: ReqwestClient,
    config: CompletionClientConfig,
}

impl HttpCompletionClient {
    pub fn new(config: CompletionClientConfig) -> AgentResult<Self> {
        info!(
            "Initializing completion client: base_url={}, timeout={}s, api_key={}",
            config.base_url,
            config.timeout_secs,
            config
                .api_key
                .as_deref()
                .map_or_else(|| format!("${}", config.api_key_env), redact_key)
        );

        let http_client = ReqwestClient::builder()
            .pool_max_idle_per_host(10)
            .timeout(Duration::from_secs(config.timeout_secs))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| AgentError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn from_llm_config(config: &LlmConfig) -> AgentResult<Self> {
        Self::new(CompletionClientConfig::from(config))
    }

    pub fn config(&self) -> &CompletionClientConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn resolve_api_key(&self) -> AgentResult<String> {
        let key = self
            .config
            .api_key
            .clone()
            .or_else(|| std::env::var(&self.config.api_key_env).ok())
            .filter(|key| !key.trim().is_empty());

        key.ok_or_else(|| {
            AgentError::Configuration(format!(
                "API key not configured: set llm.api_key or the {} environment variable",
                self.config.api_key_env
            ))
        })
    }

    /// POST the request and map non-2xx statuses to [`AgentError::Api`].
    async fn post(&self, request: &ChatRequest) -> AgentResult<Response> {
        let api_key = self.resolve_api_key()?;
        let url = self.endpoint();
        debug!("POST {}", url);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| AgentError::Network(e.to_string()))?;

        let status = response.status();
        debug!("Response status: {}", status);

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!("API error ({}): {}", status, body);
        Err(AgentError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    #[instrument(skip(self, request), fields(model = %request.model, messages = request.messages.len()))]
    async fn complete(&self, request: &ChatRequest) -> AgentResult<Completion> {
        let response = self.post(request).await?;
        let body = response.text().await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&body)?;
        let completion = parsed.into_completion()?;

        info!(
            prompt_tokens = completion.usage.prompt,
            completion_tokens = completion.usage.completion,
            "Completion received"
        );
        Ok(completion)
    }

    #[instrument(skip(self, request), fields(model = %request.model, messages = request.messages.len()))]
    async fn complete_stream(&self, request: &ChatRequest) -> AgentResult<TextStream<'static>> {
        let mut request = request.clone();
        request.stream = true;

        let response = self.post(&request).await?;
        debug!("Streaming response opened");

        Ok(Box::pin(SseStreamParser::new(Box::pin(response.bytes_stream()))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ChatMessage;
    use futures::StreamExt;
    use mockito::Matcher;

    fn request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_tokens: 64,
            messages: vec![ChatMessage::system("Be brief."), ChatMessage::user("Hi")],
            tools: None,
            stream: false,
        }
    }

    fn client_for(server: &mockito::Server, api_key: Option<&str>) -> HttpCompletionClient {
        HttpCompletionClient::new(CompletionClientConfig {
            base_url: server.url(),
            api_key: api_key.map(str::to_string),
            api_key_env: "AGENTCORE_TEST_UNSET_KEY".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_redact_key() {
        assert_eq!(redact_key("sk-proj-abcdefghijklmnop"), "sk-proj-...[REDACTED]");
        assert_eq!(redact_key("short"), "[REDACTED]");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = HttpCompletionClient::new(CompletionClientConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_complete_sends_bearer_and_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test-key-123456")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "gpt-4o-mini",
                "max_tokens": 64,
                "messages": [
                    {"role": "system", "content": "Be brief."},
                    {"role": "user", "content": "Hi"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"model":"gpt-4o-mini","choices":[{"message":{"role":"assistant","content":"Hello!"}}],
                   "usage":{"prompt_tokens":9,"completion_tokens":2,"total_tokens":11}}"#,
            )
            .create_async()
            .await;

        let completion = client_for(&server, Some("sk-test-key-123456"))
            .complete(&request())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(completion.content, "Hello!");
        assert_eq!(completion.usage.total, 11);
    }

    #[tokio::test]
    async fn test_missing_key_sends_nothing() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .expect(0)
            .create_async()
            .await;

        let err = client_for(&server, None).complete(&request()).await.unwrap_err();

        assert!(matches!(err, AgentError::Configuration(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("slow down")
            .create_async()
            .await;

        let err = client_for(&server, Some("sk-test-key-123456"))
            .complete(&request())
            .await
            .unwrap_err();

        match err {
            AgentError::Api { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "slow down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let err = client_for(&server, Some("sk-test-key-123456"))
            .complete(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_stream_sets_flag_and_yields_fragments() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::PartialJson(serde_json::json!({"stream": true})))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(
                "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n\
                 data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n\
                 data: [DONE]\n\n",
            )
            .create_async()
            .await;

        let stream = client_for(&server, Some("sk-test-key-123456"))
            .complete_stream(&request())
            .await
            .unwrap();
        let fragments: Vec<String> = stream.map(|item| item.unwrap()).collect().await;

        mock.assert_async().await;
        assert_eq!(fragments, vec!["Hel", "lo"]);
    }
}
