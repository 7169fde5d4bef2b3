//! Agent backed by a chat-completion model.

use async_trait::async_trait;
use futures::StreamExt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::domain::errors::{AgentError, AgentResult};
use crate::domain::models::{AgentConfig, AgentResponse, Role};
use crate::domain::ports::{
    Agent, AgentCore, ChatMessage, ChatRequest, CompletionClient, TextStream, ToolSpec,
};
use crate::infrastructure::llm::{RateLimiter, RatePermit, RetryPolicy};

use super::context_truncation::estimate_tokens;

/// Agent that answers by calling a [`CompletionClient`].
///
/// Each request carries the system prompt, the whole short-term history and
/// the new input. Successful exchanges are appended to memory. Retry and
/// rate limiting are opt-in.
pub struct ModelAgent {
    core: AgentCore,
    client: Arc<dyn CompletionClient>,
    retry_policy: Option<RetryPolicy>,
    rate_limiter: Option<Arc<RateLimiter>>,
    max_history_tokens: Option<usize>,
}

enum StreamState {
    Pending,
    Streaming {
        inner: TextStream<'static>,
        reply: String,
        permit: Option<RatePermit>,
    },
    Finished,
}

impl ModelAgent {
    pub fn new(config: AgentConfig, client: Arc<dyn CompletionClient>) -> Self {
        Self {
            core: AgentCore::new(config),
            client,
            retry_policy: None,
            rate_limiter: None,
            max_history_tokens: None,
        }
    }

    /// Retry transient failures (network, 408, 429, 5xx) under `policy`.
    #[must_use]
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Route every call through `limiter`, which may be shared between agents.
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Drop the oldest history entries beyond `max_tokens` when building requests.
    #[must_use]
    pub fn with_history_budget(mut self, max_tokens: usize) -> Self {
        self.max_history_tokens = Some(max_tokens);
        self
    }

    /// Message list for `input`: system prompt, history, then the input.
    pub fn build_messages(&self, input: &str) -> Vec<ChatMessage> {
        let config = self.config();
        let history = self.history();

        let kept = match self.max_history_tokens {
            Some(budget) => {
                let mut used = 0;
                let newest_fitting = history
                    .iter()
                    .rev()
                    .take_while(|entry| {
                        used += estimate_tokens(&entry.content);
                        used <= budget
                    })
                    .count();
                let dropped = history.len() - newest_fitting;
                if dropped > 0 {
                    debug!(dropped, budget, "Trimmed history to fit token budget");
                }
                &history[dropped..]
            }
            None => &history[..],
        };

        let mut messages = Vec::with_capacity(kept.len() + 2);
        if let Some(system_prompt) = &config.system_prompt {
            messages.push(ChatMessage::system(system_prompt.clone()));
        }
        messages.extend(
            kept.iter()
                .map(|entry| ChatMessage::new(entry.role, entry.content.clone())),
        );
        messages.push(ChatMessage::user(input));
        messages
    }

    pub fn build_request(&self, input: &str) -> ChatRequest {
        let config = self.config();
        let tools = if config.tools.is_empty() {
            None
        } else {
            Some(config.tools.iter().map(ToolSpec::from).collect())
        };

        ChatRequest {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            messages: self.build_messages(input),
            tools,
            stream: false,
        }
    }

    fn remember(&self, input: &str, reply: &str) {
        let mut memory = self.core.memory();
        memory.push(Role::User, input);
        memory.push(Role::Assistant, reply);
    }

    /// Run `operation` under the rate limiter and retry policy, if configured.
    ///
    /// The limiter slot taken by the successful attempt is handed back with
    /// its output; the call counts against `max_concurrent` until it is dropped.
    async fn call<T, F, Fut>(&self, operation: F) -> AgentResult<(Option<RatePermit>, T)>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = AgentResult<T>>,
    {
        let operation = &operation;
        let limiter = self.rate_limiter.as_deref();
        let attempt = move || async move {
            let permit = match limiter {
                Some(limiter) => Some(limiter.acquire().await?),
                None => None,
            };
            operation().await.map(|output| (permit, output))
        };

        match &self.retry_policy {
            Some(policy) => policy.execute_when(attempt, AgentError::is_transient).await,
            None => attempt().await,
        }
    }

    async fn open_stream(&self, input: &str) -> AgentResult<(Option<RatePermit>, TextStream<'static>)> {
        let request = self.build_request(input);
        debug!(agent = %self.name(), messages = request.messages.len(), "Opening stream");
        self.call(|| self.client.complete_stream(&request)).await
    }

    async fn next_fragment(
        &self,
        input: &str,
        mut inner: TextStream<'static>,
        mut reply: String,
        permit: Option<RatePermit>,
    ) -> Option<(AgentResult<String>, StreamState)> {
        match inner.next().await {
            Some(Ok(fragment)) => {
                reply.push_str(&fragment);
                Some((Ok(fragment), StreamState::Streaming { inner, reply, permit }))
            }
            Some(Err(err)) => Some((Err(err), StreamState::Finished)),
            None => {
                drop(permit);
                self.remember(input, &reply);
                info!(agent = %self.name(), chars = reply.len(), "Stream completed");
                None
            }
        }
    }
}

#[async_trait]
impl Agent for ModelAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    #[instrument(skip(self, input), fields(agent = %self.name(), input_len = input.len()))]
    async fn process(&self, input: &str) -> AgentResult<AgentResponse> {
        let request = self.build_request(input);
        let (_, completion) = self.call(|| self.client.complete(&request)).await?;

        self.remember(input, &completion.content);

        let model = completion
            .model
            .unwrap_or_else(|| self.config().model.clone());
        info!(
            model = %model,
            total_tokens = completion.usage.total,
            "Agent response received"
        );
        Ok(AgentResponse::new(completion.content, model, completion.usage))
    }

    fn process_stream<'a>(&'a self, input: &'a str) -> TextStream<'a> {
        Box::pin(futures::stream::unfold(
            StreamState::Pending,
            move |state| async move {
                match state {
                    StreamState::Pending => match self.open_stream(input).await {
                        Ok((permit, inner)) => {
                            self.next_fragment(input, inner, String::new(), permit).await
                        }
                        Err(err) => Some((Err(err), StreamState::Finished)),
                    },
                    StreamState::Streaming {
                        inner,
                        reply,
                        permit,
                    } => self.next_fragment(input, inner, reply, permit).await,
                    StreamState::Finished => None,
                }
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{TokenUsage, ToolDeclaration};
    use crate::domain::ports::Completion;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted results and records every request.
    #[derive(Default)]
    struct ScriptedClient {
        replies: Mutex<VecDeque<AgentResult<Completion>>>,
        fragments: Mutex<Option<Vec<AgentResult<String>>>>,
        /// Keep the stream open after the scripted fragments
        hold_open: bool,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedClient {
        fn replying(replies: Vec<AgentResult<Completion>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                ..Self::default()
            })
        }

        fn streaming(fragments: Vec<AgentResult<String>>) -> Arc<Self> {
            Arc::new(Self {
                fragments: Mutex::new(Some(fragments)),
                ..Self::default()
            })
        }

        fn streaming_held_open(fragments: Vec<AgentResult<String>>) -> Arc<Self> {
            Arc::new(Self {
                fragments: Mutex::new(Some(fragments)),
                hold_open: true,
                ..Self::default()
            })
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, request: &ChatRequest) -> AgentResult<Completion> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AgentError::Network("script exhausted".to_string())))
        }

        async fn complete_stream(&self, request: &ChatRequest) -> AgentResult<TextStream<'static>> {
            self.requests.lock().unwrap().push(request.clone());
            let fragments = self.fragments.lock().unwrap().take().unwrap_or_default();
            let scripted = futures::stream::iter(fragments);
            if self.hold_open {
                Ok(Box::pin(scripted.chain(futures::stream::pending())))
            } else {
                Ok(Box::pin(scripted))
            }
        }
    }

    fn completion(content: &str) -> AgentResult<Completion> {
        Ok(Completion {
            content: content.to_string(),
            model: Some("served-model".to_string()),
            usage: TokenUsage::new(7, 3),
        })
    }

    fn agent_with(client: Arc<ScriptedClient>) -> ModelAgent {
        let config = AgentConfig::new("tester", "gpt-4o-mini")
            .with_system_prompt("You are terse.")
            .with_temperature(0.2)
            .with_max_tokens(128);
        ModelAgent::new(config, client)
    }

    #[tokio::test]
    async fn test_process_builds_request_and_records_memory() {
        let client = ScriptedClient::replying(vec![completion("Hi!"), completion("Fine.")]);
        let agent = agent_with(client.clone());

        let first = agent.process("Hello").await.unwrap();
        assert_eq!(first.content, "Hi!");
        assert_eq!(first.metadata.model, "served-model");
        assert_eq!(first.metadata.usage.total, 10);

        agent.process("How are you?").await.unwrap();

        let requests = client.requests();
        assert_eq!(requests[0].model, "gpt-4o-mini");
        assert_eq!(requests[0].max_tokens, 128);
        assert_eq!(
            requests[0].messages,
            vec![ChatMessage::system("You are terse."), ChatMessage::user("Hello")]
        );
        assert_eq!(
            requests[1].messages,
            vec![
                ChatMessage::system("You are terse."),
                ChatMessage::user("Hello"),
                ChatMessage::assistant("Hi!"),
                ChatMessage::user("How are you?"),
            ]
        );

        let history = agent.history();
        assert_eq!(history.len(), 4);
        assert_eq!(history[3].content, "Fine.");
    }

    #[tokio::test]
    async fn test_failure_leaves_memory_untouched() {
        let client = ScriptedClient::replying(vec![Err(AgentError::Api {
            status: 400,
            body: "bad request".to_string(),
        })]);
        let agent = agent_with(client);

        let err = agent.process("Hello").await.unwrap_err();
        assert!(matches!(err, AgentError::Api { status: 400, .. }));
        assert!(agent.history().is_empty());
    }

    #[tokio::test]
    async fn test_model_falls_back_to_config() {
        let client = ScriptedClient::replying(vec![Ok(Completion {
            content: "ok".to_string(),
            model: None,
            usage: TokenUsage::default(),
        })]);
        let agent = agent_with(client);
        let response = agent.process("x").await.unwrap();
        assert_eq!(response.metadata.model, "gpt-4o-mini");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_on_transient_errors() {
        let client = ScriptedClient::replying(vec![
            Err(AgentError::Network("reset".to_string())),
            Err(AgentError::Api {
                status: 503,
                body: "busy".to_string(),
            }),
            completion("third time"),
        ]);
        let agent = agent_with(client.clone()).with_retry(RetryPolicy::new(3, 100, 2.0));

        let response = agent.process("go").await.unwrap();
        assert_eq!(response.content, "third time");
        assert_eq!(client.requests().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_retry_on_permanent_error() {
        let client = ScriptedClient::replying(vec![
            Err(AgentError::Api {
                status: 401,
                body: "unauthorized".to_string(),
            }),
            completion("unreachable"),
        ]);
        let agent = agent_with(client.clone()).with_retry(RetryPolicy::new(3, 100, 2.0));

        assert!(agent.process("go").await.is_err());
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_tools_are_sent() {
        let client = ScriptedClient::replying(vec![completion("ok")]);
        let config = AgentConfig::new("tooled", "gpt-4o").with_tool(ToolDeclaration::new(
            "lookup",
            "Look something up",
            serde_json::json!({"type": "object"}),
        ));
        let agent = ModelAgent::new(config, client.clone());
        agent.process("x").await.unwrap();

        let tools = client.requests()[0].tools.clone().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].function.name, "lookup");
    }

    #[test]
    fn test_history_budget_drops_oldest() {
        let agent = agent_with(ScriptedClient::replying(vec![])).with_history_budget(3);
        agent.add_to_memory(Role::User, "oldest entry here");
        agent.add_to_memory(Role::Assistant, "ok");
        agent.add_to_memory(Role::User, "newer");

        let messages = agent.build_messages("now");
        assert_eq!(
            messages,
            vec![
                ChatMessage::system("You are terse."),
                ChatMessage::assistant("ok"),
                ChatMessage::user("newer"),
                ChatMessage::user("now"),
            ]
        );
    }

    #[tokio::test]
    async fn test_stream_yields_fragments_and_records_memory() {
        let client = ScriptedClient::streaming(vec![Ok("Hel".to_string()), Ok("lo".to_string())]);
        let agent = agent_with(client.clone());

        let fragments: Vec<String> = agent
            .process_stream("Hi")
            .map(|item| item.unwrap())
            .collect()
            .await;

        assert_eq!(fragments, vec!["Hel", "lo"]);
        let history = agent.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content, "Hello");
    }

    #[tokio::test]
    async fn test_stream_error_is_not_remembered() {
        let client = ScriptedClient::streaming(vec![
            Ok("partial".to_string()),
            Err(AgentError::Network("dropped".to_string())),
        ]);
        let agent = agent_with(client);

        let items: Vec<AgentResult<String>> = agent.process_stream("Hi").collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[1].is_err());
        assert!(agent.history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_stream_holds_limiter_slot() {
        let limiter = Arc::new(RateLimiter::new(1, std::time::Duration::ZERO));
        let first_client = ScriptedClient::streaming_held_open(vec![Ok("a".to_string())]);
        let second_client = ScriptedClient::streaming(vec![Ok("b".to_string())]);
        let first = agent_with(first_client).with_rate_limiter(limiter.clone());
        let second = agent_with(second_client.clone()).with_rate_limiter(limiter.clone());

        let mut first_stream = first.process_stream("one");
        assert_eq!(first_stream.next().await.unwrap().unwrap(), "a");
        assert_eq!(limiter.in_flight(), 1);

        let mut second_stream = second.process_stream("two");
        let waited =
            tokio::time::timeout(std::time::Duration::from_millis(100), second_stream.next()).await;
        assert!(waited.is_err());
        assert!(second_client.requests().is_empty());

        drop(first_stream);
        assert_eq!(second_stream.next().await.unwrap().unwrap(), "b");
        assert!(second_stream.next().await.is_none());
        assert_eq!(second_client.requests().len(), 1);
        assert_eq!(limiter.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_completed_call_releases_limiter_slot() {
        let limiter = Arc::new(RateLimiter::new(1, std::time::Duration::ZERO));
        let client = ScriptedClient::replying(vec![completion("ok")]);
        let agent = agent_with(client).with_rate_limiter(limiter.clone());

        agent.process("x").await.unwrap();
        assert_eq!(limiter.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_stream_is_lazy() {
        let client = ScriptedClient::streaming(vec![Ok("x".to_string())]);
        let agent = agent_with(client.clone());

        let stream = agent.process_stream("Hi");
        assert!(client.requests().is_empty());
        drop(stream);
        assert!(client.requests().is_empty());
    }
}
