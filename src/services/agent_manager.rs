//! Facade over the specialized agents and the orchestrator.

use std::sync::{Arc, OnceLock};
use tracing::info;

use crate::domain::errors::{AgentError, AgentResult, PlanningResult};
use crate::domain::models::{AgentConfig, Config, OrchestrationResult, OrchestrationTask};
use crate::domain::ports::CompletionClient;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::llm::{HttpCompletionClient, RateLimiter, RetryPolicy};

use super::agent_factory::AgentFactory;
use super::model_agent::ModelAgent;
use super::orchestrator::Orchestrator;
use super::specialists::{
    AnalysisAgent, ContentGenerationAgent, ExtractionAgent, GenerationOptions,
    QuestionAnsweringAgent, Specialist, SummarizationAgent, SummaryOptions, TranslationAgent,
};

static GLOBAL_MANAGER: OnceLock<AgentManager> = OnceLock::new();

/// Owns one instance of each specialized agent, created on first use and
/// registered in the manager's [`AgentFactory`] under its well-known id.
pub struct AgentManager {
    config: Config,
    client: Arc<dyn CompletionClient>,
    factory: Arc<AgentFactory>,
    rate_limiter: Option<Arc<RateLimiter>>,
    summarizer: OnceLock<Arc<SummarizationAgent>>,
    analyzer: OnceLock<Arc<AnalysisAgent>>,
    generator: OnceLock<Arc<ContentGenerationAgent>>,
    extractor: OnceLock<Arc<ExtractionAgent>>,
    qa: OnceLock<Arc<QuestionAnsweringAgent>>,
    translator: OnceLock<Arc<TranslationAgent>>,
}

impl AgentManager {
    /// Manager with its own isolated factory.
    pub fn new(config: Config, client: Arc<dyn CompletionClient>) -> Self {
        let rate_limiter = config
            .rate_limit
            .enabled
            .then(|| Arc::new(RateLimiter::from_config(&config.rate_limit)));

        Self {
            config,
            client,
            factory: Arc::new(AgentFactory::new()),
            rate_limiter,
            summarizer: OnceLock::new(),
            analyzer: OnceLock::new(),
            generator: OnceLock::new(),
            extractor: OnceLock::new(),
            qa: OnceLock::new(),
            translator: OnceLock::new(),
        }
    }

    /// Register agents in `factory` instead of a private one.
    #[must_use]
    pub fn with_factory(mut self, factory: Arc<AgentFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Manager talking HTTP to the endpoint in `config`, registering into
    /// the global factory.
    pub fn from_config(config: Config) -> AgentResult<Self> {
        let client = HttpCompletionClient::from_llm_config(&config.llm)?;
        Ok(Self::new(config, Arc::new(client)).with_factory(AgentFactory::global()))
    }

    /// The process-wide manager, built from [`ConfigLoader::load`] on first access.
    pub fn global() -> AgentResult<&'static Self> {
        if let Some(manager) = GLOBAL_MANAGER.get() {
            return Ok(manager);
        }

        let config = ConfigLoader::load()
            .map_err(|e| AgentError::Configuration(format!("{e:#}")))?;
        let manager = Self::from_config(config)?;
        Ok(GLOBAL_MANAGER.get_or_init(|| manager))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn factory(&self) -> Arc<AgentFactory> {
        self.factory.clone()
    }

    /// Model agent for `config` with the configured retry, rate limit and history budget.
    pub fn model_agent(&self, config: AgentConfig) -> ModelAgent {
        let mut agent = ModelAgent::new(config, self.client.clone())
            .with_retry(RetryPolicy::from_config(&self.config.retry));
        if let Some(limiter) = &self.rate_limiter {
            agent = agent.with_rate_limiter(limiter.clone());
        }
        if let Some(budget) = self.config.memory.max_history_tokens {
            agent = agent.with_history_budget(budget);
        }
        agent
    }

    fn specialist<S>(&self, cell: &OnceLock<Arc<S>>) -> Arc<S>
    where
        S: Specialist + 'static,
    {
        cell.get_or_init(|| {
            let config = S::agent_config(&self.config.llm.default_model);
            let agent = Arc::new(S::from_model_agent(self.model_agent(config)));
            self.factory.register_agent(S::ID, agent.clone());
            info!(agent_id = S::ID, "Specialized agent created");
            agent
        })
        .clone()
    }

    pub fn summarizer(&self) -> Arc<SummarizationAgent> {
        self.specialist(&self.summarizer)
    }

    pub fn analyzer(&self) -> Arc<AnalysisAgent> {
        self.specialist(&self.analyzer)
    }

    pub fn generator(&self) -> Arc<ContentGenerationAgent> {
        self.specialist(&self.generator)
    }

    pub fn extractor(&self) -> Arc<ExtractionAgent> {
        self.specialist(&self.extractor)
    }

    pub fn question_answerer(&self) -> Arc<QuestionAnsweringAgent> {
        self.specialist(&self.qa)
    }

    pub fn translator(&self) -> Arc<TranslationAgent> {
        self.specialist(&self.translator)
    }

    /// Create and register every specialized agent.
    pub fn register_defaults(&self) {
        self.summarizer();
        self.analyzer();
        self.generator();
        self.extractor();
        self.question_answerer();
        self.translator();
    }

    pub async fn summarize(&self, content: &str, options: SummaryOptions) -> AgentResult<String> {
        self.summarizer().summarize(content, options).await
    }

    pub async fn analyze<S: AsRef<str>>(&self, content: &str, aspects: &[S]) -> AgentResult<String> {
        self.analyzer().analyze(content, aspects).await
    }

    pub async fn generate(&self, prompt: &str, options: &GenerationOptions) -> AgentResult<String> {
        self.generator().generate(prompt, options).await
    }

    pub async fn ask_question(&self, question: &str, context: Option<&str>) -> AgentResult<String> {
        self.question_answerer().answer(question, context).await
    }

    pub async fn extract<S: AsRef<str>>(
        &self,
        content: &str,
        fields: &[S],
    ) -> AgentResult<serde_json::Map<String, serde_json::Value>> {
        self.extractor().extract(content, fields).await
    }

    pub async fn translate(&self, text: &str, target: &str, source: Option<&str>) -> AgentResult<String> {
        self.translator().translate(text, target, source).await
    }

    /// Orchestrator over this manager's factory.
    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(self.factory.clone())
            .with_max_concurrency(self.config.orchestrator.max_concurrency)
    }

    /// Run `tasks`, with every specialized agent available by its id.
    pub async fn orchestrate(&self, tasks: &[OrchestrationTask]) -> PlanningResult<OrchestrationResult> {
        self.register_defaults();
        self.orchestrator().execute(tasks).await
    }
}

/// Summarize with the global manager.
pub async fn summarize(content: &str, options: SummaryOptions) -> AgentResult<String> {
    AgentManager::global()?.summarize(content, options).await
}

/// Analyze with the global manager.
pub async fn analyze<S: AsRef<str>>(content: &str, aspects: &[S]) -> AgentResult<String> {
    AgentManager::global()?.analyze(content, aspects).await
}

/// Generate with the global manager.
pub async fn generate(prompt: &str, options: &GenerationOptions) -> AgentResult<String> {
    AgentManager::global()?.generate(prompt, options).await
}

/// Answer a question with the global manager.
pub async fn ask_question(question: &str, context: Option<&str>) -> AgentResult<String> {
    AgentManager::global()?.ask_question(question, context).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::Agent;
    use crate::services::specialists::test_support::FixedReply;

    fn manager(reply: &str) -> (AgentManager, Arc<FixedReply>) {
        let client = FixedReply::new(reply);
        let mut config = Config::default();
        config.llm.default_model = "test-model".to_string();
        (AgentManager::new(config, client.clone()), client)
    }

    #[tokio::test]
    async fn test_specialists_are_created_once_and_registered() {
        let (manager, _) = manager("ok");
        assert!(manager.factory().list_agents().is_empty());

        manager.summarize("text", SummaryOptions::default()).await.unwrap();
        manager.summarize("more", SummaryOptions::default()).await.unwrap();

        assert!(Arc::ptr_eq(&manager.summarizer(), &manager.summarizer()));
        assert_eq!(manager.factory().list_agents(), vec!["summarizer"]);
        assert_eq!(manager.summarizer().history().len(), 4);
    }

    #[test]
    fn test_register_defaults_uses_well_known_ids() {
        let (manager, _) = manager("ok");
        manager.register_defaults();
        assert_eq!(
            manager.factory().list_agents(),
            vec!["analyzer", "extractor", "generator", "qa", "summarizer", "translator"]
        );
        assert_eq!(manager.analyzer().config().model, "test-model");
    }

    #[tokio::test]
    async fn test_convenience_methods_delegate() {
        let (manager, client) = manager("answer");

        assert_eq!(manager.ask_question("Why?", None).await.unwrap(), "answer");
        assert!((client.last_request().temperature - 0.4).abs() < f32::EPSILON);

        assert_eq!(manager.translate("Hi", "German", None).await.unwrap(), "answer");
        assert_eq!(
            manager.generate("Write", &GenerationOptions::default()).await.unwrap(),
            "answer"
        );
        assert_eq!(manager.analyze("Text", &["tone"]).await.unwrap(), "answer");
    }

    #[tokio::test]
    async fn test_orchestrate_with_builtin_agents() {
        let (manager, _) = manager("done");
        let tasks = vec![
            OrchestrationTask::new("summary", "summarizer", "Long text"),
            OrchestrationTask::new("answer", "qa", "What matters?").depends_on("summary"),
        ];

        let result = manager.orchestrate(&tasks).await.unwrap();

        assert!(result.all_completed());
        assert_eq!(result.get("answer").unwrap().response().unwrap().content, "done");
    }

    #[test]
    fn test_rate_limiter_follows_config() {
        let mut config = Config::default();
        config.rate_limit.enabled = false;
        let manager = AgentManager::new(config, FixedReply::new("x"));
        assert!(manager.rate_limiter.is_none());
    }
}
