//! Registry of agents addressable by string id.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::debug;

use crate::domain::ports::Agent;

static GLOBAL_FACTORY: OnceLock<Arc<AgentFactory>> = OnceLock::new();

/// Maps ids to shared agent instances.
///
/// [`AgentFactory::global`] is the process-wide registry; [`AgentFactory::new`]
/// builds an isolated one.
#[derive(Default)]
pub struct AgentFactory {
    agents: RwLock<HashMap<String, Arc<dyn Agent>>>,
}

impl fmt::Debug for AgentFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentFactory")
            .field("agents", &self.list_agents())
            .finish()
    }
}

impl AgentFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry, created on first access.
    pub fn global() -> Arc<Self> {
        GLOBAL_FACTORY.get_or_init(|| Arc::new(Self::new())).clone()
    }

    /// Insert `agent` under `id`, replacing any previous registration.
    pub fn register_agent(&self, id: impl Into<String>, agent: Arc<dyn Agent>) {
        let id = id.into();
        debug!(agent_id = %id, agent = %agent.name(), "Registering agent");
        self.agents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, agent);
    }

    pub fn get_agent(&self, id: &str) -> Option<Arc<dyn Agent>> {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Registered ids, sorted.
    pub fn list_agents(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::AgentResult;
    use crate::domain::models::{AgentConfig, AgentResponse, TokenUsage};
    use crate::domain::ports::AgentCore;
    use async_trait::async_trait;

    struct NamedAgent {
        core: AgentCore,
    }

    impl NamedAgent {
        fn arc(name: &str) -> Arc<dyn Agent> {
            Arc::new(Self {
                core: AgentCore::new(AgentConfig::new(name, "test-model")),
            })
        }
    }

    #[async_trait]
    impl Agent for NamedAgent {
        fn core(&self) -> &AgentCore {
            &self.core
        }

        async fn process(&self, input: &str) -> AgentResult<AgentResponse> {
            Ok(AgentResponse::new(input, "test-model", TokenUsage::default()))
        }
    }

    #[test]
    fn test_global_is_singleton() {
        let first = AgentFactory::global();
        let second = AgentFactory::global();
        assert!(Arc::ptr_eq(&first, &second));

        first.register_agent("factory-test-global", NamedAgent::arc("g"));
        assert!(second.contains("factory-test-global"));
    }

    #[test]
    fn test_register_overwrites() {
        let factory = AgentFactory::new();
        factory.register_agent("writer", NamedAgent::arc("first"));
        factory.register_agent("writer", NamedAgent::arc("second"));

        assert_eq!(factory.get_agent("writer").unwrap().name(), "second");
        assert_eq!(factory.list_agents(), vec!["writer"]);
    }

    #[test]
    fn test_missing_agent() {
        assert!(AgentFactory::new().get_agent("nobody").is_none());
    }

    #[test]
    fn test_list_is_sorted() {
        let factory = AgentFactory::new();
        for id in ["zeta", "alpha", "mid"] {
            factory.register_agent(id, NamedAgent::arc(id));
        }
        assert_eq!(factory.list_agents(), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_concurrent_registration() {
        let factory = Arc::new(AgentFactory::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let factory = factory.clone();
                std::thread::spawn(move || {
                    factory.register_agent(format!("agent-{i}"), NamedAgent::arc("worker"));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(factory.list_agents().len(), 8);
    }
}
