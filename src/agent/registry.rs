//! Agent registry: an immutable name-to-implementation map.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::AgentError;

use super::traits::Agent;

/// Maps canonical agent names to their implementations. Built once at
/// startup and never mutated afterward, so the orchestrator's decision
/// loop can freely look agents up without synchronization.
#[derive(Clone)]
pub struct AgentRegistry {
    agents: Arc<HashMap<&'static str, Arc<dyn Agent>>>,
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.agents.keys().copied().collect();
        names.sort_unstable();
        f.debug_struct("AgentRegistry").field("agents", &names).finish()
    }
}

impl AgentRegistry {
    /// Builds a registry from `agents`, keyed by [`Agent::name`].
    #[must_use]
    pub fn new(agents: Vec<Arc<dyn Agent>>) -> Self {
        let map = agents.into_iter().map(|a| (a.name(), a)).collect();
        Self {
            agents: Arc::new(map),
        }
    }

    /// Looks up an agent by canonical name.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::RegistryMissing`] if no agent with that name
    /// was registered — the one lookup failure the orchestration
    /// contract allows to surface as an `Err` (see [`AgentError`]).
    pub fn get(&self, name: &str) -> Result<Arc<dyn Agent>, AgentError> {
        self.agents
            .get(name)
            .cloned()
            .ok_or_else(|| AgentError::RegistryMissing { name: name.to_string() })
    }

    /// Names of every registered agent, for the decision prompt's tool
    /// catalog.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.agents.keys().copied().collect()
    }

    /// Descriptions of every registered agent, `(name, description)`.
    #[must_use]
    pub fn catalog(&self) -> Vec<(&'static str, String)> {
        self.agents
            .iter()
            .map(|(name, agent)| (*name, agent.description().to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::agent::provider::LlmAdvisor;
    use crate::agent::vector_store::VectorStore;
    use crate::core::ResearchContext;

    struct StubAgent(&'static str);

    #[async_trait]
    impl Agent for StubAgent {
        fn name(&self) -> &'static str {
            self.0
        }

        fn description(&self) -> &str {
            "stub"
        }

        async fn process(
            &self,
            _context: &mut ResearchContext,
            _advisor: &dyn LlmAdvisor,
            _vector_store: &dyn VectorStore,
        ) -> Result<(), AgentError> {
            Ok(())
        }
    }

    #[test]
    fn lookup_succeeds_for_registered_agent() {
        let registry = AgentRegistry::new(vec![Arc::new(StubAgent("Extractor"))]);
        assert!(registry.get("Extractor").is_ok());
    }

    #[test]
    fn lookup_fails_for_unregistered_agent() {
        let registry = AgentRegistry::new(vec![Arc::new(StubAgent("Extractor"))]);
        assert!(matches!(
            registry.get("DataInspector"),
            Err(AgentError::RegistryMissing { .. })
        ));
    }
}
