//! Agent trait definition.
//!
//! Every stage (`DataInspector`, `PlanningAgent`, `PatternGenerator`,
//! `Extractor`, `SynthesisCoordinator`, `WebSearchAgent`) implements this
//! trait: a name, a description, and a single `process(context)`
//! operation. There is no per-call model/tool-use surface here — each
//! agent consults the shared [`LlmAdvisor`] only when its own logic
//! needs it, and never dispatches to another agent itself.

use async_trait::async_trait;

use super::provider::LlmAdvisor;
use super::vector_store::VectorStore;
use crate::core::ResearchContext;
use crate::error::AgentError;

/// Trait implemented by every research agent.
///
/// Agents mutate the shared [`ResearchContext`] in place; they never own
/// it. The orchestrator is the only caller of [`Agent::process`] and is
/// responsible for deciding which agent to run next.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Canonical agent name, matching an entry in
    /// [`crate::agent::names::CANONICAL_NAMES`].
    fn name(&self) -> &'static str;

    /// Human-readable summary of what this agent does, surfaced to the
    /// advisor as part of the decision prompt's tool catalog.
    fn description(&self) -> &str;

    /// Runs this agent's logic against `context`, appending its findings
    /// to `context.shared_knowledge` and/or the relevant context field.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] only for conditions the orchestration
    /// contract allows to surface (see [`AgentError::RegistryMissing`]);
    /// anything recoverable is recorded as a
    /// [`crate::core::QualityFlag`] instead of propagated.
    async fn process(
        &self,
        context: &mut ResearchContext,
        advisor: &dyn LlmAdvisor,
        vector_store: &dyn VectorStore,
    ) -> Result<(), AgentError>;
}
