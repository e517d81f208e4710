//! `WebSearchAgent`: an optional supplementary research stage.
//!
//! Always registered; gated internally by `enabled`, set from
//! `OrchestratorConfig::enable_web_search`. Delegates the actual network
//! call to an injected [`WebSearchClient`], keeping this crate free of
//! any HTTP client dependency it doesn't otherwise need.

use async_trait::async_trait;
use serde::Deserialize;

use crate::agent::json_util::parse_lenient;
use crate::agent::prompt::WEB_SEARCH_AGENT_SYSTEM_PROMPT;
use crate::agent::provider::LlmAdvisor;
use crate::agent::traits::Agent;
use crate::agent::vector_store::VectorStore;
use crate::core::{Chunk, ResearchContext, SourceType};
use crate::error::AgentError;

/// A pluggable web-search backend. The implementation (HTTP client,
/// rate limiting, result caching) is an explicit Non-goal; this crate
/// only defines the seam WebSearchAgent calls through.
#[async_trait]
pub trait WebSearchClient: Send + Sync {
    /// Returns up to a handful of short text snippets relevant to `query`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Advisor`] on transport failure.
    async fn search(&self, query: &str) -> Result<Vec<String>, AgentError>;
}

/// A [`WebSearchClient`] that always returns no results, for configs
/// where `enable_web_search` is on but no real backend is wired up yet.
#[derive(Debug, Default)]
pub struct NullWebSearchClient;

#[async_trait]
impl WebSearchClient for NullWebSearchClient {
    async fn search(&self, _query: &str) -> Result<Vec<String>, AgentError> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Default, Deserialize)]
struct WebSearchResponse {
    #[serde(default)]
    findings: Vec<String>,
    #[serde(default)]
    summary: String,
}

/// Supplements retrieved chunks with web-search snippets when the
/// primary corpus can't answer the query on its own. Always registered;
/// when `enabled` is false it is a no-op that still records why.
pub struct WebSearchAgent {
    client: Box<dyn WebSearchClient>,
    enabled: bool,
}

impl WebSearchAgent {
    /// Builds an enabled `WebSearchAgent` delegating to `client`.
    #[must_use]
    pub fn new(client: Box<dyn WebSearchClient>) -> Self {
        Self { client, enabled: true }
    }

    /// Builds a `WebSearchAgent` with explicit enablement, for wiring up
    /// `OrchestratorConfig::enable_web_search`.
    #[must_use]
    pub fn with_enabled(client: Box<dyn WebSearchClient>, enabled: bool) -> Self {
        Self { client, enabled }
    }
}

#[async_trait]
impl Agent for WebSearchAgent {
    fn name(&self) -> &'static str {
        "WebSearchAgent"
    }

    fn description(&self) -> &str {
        "Supplements retrieved chunks with web-search snippets when the corpus is insufficient."
    }

    async fn process(
        &self,
        context: &mut ResearchContext,
        advisor: &dyn LlmAdvisor,
        _vector_store: &dyn VectorStore,
    ) -> Result<(), AgentError> {
        if !self.enabled {
            context
                .shared_knowledge
                .agent_findings
                .insert("WebSearchAgent".to_string(), "web search disabled".to_string());
            return Ok(());
        }

        let snippets = self.client.search(&context.query).await?;
        let snippets_block = snippets.join("\n---\n");
        let prompt = format!(
            "<query>{}</query>\n\n<search_results>\n{snippets_block}\n</search_results>",
            context.query
        );
        let raw = advisor.llm(&format!("{WEB_SEARCH_AGENT_SYSTEM_PROMPT}\n\n{prompt}")).await?;
        let parsed: WebSearchResponse = parse_lenient(&raw);

        for (idx, finding) in parsed.findings.iter().enumerate() {
            context.rag_results.chunks.push(Chunk {
                id: format!("web-{idx}"),
                text: finding.clone(),
                source: "web-search".to_string(),
                similarity: 0.0,
                metadata: std::collections::HashMap::new(),
                source_document: None,
                source_type: SourceType::Web,
            });
        }

        context
            .shared_knowledge
            .agent_findings
            .insert("WebSearchAgent".to_string(), parsed.summary);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::provider::ScriptedAdvisor;
    use crate::agent::vector_store::InMemoryVectorStore;

    #[tokio::test]
    async fn appends_web_chunks_and_summary() {
        let response = r#"{"findings": ["model A released in 2024"], "summary": "one relevant result"}"#;
        let advisor = ScriptedAdvisor::new(vec![response.to_string()]);
        let store = InMemoryVectorStore::default();
        let agent = WebSearchAgent::new(Box::new(NullWebSearchClient));
        let mut ctx = ResearchContext::new("q", vec![]);

        agent.process(&mut ctx, &advisor, &store).await.unwrap_or_else(|e| panic!("{e}"));

        assert_eq!(ctx.rag_results.chunks.len(), 1);
        assert_eq!(ctx.rag_results.chunks[0].source_type, SourceType::Web);
        assert_eq!(
            ctx.shared_knowledge.agent_findings.get("WebSearchAgent").cloned(),
            Some("one relevant result".to_string())
        );
    }

    #[tokio::test]
    async fn disabled_agent_is_a_no_op() {
        let advisor = ScriptedAdvisor::new(vec![]);
        let store = InMemoryVectorStore::default();
        let agent = WebSearchAgent::with_enabled(Box::new(NullWebSearchClient), false);
        let mut ctx = ResearchContext::new("q", vec![]);

        agent.process(&mut ctx, &advisor, &store).await.unwrap_or_else(|e| panic!("{e}"));

        assert!(ctx.rag_results.chunks.is_empty());
        assert_eq!(advisor.call_count(), 0);
        assert_eq!(
            ctx.shared_knowledge.agent_findings.get("WebSearchAgent").cloned(),
            Some("web search disabled".to_string())
        );
    }
}
