//! `DataInspector` agent: first-pass document categorization and approval.

use async_trait::async_trait;
use serde::Deserialize;

use crate::agent::config::OrchestratorConfig;
use crate::agent::json_util::parse_lenient;
use crate::agent::prompt::{build_data_inspector_prompt, DATA_INSPECTOR_SYSTEM_PROMPT};
use crate::agent::provider::LlmAdvisor;
use crate::agent::traits::Agent;
use crate::agent::vector_store::VectorStore;
use crate::core::{
    Chunk, DocumentAnalysis, DocumentInsights, DocumentSummary, Measurement, ResearchContext,
    Understanding,
};
use crate::error::AgentError;

#[derive(Debug, Default, Deserialize)]
struct DataInspectorResponse {
    #[serde(default)]
    documents: Vec<DocumentSummary>,
    #[serde(default)]
    query_intent: String,
    #[serde(default)]
    domain: String,
    #[serde(default)]
    query_type: String,
    #[serde(default)]
    requirements: Vec<String>,
    #[serde(default)]
    document_type: String,
    #[serde(default)]
    content_areas: Vec<String>,
    #[serde(default)]
    specific_insights: Vec<String>,
    #[serde(default)]
    key_findings: Vec<String>,
    #[serde(default)]
    measurements: Vec<Measurement>,
}

/// Categorizes retrieved documents, reads the query's intent, and
/// harvests numeric measurements for downstream pattern induction.
pub struct DataInspector {
    sample_size: usize,
}

impl DataInspector {
    /// Builds a `DataInspector` sampling up to `config.data_inspector_sample` chunks.
    #[must_use]
    pub fn new(config: &OrchestratorConfig) -> Self {
        Self {
            sample_size: config.data_inspector_sample,
        }
    }

    fn sample(&self, chunks: &[Chunk]) -> Vec<Chunk> {
        chunks.iter().take(self.sample_size).cloned().collect()
    }
}

#[async_trait]
impl Agent for DataInspector {
    fn name(&self) -> &'static str {
        "DataInspector"
    }

    fn description(&self) -> &str {
        "Categorizes retrieved documents, reads query intent, and harvests numeric measurements."
    }

    async fn process(
        &self,
        context: &mut ResearchContext,
        advisor: &dyn LlmAdvisor,
        _vector_store: &dyn VectorStore,
    ) -> Result<(), AgentError> {
        let sample = self.sample(&context.rag_results.chunks);
        let prompt = build_data_inspector_prompt(&context.query, &sample);
        let raw = advisor.llm(&format!("{DATA_INSPECTOR_SYSTEM_PROMPT}\n\n{prompt}")).await?;
        let parsed: DataInspectorResponse = parse_lenient(&raw);

        let approved_document_ids = parsed
            .documents
            .iter()
            .filter(|d| d.relevant)
            .map(|d| d.document_id.clone())
            .collect();

        context.document_analysis = Some(DocumentAnalysis {
            documents: parsed.documents,
            approved_document_ids,
        });

        context.understanding = Understanding {
            intent: parsed.query_intent.clone(),
            domain: parsed.domain,
            requirements: parsed.requirements,
            query_type: parsed.query_type,
        };

        context.shared_knowledge.document_insights = DocumentInsights {
            document_type: parsed.document_type,
            content_areas: parsed.content_areas,
            query_intent: parsed.query_intent,
            specific_insights: parsed.specific_insights,
            key_findings: parsed.key_findings,
            measurements: parsed.measurements,
        };

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::provider::ScriptedAdvisor;
    use crate::agent::vector_store::InMemoryVectorStore;

    #[tokio::test]
    async fn populates_document_analysis_and_insights() {
        let response = r#"{
            "documents": [{"document_id": "d1", "title": "Doc", "relevant": true}],
            "query_intent": "find benchmarks",
            "domain": "ml",
            "query_type": "ranking",
            "requirements": ["must cite numbers"],
            "document_type": "benchmark-report",
            "content_areas": ["latency"],
            "specific_insights": ["model A is faster"],
            "key_findings": ["A beats B"],
            "measurements": [{"number": "12.5", "left_context": "latency was", "right_context": "ms"}]
        }"#;
        let advisor = ScriptedAdvisor::new(vec![response.to_string()]);
        let store = InMemoryVectorStore::default();
        let config = OrchestratorConfig::default();
        let inspector = DataInspector::new(&config);

        let mut ctx = ResearchContext::new("q", vec![Chunk::rag("1", "text", "doc.txt", 0.9)]);
        inspector.process(&mut ctx, &advisor, &store).await.unwrap_or_else(|e| panic!("{e}"));

        let analysis = ctx.document_analysis.unwrap_or_default();
        assert_eq!(analysis.approved_document_ids, vec!["d1".to_string()]);
        assert_eq!(ctx.understanding.intent, "find benchmarks");
        assert_eq!(ctx.shared_knowledge.document_insights.measurements.len(), 1);
    }

    #[tokio::test]
    async fn garbage_response_does_not_error() {
        let advisor = ScriptedAdvisor::new(vec!["not json".to_string()]);
        let store = InMemoryVectorStore::default();
        let config = OrchestratorConfig::default();
        let inspector = DataInspector::new(&config);
        let mut ctx = ResearchContext::new("q", vec![]);
        assert!(inspector.process(&mut ctx, &advisor, &store).await.is_ok());
    }
}
