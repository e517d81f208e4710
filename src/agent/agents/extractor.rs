//! `Extractor` agent: pulls structured items out of matching chunks.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;

use crate::agent::json_util::parse_lenient;
use crate::agent::prompt::{build_extractor_prompt, EXTRACTOR_SYSTEM_PROMPT};
use crate::agent::provider::LlmAdvisor;
use crate::agent::traits::Agent;
use crate::agent::vector_store::VectorStore;
use crate::core::{ExtractionMethod, Item, ItemKind, ItemMetadata, ResearchContext};
use crate::error::AgentError;

#[derive(Debug, Default, Deserialize)]
struct ProposedItem {
    #[serde(default)]
    content: String,
    #[serde(default)]
    value: Option<f64>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    source_chunk_id: Option<String>,
    #[serde(default)]
    method: Option<ExtractionMethod>,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    row_number: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ExtractorResponse {
    #[serde(default)]
    items: Vec<ProposedItem>,
}

fn classify_kind(raw: Option<&str>) -> Option<ItemKind> {
    raw.map(|s| match s {
        "current_record" => ItemKind::CurrentRecord,
        "table_row" => ItemKind::TableRow,
        "numbered_row" => ItemKind::NumberedRow,
        other => ItemKind::Other(other.to_string()),
    })
}

fn summarize_patterns(ctx: &ResearchContext) -> String {
    ctx.patterns
        .iter()
        .map(|p| p.regex_pattern.clone().unwrap_or_else(|| p.description.clone()))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Applies proposed patterns (and the advisor's own direct reading) to
/// pull structured items out of the retrieved chunks. Also runs every
/// valid regex pattern directly over the chunk text as a deterministic
/// backstop to the advisor's own extraction.
pub struct Extractor;

#[async_trait]
impl Agent for Extractor {
    fn name(&self) -> &'static str {
        "Extractor"
    }

    fn description(&self) -> &str {
        "Extracts structured items from chunks using the proposed patterns."
    }

    async fn process(
        &self,
        context: &mut ResearchContext,
        advisor: &dyn LlmAdvisor,
        _vector_store: &dyn VectorStore,
    ) -> Result<(), AgentError> {
        let prompt = build_extractor_prompt(
            &context.query,
            &summarize_patterns(context),
            &context.rag_results.chunks,
        );
        let raw = advisor.llm(&format!("{EXTRACTOR_SYSTEM_PROMPT}\n\n{prompt}")).await?;
        let parsed: ExtractorResponse = parse_lenient(&raw);

        for proposed in parsed.items {
            if proposed.content.is_empty() {
                continue;
            }
            let mut item = Item::new(proposed.content, proposed.confidence);
            item.value = proposed.value;
            item.unit = proposed.unit;
            item.context = proposed.context;
            item.source_chunk_id = proposed.source_chunk_id;
            item.metadata = ItemMetadata {
                kind: classify_kind(proposed.kind.as_deref()),
                method: proposed.method,
                row_number: proposed.row_number,
                extra: std::collections::HashMap::new(),
            };
            context.extracted_data.raw.push(item);
        }

        for pattern in &context.patterns {
            let Some(regex_str) = &pattern.regex_pattern else { continue };
            let Ok(regex) = Regex::new(regex_str) else { continue };
            for chunk in &context.rag_results.chunks {
                for found in regex.find_iter(&chunk.text) {
                    let mut item = Item::new(found.as_str(), pattern.confidence);
                    item.source_chunk_id = Some(chunk.id.clone());
                    item.metadata.method = Some(ExtractionMethod::Regex);
                    context.extracted_data.raw.push(item);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::provider::ScriptedAdvisor;
    use crate::agent::vector_store::InMemoryVectorStore;
    use crate::core::Chunk;

    #[tokio::test]
    async fn collects_advisor_items_and_regex_matches() {
        let response = r#"{"items": [{"content": "12.5 kg", "value": 12.5, "unit": "kg", "confidence": 0.9, "context": "sample", "source_chunk_id": "1", "method": "llm", "kind": "current_record"}]}"#;
        let advisor = ScriptedAdvisor::new(vec![response.to_string()]);
        let store = InMemoryVectorStore::default();
        let mut ctx = ResearchContext::new("q", vec![Chunk::rag("1", "recorded 13.0 kg today", "a", 0.5)]);
        let mut pattern = crate::core::Pattern::new("kg", 0.8);
        pattern.regex_pattern = Some(r"\d+\.\d+\s*kg".to_string());
        ctx.patterns.push(pattern);

        Extractor.process(&mut ctx, &advisor, &store).await.unwrap_or_else(|e| panic!("{e}"));

        assert_eq!(ctx.extracted_data.raw.len(), 2);
        assert!(ctx.extracted_data.raw.iter().any(|i| i.content == "12.5 kg"));
        assert!(ctx.extracted_data.raw.iter().any(|i| i.content == "13.0 kg"));
    }
}
