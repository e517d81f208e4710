//! `SynthesisCoordinator` agent: turns extracted items into the final answer.
//!
//! Reads `ExtractedData::raw` directly, bypassing a separate analysis
//! stage — see DESIGN.md Open Question decision #1 for why this is the
//! sole synthesis stage in this build. Cleaning, deduplication, grouping,
//! sorting, and report assembly are all deterministic; the only LLM call
//! left in this agent classifies each group as current/historical/other.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::agent::prompt::{build_group_classification_prompt, GROUP_CLASSIFICATION_SYSTEM_PROMPT};
use crate::agent::provider::LlmAdvisor;
use crate::agent::traits::Agent;
use crate::agent::vector_store::VectorStore;
use crate::core::{Chunk, Item, ItemGroup, ItemKind, ResearchContext, Synthesis, SynthesisStructure};
use crate::error::AgentError;

/// Minimum surviving content length after cleaning; shorter fragments
/// carry no citable information.
const MIN_CONTENT_LEN: usize = 4;
/// Token-overlap floor for treating two items as duplicates, once their
/// value+unit already match exactly.
const DEDUP_OVERLAP_THRESHOLD: f32 = 0.95;

/// Strips stray markdown emphasis, leading bullets, and trailing colons;
/// collapses internal whitespace.
fn clean_content(raw: &str) -> String {
    let mut s = raw.trim();
    while let Some(rest) = s.strip_prefix("**") {
        s = rest;
    }
    while let Some(rest) = s.strip_suffix("**") {
        s = rest;
    }
    let s = s.trim_start_matches(['-', '*', '•', '\u{2022}']).trim();
    let s = s.trim_end_matches(':').trim();
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_for_match(content: &str) -> String {
    content.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn token_overlap(a: &str, b: &str) -> f32 {
    let ta: HashSet<&str> = a.split_whitespace().collect();
    let tb: HashSet<&str> = b.split_whitespace().collect();
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let intersection = ta.intersection(&tb).count();
    let union = ta.union(&tb).count();
    #[allow(clippy::cast_precision_loss)]
    (intersection as f32 / union as f32)
}

/// Ranks an item's citation-worthiness: rewards mentions of concrete run
////measurement language, penalizes single-word fragments.
fn content_quality_score(item: &Item) -> f32 {
    let lower = item.content.to_lowercase();
    let mut score = item.confidence;
    for kw in ["run ", "optimization", "speed", "batch", "training", "completed in"] {
        if lower.contains(kw) {
            score += 0.2;
        }
    }
    if item.content.split_whitespace().count() <= 1 {
        score -= 0.3;
    }
    score
}

/// Cleans and deduplicates raw items. Two items merge only when they
/// normalize to the same text, or share an identical value+unit AND are
/// at least 95% token-overlapping — distinct numeric values are never
/// merged into one another, however similar their surrounding text.
fn clean_and_dedup(raw: &[Item]) -> Vec<Item> {
    let mut cleaned: Vec<Item> = raw
        .iter()
        .cloned()
        .map(|mut item| {
            item.content = clean_content(&item.content);
            item
        })
        .filter(|item| item.content.chars().count() >= MIN_CONTENT_LEN)
        .collect();

    cleaned.sort_by(|a, b| {
        content_quality_score(b)
            .partial_cmp(&content_quality_score(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Item> = Vec::new();
    for item in cleaned {
        let normalized = normalize_for_match(&item.content);
        let duplicate = kept.iter().any(|existing| {
            let existing_normalized = normalize_for_match(&existing.content);
            if existing_normalized == normalized {
                return true;
            }
            if existing.value != item.value || existing.unit != item.unit {
                return false;
            }
            token_overlap(&existing_normalized, &normalized) >= DEDUP_OVERLAP_THRESHOLD
        });
        if !duplicate {
            kept.push(item);
        }
    }
    kept
}

fn truncate(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn value_label(item: &Item) -> String {
    item.value.map(|v| format!("{v}")).unwrap_or_default()
}

/// §4.7.2 smart grouping key: table rows and positional list entries get
/// structural keys; a current record gets a value+timestamp key; anything
/// else falls back to a truncated content/value/unit fingerprint.
fn group_key(item: &Item, position: usize) -> String {
    match &item.metadata.kind {
        Some(ItemKind::TableRow) => {
            let row = item.metadata.row_number.unwrap_or(u32::try_from(position).unwrap_or(u32::MAX));
            format!("table_row_{row}_{}", truncate(&item.content, 30))
        }
        Some(ItemKind::NumberedRow) => {
            format!("list_{position}_{}", value_label(item))
        }
        Some(ItemKind::CurrentRecord) => {
            let timestamp = item.metadata.extra.get("timestamp").cloned().unwrap_or_default();
            format!("current_record_{}_{timestamp}", value_label(item))
        }
        _ => {
            let unit = item.unit.as_deref().unwrap_or("");
            format!(
                "{}_{}_{}",
                truncate(&normalize_for_match(&item.content), 30),
                value_label(item),
                truncate(unit, 3)
            )
        }
    }
}

fn group_items(items: &[Item]) -> Vec<ItemGroup> {
    let mut groups: HashMap<String, Vec<Item>> = HashMap::new();
    for (position, item) in items.iter().enumerate() {
        groups.entry(group_key(item, position)).or_default().push(item.clone());
    }
    let mut out: Vec<ItemGroup> = groups.into_iter().map(|(key, items)| ItemGroup { key, items }).collect();
    out.sort_by(|a, b| a.key.cmp(&b.key));
    out
}

fn parse_classification(raw: &str) -> &'static str {
    let lower = raw.to_lowercase();
    if lower.contains("current") {
        "current"
    } else if lower.contains("historical") {
        "historical"
    } else {
        "other"
    }
}

/// Whether the query wants the minimum (ascending sort) rather than the
/// maximum (descending sort) of whatever's being compared.
fn wants_minimum(query: &str) -> bool {
    let lower = query.to_lowercase();
    ["slowest", "lowest", "minimum", "least", "smallest", "worst", "cheapest"]
        .iter()
        .any(|kw| lower.contains(kw))
}

fn source_label(item: &Item, chunks: &[Chunk]) -> String {
    item.source_chunk_id
        .as_deref()
        .and_then(|id| chunks.iter().find(|c| c.id == id))
        .map(|c| c.source.clone())
        .unwrap_or_else(|| "unknown source".to_string())
}

fn no_results_report(query: &str, chunks_scanned: usize) -> String {
    format!(
        "## No Results\n\nNo evidence matching \"{query}\" was found in the {chunks_scanned} chunk(s) scanned.\n\n\
         Consider broadening the query, confirming the right documents were retrieved, or rerunning \
         Extractor with adjusted patterns."
    )
}

/// Assembles the five mandated report sections from cleaned, grouped,
/// classified items. Prefers items from groups classified `current`;
/// falls back to every group when nothing was classified current.
fn build_report(
    query: &str,
    groups: &[ItemGroup],
    classifications: &HashMap<String, &'static str>,
    chunks: &[Chunk],
    minimum_wanted: bool,
) -> (String, f32) {
    let mut selected: Vec<&Item> = groups
        .iter()
        .filter(|g| classifications.get(&g.key).copied() == Some("current"))
        .flat_map(|g| g.items.iter())
        .collect();
    if selected.is_empty() {
        selected = groups.iter().flat_map(|g| g.items.iter()).collect();
    }

    selected.sort_by(|a, b| {
        let fallback = if minimum_wanted { f64::MAX } else { f64::MIN };
        let av = a.value.unwrap_or(fallback);
        let bv = b.value.unwrap_or(fallback);
        if minimum_wanted {
            av.partial_cmp(&bv).unwrap_or(std::cmp::Ordering::Equal)
        } else {
            bv.partial_cmp(&av).unwrap_or(std::cmp::Ordering::Equal)
        }
    });

    let critical = selected
        .iter()
        .take(3)
        .map(|i| format!("- {}", i.content))
        .collect::<Vec<_>>()
        .join("\n");

    let detailed = selected
        .iter()
        .map(|i| format!("- {} (confidence {:.2})", i.content, i.confidence))
        .collect::<Vec<_>>()
        .join("\n");

    let mut table = String::from("| Value | Unit | Source |\n|---|---|---|\n");
    for item in &selected {
        table.push_str(&format!(
            "| {} | {} | {} |\n",
            item.value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string()),
            item.unit.as_deref().unwrap_or("-"),
            source_label(item, chunks),
        ));
    }

    let mut sources: Vec<String> = selected.iter().map(|i| source_label(i, chunks)).collect();
    sources.sort();
    sources.dedup();
    let sources_section = sources.iter().map(|s| format!("- {s}")).collect::<Vec<_>>().join("\n");

    let confidence = if selected.is_empty() {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let mean = selected.iter().map(|i| i.confidence).sum::<f32>() / selected.len() as f32;
        mean
    };

    let report = format!(
        "## Critical Information\n{critical}\n\n\
         ## Detailed Analysis\n{detailed}\n\n\
         ## Full Results Table\n{table}\n\
         ## Sources & References\n{sources_section}\n\n\
         ## Confidence & Methodology\nConfidence: {confidence:.2}. Derived from {count} grouped item(s) \
         extracted in response to \"{query}\"."
        ,
        count = selected.len(),
    );

    (report, confidence)
}

/// Synthesizes the final answer from extracted items: cleans and
/// deduplicates them, groups by a smart key, classifies each group, and
/// assembles a sectioned report citing sources.
pub struct SynthesisCoordinator;

#[async_trait]
impl Agent for SynthesisCoordinator {
    fn name(&self) -> &'static str {
        "SynthesisCoordinator"
    }

    fn description(&self) -> &str {
        "Synthesizes the final answer from extracted items, choosing its presentation."
    }

    async fn process(
        &self,
        context: &mut ResearchContext,
        advisor: &dyn LlmAdvisor,
        _vector_store: &dyn VectorStore,
    ) -> Result<(), AgentError> {
        if context.extracted_data.raw.is_empty() {
            context.synthesis = Synthesis {
                answer: no_results_report(&context.query, context.rag_results.chunks.len()),
                reasoning: "no extracted items were available to synthesize".to_string(),
                confidence: 0.0,
                structure: SynthesisStructure::Explanation,
            };
            return Ok(());
        }

        let cleaned = clean_and_dedup(&context.extracted_data.raw);
        let groups = group_items(&cleaned);

        let mut classifications: HashMap<String, &'static str> = HashMap::new();
        for group in &groups {
            let sample = group.items.iter().take(3).map(|i| i.content.clone()).collect::<Vec<_>>().join("; ");
            let prompt = build_group_classification_prompt(&context.query, &sample);
            let raw = advisor
                .llm(&format!("{GROUP_CLASSIFICATION_SYSTEM_PROMPT}\n\n{prompt}"))
                .await
                .unwrap_or_default();
            classifications.insert(group.key.clone(), parse_classification(&raw));
        }

        context.extracted_data.structured = groups.clone();

        let minimum_wanted = wants_minimum(&context.query);
        let (report, confidence) = build_report(&context.query, &groups, &classifications, &context.rag_results.chunks, minimum_wanted);

        context.synthesis = Synthesis {
            answer: report,
            reasoning: "deterministic synthesis over cleaned, grouped, and classified items".to_string(),
            confidence: confidence.clamp(0.0, 1.0),
            structure: SynthesisStructure::List,
        };

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::provider::ScriptedAdvisor;
    use crate::agent::vector_store::InMemoryVectorStore;
    use crate::core::ItemMetadata;

    #[tokio::test]
    async fn groups_and_reports_on_extracted_items() {
        let advisor = ScriptedAdvisor::new(vec!["CLASSIFICATION: current".to_string()]);
        let store = InMemoryVectorStore::default();
        let mut ctx = ResearchContext::new("which model is fastest?", vec![Chunk::rag("1", "t", "model-a.md", 0.9)]);

        let mut item_a = Item::new("Model A completed in 12.5 seconds", 0.8);
        item_a.value = Some(12.5);
        item_a.unit = Some("seconds".to_string());
        item_a.source_chunk_id = Some("1".to_string());
        let mut item_b = Item::new("Model B completed in 13.0 seconds", 0.7);
        item_b.value = Some(13.0);
        item_b.unit = Some("seconds".to_string());
        item_b.source_chunk_id = Some("1".to_string());
        ctx.extracted_data.raw = vec![item_a, item_b];

        SynthesisCoordinator.process(&mut ctx, &advisor, &store).await.unwrap_or_else(|e| panic!("{e}"));

        assert_eq!(ctx.extracted_data.structured.len(), 2);
        assert!(ctx.synthesis.answer.contains("## Critical Information"));
        assert!(ctx.synthesis.answer.contains("## Full Results Table"));
        assert!(ctx.synthesis.answer.contains("## Sources & References"));
        assert!(ctx.synthesis.answer.contains("model-a.md"));
        assert!(ctx.synthesis.confidence > 0.0);
    }

    #[tokio::test]
    async fn empty_items_produce_no_results_report() {
        let advisor = ScriptedAdvisor::new(vec![]);
        let store = InMemoryVectorStore::default();
        let mut ctx = ResearchContext::new("q", vec![]);
        SynthesisCoordinator.process(&mut ctx, &advisor, &store).await.unwrap_or_else(|e| panic!("{e}"));
        assert!(ctx.synthesis.answer.contains("No Results"));
        assert_eq!(ctx.synthesis.confidence, 0.0);
    }

    #[tokio::test]
    async fn distinct_numeric_values_survive_dedup() {
        let advisor = ScriptedAdvisor::new(vec!["CLASSIFICATION: current".to_string()]);
        let store = InMemoryVectorStore::default();
        let mut ctx = ResearchContext::new("q", vec![]);

        let mut item_a = Item::new("throughput measured at 120 tokens", 0.9);
        item_a.value = Some(120.0);
        item_a.unit = Some("tokens".to_string());
        let mut item_b = Item::new("throughput measured at 95 tokens", 0.9);
        item_b.value = Some(95.0);
        item_b.unit = Some("tokens".to_string());
        ctx.extracted_data.raw = vec![item_a, item_b];

        SynthesisCoordinator.process(&mut ctx, &advisor, &store).await.unwrap_or_else(|e| panic!("{e}"));

        let total_items: usize = ctx.extracted_data.structured.iter().map(|g| g.items.len()).sum();
        assert_eq!(total_items, 2, "distinct numeric values must never merge, even with near-identical text");
    }

    #[tokio::test]
    async fn near_duplicate_text_with_same_value_and_unit_merges() {
        let advisor = ScriptedAdvisor::new(vec!["CLASSIFICATION: current".to_string()]);
        let store = InMemoryVectorStore::default();
        let mut ctx = ResearchContext::new("q", vec![]);

        let mut item_a = Item::new("the benchmark run completed in 12.5 seconds", 0.9);
        item_a.value = Some(12.5);
        item_a.unit = Some("seconds".to_string());
        let mut item_b = Item::new("**the benchmark run completed in 12.5 seconds**", 0.6);
        item_b.value = Some(12.5);
        item_b.unit = Some("seconds".to_string());
        ctx.extracted_data.raw = vec![item_a, item_b];

        SynthesisCoordinator.process(&mut ctx, &advisor, &store).await.unwrap_or_else(|e| panic!("{e}"));

        let total_items: usize = ctx.extracted_data.structured.iter().map(|g| g.items.len()).sum();
        assert_eq!(total_items, 1);
    }

    #[tokio::test]
    async fn sorts_ascending_for_minimum_wanted_query() {
        let advisor = ScriptedAdvisor::new(vec!["CLASSIFICATION: current".to_string()]);
        let store = InMemoryVectorStore::default();
        let mut ctx = ResearchContext::new("which run was slowest, in seconds?", vec![]);

        let mut fast = Item::new("fast run completed in 5 seconds", 0.9);
        fast.value = Some(5.0);
        fast.unit = Some("seconds".to_string());
        let mut slow = Item::new("slow run completed in 50 seconds", 0.9);
        slow.value = Some(50.0);
        slow.unit = Some("seconds".to_string());
        ctx.extracted_data.raw = vec![slow, fast];

        SynthesisCoordinator.process(&mut ctx, &advisor, &store).await.unwrap_or_else(|e| panic!("{e}"));

        let first_value_pos = ctx.synthesis.answer.find("5 seconds").unwrap_or(usize::MAX);
        let second_value_pos = ctx.synthesis.answer.find("50 seconds").unwrap_or(usize::MAX);
        assert!(first_value_pos < second_value_pos, "ascending order expected for a minimum-wanted query");
    }

    #[tokio::test]
    async fn table_row_items_group_by_row_number() {
        let advisor = ScriptedAdvisor::new(vec!["CLASSIFICATION: other".to_string()]);
        let store = InMemoryVectorStore::default();
        let mut ctx = ResearchContext::new("q", vec![]);

        let mut row = Item::new("row one value 12.5 kg", 0.8);
        row.metadata = ItemMetadata {
            kind: Some(ItemKind::TableRow),
            row_number: Some(1),
            ..ItemMetadata::default()
        };
        ctx.extracted_data.raw = vec![row];

        SynthesisCoordinator.process(&mut ctx, &advisor, &store).await.unwrap_or_else(|e| panic!("{e}"));
        assert!(ctx.extracted_data.structured[0].key.starts_with("table_row_1_"));
    }
}
