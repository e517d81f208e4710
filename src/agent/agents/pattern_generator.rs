//! `PatternGenerator` agent: proposes extraction regex patterns.
//!
//! Combines the advisor's proposed patterns, strategy-driven patterns
//! built from grounded terms in `shared_knowledge.extraction_strategies`,
//! deterministic performance-ranking patterns when the query calls for
//! one, and the bottom-up induced patterns from
//! [`crate::agent::pattern_inducer`] — discarding anything that fails
//! the shared malformed-pattern heuristics. Also augments the retrieved
//! chunk set from the vector store when `query_constraints` calls for it.

use std::collections::HashSet;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;

use crate::agent::json_util::parse_lenient;
use crate::agent::pattern_inducer::{induce_patterns, is_malformed_pattern};
use crate::agent::prompt::{build_pattern_generator_prompt, PATTERN_GENERATOR_SYSTEM_PROMPT};
use crate::agent::provider::LlmAdvisor;
use crate::agent::traits::Agent;
use crate::agent::vector_store::{DocumentView, VectorStore};
use crate::core::{ExtractionStrategy, Pattern, QueryConstraints, ResearchContext, Strictness};
use crate::error::AgentError;

#[derive(Debug, Default, Deserialize)]
struct ProposedPattern {
    #[serde(default)]
    description: String,
    #[serde(default)]
    regex: String,
    #[serde(default)]
    examples: Vec<String>,
    #[serde(default)]
    confidence: f32,
}

#[derive(Debug, Default, Deserialize)]
struct PatternGeneratorResponse {
    #[serde(default)]
    patterns: Vec<ProposedPattern>,
    #[serde(default)]
    extraction_strategies: Vec<ExtractionStrategy>,
}

fn summarize_insights(ctx: &ResearchContext) -> String {
    let insights = &ctx.shared_knowledge.document_insights;
    format!(
        "document_type={}; content_areas={:?}; measurements={}",
        insights.document_type,
        insights.content_areas,
        insights.measurements.len()
    )
}

const STRATEGY_PATTERN_CONFIDENCE: f32 = 0.75;

/// Splits `term` on space/dash/underscore and rejoins the escaped parts
/// with a flexible `[-_\s]+` joiner, so "data-parallel" and "data
/// parallel" both match the same pattern.
fn regex_escape_flexible(term: &str) -> String {
    term.split([' ', '-', '_'])
        .filter(|part| !part.is_empty())
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"[-_\s]+")
}

fn person_pattern(name: &str) -> Option<Pattern> {
    let body = regex_escape_flexible(name);
    if body.is_empty() {
        return None;
    }
    let mut pattern = Pattern::new(format!("person: {name}"), STRATEGY_PATTERN_CONFIDENCE);
    pattern.regex_pattern = Some(format!(r"\b{body}\b"));
    pattern.extraction_strategy = "strategy:person".to_string();
    Some(pattern)
}

fn method_pattern(name: &str) -> Option<Pattern> {
    let body = regex_escape_flexible(name);
    if body.is_empty() {
        return None;
    }
    let mut pattern = Pattern::new(format!("method: {name}"), STRATEGY_PATTERN_CONFIDENCE);
    pattern.regex_pattern = Some(body);
    pattern.extraction_strategy = "strategy:method".to_string();
    Some(pattern)
}

fn concept_pattern(name: &str) -> Option<Pattern> {
    let body = regex_escape_flexible(name);
    if body.is_empty() {
        return None;
    }
    let mut pattern = Pattern::new(format!("concept: {name}"), STRATEGY_PATTERN_CONFIDENCE);
    pattern.regex_pattern = Some(body);
    pattern.extraction_strategy = "strategy:concept".to_string();
    Some(pattern)
}

/// A labeled-field pattern for a data/document-type term, e.g. "accuracy"
/// becomes `(?i)accuracy\s*:\s*\S.*`.
fn document_field_pattern(label: &str) -> Option<Pattern> {
    let escaped = regex_escape_flexible(label);
    if escaped.is_empty() {
        return None;
    }
    let mut pattern = Pattern::new(format!("field: {label}"), STRATEGY_PATTERN_CONFIDENCE);
    pattern.regex_pattern = Some(format!(r"(?i){escaped}\s*:\s*\S.*"));
    pattern.extraction_strategy = "strategy:data".to_string();
    Some(pattern)
}

/// Builds one pattern per grounded term in every registered extraction
/// strategy, validating each regex before it survives.
fn strategy_patterns(ctx: &ResearchContext) -> Vec<Pattern> {
    let mut patterns = Vec::new();
    for strategy in ctx.shared_knowledge.extraction_strategies.values() {
        let categories = &strategy.pattern_categories;
        for name in &categories.people {
            patterns.extend(person_pattern(name));
        }
        for name in &categories.methods {
            patterns.extend(method_pattern(name));
        }
        for name in &categories.concepts {
            patterns.extend(concept_pattern(name));
        }
        for label in &categories.data {
            patterns.extend(document_field_pattern(label));
        }
    }
    patterns.retain(|p| {
        p.regex_pattern.as_deref().is_some_and(|r| !is_malformed_pattern(r) && Regex::new(r).is_ok())
    });
    patterns
}

/// Deterministic patterns for performance-ranking answers: record-time
/// durations, throughput figures, and the labeled fields/table rows those
/// numbers typically show up in.
const PERFORMANCE_RANKING_PATTERNS: &[(&str, &str)] = &[
    ("record time (hours/minutes)", r"\d+(?:\.\d+)?\s*(?:hours?|hrs?|minutes?|mins?)"),
    ("throughput (tokens/s and synonyms)", r"\d+(?:\.\d+)?\s*(?:tokens?/s(?:ec)?|tok/s|tokens?\s+per\s+second)"),
    ("labeled record time field", r"(?i)record\s*time\s*:\s*\S.*"),
    ("labeled tokens-per-second field", r"(?i)tokens?\s*/?\s*second\s*:\s*\S.*"),
    ("pipe-delimited table row", r"\|[^|]+\|[^|]+\|"),
];

fn performance_ranking_patterns() -> Vec<Pattern> {
    PERFORMANCE_RANKING_PATTERNS
        .iter()
        .filter(|(_, regex)| !is_malformed_pattern(regex) && Regex::new(regex).is_ok())
        .map(|(description, regex)| {
            let mut pattern = Pattern::new(format!("performance ranking: {description}"), STRATEGY_PATTERN_CONFIDENCE);
            pattern.regex_pattern = Some((*regex).to_string());
            pattern.extraction_strategy = "strategy:performance_ranking".to_string();
            pattern
        })
        .collect()
}

fn grounded_terms(ctx: &ResearchContext) -> Vec<String> {
    let mut terms = Vec::new();
    for strategy in ctx.shared_knowledge.extraction_strategies.values() {
        let categories = &strategy.pattern_categories;
        terms.extend(categories.people.iter().cloned());
        terms.extend(categories.methods.iter().cloned());
        terms.extend(categories.concepts.iter().cloned());
        terms.extend(categories.data.iter().cloned());
    }
    terms.sort();
    terms.dedup();
    terms
}

/// Whether `doc` satisfies a hard (`Strictness::Must`) query constraint.
/// Soft (`Should`) constraints never block a hit.
fn satisfies_must(constraints: &QueryConstraints, doc: &DocumentView) -> bool {
    if constraints.strictness != Strictness::Must {
        return true;
    }
    if !constraints.expected_domain_candidates.is_empty() {
        let filename = doc.filename.as_deref().unwrap_or_default();
        if !constraints.expected_domain_candidates.iter().any(|d| filename.contains(d.as_str())) {
            return false;
        }
    }
    if !constraints.expected_title_hints.is_empty() {
        let title = doc.title.as_deref().unwrap_or_default();
        let filename = doc.filename.as_deref().unwrap_or_default();
        if !constraints
            .expected_title_hints
            .iter()
            .any(|hint| title.contains(hint.as_str()) || filename.contains(hint.as_str()))
        {
            return false;
        }
    }
    if let Some(owner) = &constraints.expected_owner {
        if doc.owner.as_deref() != Some(owner.as_str()) {
            return false;
        }
    }
    true
}

/// Designs extraction patterns, validating every regex (advisor-proposed
/// or induced) before it can be appended to `context.patterns`.
pub struct PatternGenerator {
    pattern_cap: usize,
    rxdb_cap: usize,
}

impl PatternGenerator {
    /// Builds a `PatternGenerator` keeping up to `pattern_cap` induced
    /// patterns and adding at most `rxdb_cap` new chunks via vector-store
    /// augmentation.
    #[must_use]
    pub const fn new(pattern_cap: usize, rxdb_cap: usize) -> Self {
        Self { pattern_cap, rxdb_cap }
    }

    /// Pulls additional chunks from `vector_store` for each grounded term,
    /// gated by `query_constraints` when present, capped at `rxdb_cap`
    /// total additions, and never re-adding a chunk id already present.
    async fn augment_from_vector_store(&self, context: &mut ResearchContext, vector_store: &dyn VectorStore) {
        let constraints = context.shared_knowledge.query_constraints.clone();
        let terms = grounded_terms(context);
        if terms.is_empty() {
            return;
        }

        let mut seen: HashSet<String> = context.rag_results.chunks.iter().map(|c| c.id.clone()).collect();
        let mut added = 0usize;

        for term in terms {
            if added >= self.rxdb_cap {
                break;
            }
            let Ok(hits) = vector_store.search_similar(&term, 0.3, 5, Some("userdocs")).await else {
                continue;
            };
            for hit in hits {
                if added >= self.rxdb_cap {
                    break;
                }
                if seen.contains(&hit.chunk.id) {
                    continue;
                }
                if let Some(constraints) = &constraints {
                    if !satisfies_must(constraints, &hit.document) {
                        continue;
                    }
                }
                seen.insert(hit.chunk.id.clone());
                context.rag_results.chunks.push(hit.chunk);
                added += 1;
            }
        }
    }
}

#[async_trait]
impl Agent for PatternGenerator {
    fn name(&self) -> &'static str {
        "PatternGenerator"
    }

    fn description(&self) -> &str {
        "Designs and validates regex patterns and grounded term lists for extraction."
    }

    async fn process(
        &self,
        context: &mut ResearchContext,
        advisor: &dyn LlmAdvisor,
        vector_store: &dyn VectorStore,
    ) -> Result<(), AgentError> {
        let prompt = build_pattern_generator_prompt(&context.query, &summarize_insights(context));
        let raw = advisor.llm(&format!("{PATTERN_GENERATOR_SYSTEM_PROMPT}\n\n{prompt}")).await?;
        let parsed: PatternGeneratorResponse = parse_lenient(&raw);

        for proposed in parsed.patterns {
            if proposed.regex.is_empty() || is_malformed_pattern(&proposed.regex) {
                continue;
            }
            if Regex::new(&proposed.regex).is_err() {
                continue;
            }
            let mut pattern = Pattern::new(proposed.description, proposed.confidence);
            pattern.examples = proposed.examples;
            pattern.regex_pattern = Some(proposed.regex);
            context.patterns.push(pattern);
        }

        for strategy in parsed.extraction_strategies {
            let key = format!("{}:{}", strategy.document_type, strategy.query_intent);
            context.shared_knowledge.extraction_strategies.insert(key, strategy);
        }

        context.patterns.extend(strategy_patterns(context));

        if context.shared_knowledge.intelligent_expectations.expected_answer_type.as_deref()
            == Some("performance_ranking")
        {
            context.patterns.extend(performance_ranking_patterns());
        }

        self.augment_from_vector_store(context, vector_store).await;

        let texts: Vec<&str> = context.rag_results.chunks.iter().map(|c| c.text.as_str()).collect();
        let induced = induce_patterns(&texts, self.pattern_cap);
        context.patterns.extend(induced);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::provider::ScriptedAdvisor;
    use crate::agent::vector_store::InMemoryVectorStore;
    use crate::core::{Chunk, ExtractionStrategy, PatternCategories};

    #[tokio::test]
    async fn appends_valid_patterns_and_skips_malformed() {
        let response = r#"{
            "patterns": [
                {"description": "kg measurement", "regex": "\\d+\\.\\d+\\s*kg", "examples": ["12.5 kg"], "confidence": 0.8},
                {"description": "degenerate", "regex": "\\d+", "examples": [], "confidence": 0.5},
                {"description": "invalid regex", "regex": "(unterminated", "examples": [], "confidence": 0.5}
            ],
            "extraction_strategies": []
        }"#;
        let advisor = ScriptedAdvisor::new(vec![response.to_string()]);
        let store = InMemoryVectorStore::default();
        let generator = PatternGenerator::new(12, 10);
        let mut ctx = ResearchContext::new("q", vec![]);

        generator.process(&mut ctx, &advisor, &store).await.unwrap_or_else(|e| panic!("{e}"));

        assert_eq!(ctx.patterns.iter().filter(|p| p.description == "kg measurement").count(), 1);
        assert!(ctx.patterns.iter().all(|p| p.description != "degenerate"));
    }

    #[tokio::test]
    async fn also_appends_induced_patterns_from_chunk_text() {
        let advisor = ScriptedAdvisor::new(vec![r#"{"patterns": [], "extraction_strategies": []}"#.to_string()]);
        let store = InMemoryVectorStore::default();
        let generator = PatternGenerator::new(12, 10);
        let mut ctx = ResearchContext::new(
            "q",
            vec![
                Chunk::rag("1", "the sample measured 12.5 kg", "a", 0.5),
                Chunk::rag("2", "a second sample measured 13.0 kg", "b", 0.5),
            ],
        );

        generator.process(&mut ctx, &advisor, &store).await.unwrap_or_else(|e| panic!("{e}"));
        assert!(!ctx.patterns.is_empty());
    }

    #[tokio::test]
    async fn builds_strategy_driven_patterns_per_category() {
        let advisor = ScriptedAdvisor::new(vec![r#"{"patterns": [], "extraction_strategies": []}"#.to_string()]);
        let store = InMemoryVectorStore::default();
        let generator = PatternGenerator::new(12, 10);
        let mut ctx = ResearchContext::new("q", vec![]);
        ctx.shared_knowledge.extraction_strategies.insert(
            "resume:factual".to_string(),
            ExtractionStrategy {
                document_type: "resume".to_string(),
                query_intent: "factual".to_string(),
                pattern_categories: PatternCategories {
                    people: vec!["Jane Doe".to_string()],
                    methods: vec!["gradient-descent".to_string()],
                    concepts: vec!["overfitting".to_string()],
                    data: vec!["accuracy".to_string()],
                },
            },
        );

        generator.process(&mut ctx, &advisor, &store).await.unwrap_or_else(|e| panic!("{e}"));

        assert!(ctx.patterns.iter().any(|p| p.extraction_strategy == "strategy:person"));
        assert!(ctx.patterns.iter().any(|p| p.extraction_strategy == "strategy:method"));
        assert!(ctx.patterns.iter().any(|p| p.extraction_strategy == "strategy:concept"));
        assert!(ctx.patterns.iter().any(|p| p.extraction_strategy == "strategy:data"));
    }

    #[tokio::test]
    async fn adds_performance_ranking_patterns_when_expected() {
        let advisor = ScriptedAdvisor::new(vec![r#"{"patterns": [], "extraction_strategies": []}"#.to_string()]);
        let store = InMemoryVectorStore::default();
        let generator = PatternGenerator::new(12, 10);
        let mut ctx = ResearchContext::new("which model is fastest?", vec![]);
        ctx.shared_knowledge.intelligent_expectations.expected_answer_type = Some("performance_ranking".to_string());

        generator.process(&mut ctx, &advisor, &store).await.unwrap_or_else(|e| panic!("{e}"));

        assert!(ctx.patterns.iter().any(|p| p.extraction_strategy == "strategy:performance_ranking"));
    }

    #[tokio::test]
    async fn no_performance_patterns_without_expectation() {
        let advisor = ScriptedAdvisor::new(vec![r#"{"patterns": [], "extraction_strategies": []}"#.to_string()]);
        let store = InMemoryVectorStore::default();
        let generator = PatternGenerator::new(12, 10);
        let mut ctx = ResearchContext::new("q", vec![]);

        generator.process(&mut ctx, &advisor, &store).await.unwrap_or_else(|e| panic!("{e}"));

        assert!(ctx.patterns.iter().all(|p| p.extraction_strategy != "strategy:performance_ranking"));
    }

    #[tokio::test]
    async fn augments_chunks_from_vector_store_respecting_must_constraints() {
        use crate::agent::vector_store::DocumentView;

        let advisor = ScriptedAdvisor::new(vec![r#"{"patterns": [], "extraction_strategies": []}"#.to_string()]);
        let store = InMemoryVectorStore::new(vec![
            Chunk::rag("extra-1", "gradient-descent tuning notes", "notes.md", 0.0),
            Chunk::rag("extra-2", "gradient-descent tuning notes", "other.md", 0.0),
        ])
        .with_documents(vec![
            DocumentView {
                id: "notes.md".to_string(),
                title: Some("Tuning Notes".to_string()),
                filename: Some("notes.md".to_string()),
                owner: Some("alice".to_string()),
            },
            DocumentView {
                id: "other.md".to_string(),
                title: Some("Unrelated".to_string()),
                filename: Some("other.md".to_string()),
                owner: Some("bob".to_string()),
            },
        ]);
        let generator = PatternGenerator::new(12, 10);
        let mut ctx = ResearchContext::new("q", vec![]);
        ctx.shared_knowledge.extraction_strategies.insert(
            "k".to_string(),
            ExtractionStrategy {
                document_type: "d".to_string(),
                query_intent: "i".to_string(),
                pattern_categories: PatternCategories {
                    people: vec![],
                    methods: vec!["gradient-descent".to_string()],
                    concepts: vec![],
                    data: vec![],
                },
            },
        );
        ctx.shared_knowledge.query_constraints = Some(QueryConstraints {
            expected_domain_candidates: vec![],
            expected_title_hints: vec![],
            expected_owner: Some("alice".to_string()),
            strictness: Strictness::Must,
        });

        generator.process(&mut ctx, &advisor, &store).await.unwrap_or_else(|e| panic!("{e}"));

        assert!(ctx.rag_results.chunks.iter().any(|c| c.id == "extra-1"));
        assert!(ctx.rag_results.chunks.iter().all(|c| c.id != "extra-2"));
    }

    #[tokio::test]
    async fn vector_store_augmentation_is_capped_at_rxdb_cap() {
        let advisor = ScriptedAdvisor::new(vec![r#"{"patterns": [], "extraction_strategies": []}"#.to_string()]);
        let chunks: Vec<Chunk> = (0..5)
            .map(|i| Chunk::rag(format!("extra-{i}"), "gradient-descent tuning notes", format!("doc-{i}.md"), 0.0))
            .collect();
        let store = InMemoryVectorStore::new(chunks);
        let generator = PatternGenerator::new(12, 2);
        let mut ctx = ResearchContext::new("q", vec![]);
        ctx.shared_knowledge.extraction_strategies.insert(
            "k".to_string(),
            ExtractionStrategy {
                document_type: "d".to_string(),
                query_intent: "i".to_string(),
                pattern_categories: PatternCategories {
                    people: vec![],
                    methods: vec!["gradient-descent".to_string()],
                    concepts: vec![],
                    data: vec![],
                },
            },
        );

        generator.process(&mut ctx, &advisor, &store).await.unwrap_or_else(|e| panic!("{e}"));

        assert_eq!(ctx.rag_results.chunks.len(), 2);
    }
}
