//! The shared, append-only record every agent reads and augments.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::chunk::Chunk;

/// One entry in [`DocumentAnalysis::documents`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Identifier of the document within the vector store.
    pub document_id: String,
    /// Title, if known.
    pub title: Option<String>,
    /// Whether DataInspector judged this document relevant to the query.
    pub relevant: bool,
}

/// DataInspector's categorization output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    /// Per-document summaries.
    pub documents: Vec<DocumentSummary>,
    /// `document_id`s judged relevant, preserved for chunk expansion.
    pub approved_document_ids: Vec<String>,
}

/// A harvested numeric measurement with surrounding text, input to
/// [`PatternInducer`](crate::agent::pattern_inducer::PatternInducer).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// The matched numeric text, verbatim.
    pub number: String,
    /// Up to 32 characters preceding the number.
    pub left_context: String,
    /// Up to 32 characters following the number.
    pub right_context: String,
}

/// `sharedKnowledge.documentInsights`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentInsights {
    /// Coarse document classification (e.g. "resume", "benchmark-report").
    pub document_type: String,
    /// Topical areas covered.
    pub content_areas: Vec<String>,
    /// DataInspector's read on what the query is after.
    pub query_intent: String,
    /// Free-form specific insights about the content.
    pub specific_insights: Vec<String>,
    /// Salient findings worth surfacing early.
    pub key_findings: Vec<String>,
    /// Harvested numeric measurements, feeding pattern induction.
    pub measurements: Vec<Measurement>,
}

/// Grounded pattern categories for one extraction strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternCategories {
    /// Named people/entities worth matching.
    pub people: Vec<String>,
    /// Named methods/techniques.
    pub methods: Vec<String>,
    /// Abstract concepts.
    pub concepts: Vec<String>,
    /// Data/field labels (e.g. "accuracy", "results").
    pub data: Vec<String>,
}

/// One entry in `sharedKnowledge.extractionStrategies`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionStrategy {
    /// Document type this strategy targets.
    pub document_type: String,
    /// Query intent this strategy targets.
    pub query_intent: String,
    /// Grounded terms, organized by category.
    pub pattern_categories: PatternCategories,
}

/// One step of `sharedKnowledge.executionPlan.steps`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    /// Canonical (or advisor-emitted, pre-normalization) agent name.
    pub agent: String,
    /// Short description of what this step does.
    pub action: String,
    /// Why this step exists in the plan.
    pub reasoning: String,
    /// Names of steps (by agent name) this step depends on.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// The plan PlanningAgent produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// Ordered steps.
    pub steps: Vec<PlanStep>,
    /// Alternate sequences if the primary plan stalls.
    pub fallback_options: Vec<String>,
}

/// Constraints narrowing retrieval-augmentation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryConstraints {
    /// Candidate document domains expected to be relevant.
    pub expected_domain_candidates: Vec<String>,
    /// Title substrings expected in a relevant document.
    pub expected_title_hints: Vec<String>,
    /// Expected document owner/author, if known.
    pub expected_owner: Option<String>,
    /// How strictly constraints gate augmentation.
    pub strictness: Strictness,
}

/// Strictness level for [`QueryConstraints`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Constraints are a soft preference.
    #[default]
    Should,
    /// Constraints are a hard gate: all must hold.
    Must,
}

/// `sharedKnowledge.intelligentExpectations`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntelligentExpectations {
    /// e.g. `"performance_ranking"`.
    pub expected_answer_type: Option<String>,
}

/// Record of the most recent agent the Orchestrator declined to (re)run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedAgent {
    /// Canonical name of the skipped agent.
    pub agent: String,
    /// Why it was skipped.
    pub reason: String,
    /// What the Orchestrator recommends calling instead.
    pub recommended_next: Option<String>,
    /// Execution-plan status at the time of skipping.
    pub plan_status: String,
    /// Iteration at which the skip occurred.
    pub timestamp: u64,
}

/// Per-agent quality verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    /// Output judged adequate.
    Ok,
    /// Output judged inadequate; retry was or will be attempted.
    Insufficient,
    /// Advisor explicitly recommended a retry.
    RetryRecommended,
}

/// Cross-agent free-form bag (`sharedKnowledge`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedKnowledge {
    /// DataInspector's categorization summary.
    pub document_insights: DocumentInsights,
    /// Strategy-id → extraction strategy.
    pub extraction_strategies: HashMap<String, ExtractionStrategy>,
    /// PlanningAgent's plan, once produced.
    pub execution_plan: Option<ExecutionPlan>,
    /// Per-agent human-readable summaries of what they found.
    pub agent_findings: HashMap<String, String>,
    /// Narrowing constraints for RxDB augmentation.
    pub query_constraints: Option<QueryConstraints>,
    /// What shape of answer the query seems to want.
    pub intelligent_expectations: IntelligentExpectations,
    /// The last agent the Orchestrator declined to run, if any.
    pub last_skipped_agent: Option<SkippedAgent>,
    /// Per-agent quality verdicts from the last assessment.
    pub quality_flags: HashMap<String, QualityFlag>,
    /// Per-agent improvement guidance from a failed quality assessment.
    pub agent_guidance: HashMap<String, String>,
}

/// What extraction recognized about an [`Item`]'s position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// The item reflects a "current" / most-recent record.
    CurrentRecord,
    /// The item came from a table row.
    TableRow,
    /// The item came from a numbered list entry.
    NumberedRow,
    /// Anything else; the original label is preserved.
    Other(String),
}

/// How an [`Item`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Matched by a `Pattern`'s regex.
    Regex,
    /// Read directly from a detected table structure.
    Table,
    /// Produced by an LLM fallback pass.
    Llm,
}

/// Free-form extras attached to an extracted [`Item`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemMetadata {
    /// Structural classification, if known.
    pub kind: Option<ItemKind>,
    /// Extraction technique, if known.
    pub method: Option<ExtractionMethod>,
    /// A table row number, when `kind == TableRow`.
    pub row_number: Option<u32>,
    /// Any other key-value annotations.
    #[serde(default)]
    pub extra: HashMap<String, String>,
}

/// One piece of extracted evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// The matched/extracted text.
    pub content: String,
    /// Parsed numeric value, if the content encodes one.
    pub value: Option<f64>,
    /// Unit string accompanying `value` (e.g. `"hours"`, `"tokens/s"`).
    pub unit: Option<String>,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    /// Surrounding text for citation.
    pub context: Option<String>,
    /// Originating chunk id, for source citation.
    pub source_chunk_id: Option<String>,
    /// Structural/provenance metadata.
    pub metadata: ItemMetadata,
}

impl Item {
    /// Builds an `Item`, clamping `confidence` into `[0, 1]`.
    #[must_use]
    pub fn new(content: impl Into<String>, confidence: f32) -> Self {
        Self {
            content: content.into(),
            value: None,
            unit: None,
            confidence: confidence.clamp(0.0, 1.0),
            context: None,
            source_chunk_id: None,
            metadata: ItemMetadata::default(),
        }
    }
}

/// A description/strategy pair, usually carrying an extraction regex.
/// Appended by PatternGenerator or PatternInducer; the `patterns`
/// vector only ever grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    /// Human-readable description of what this pattern targets.
    pub description: String,
    /// Example strings this pattern is expected to match.
    pub examples: Vec<String>,
    /// Free-form note on how this pattern should be applied.
    pub extraction_strategy: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    /// The regex body, when this pattern is regex-backed. Validated to
    /// compile before insertion.
    pub regex_pattern: Option<String>,
}

impl Pattern {
    /// Builds a pattern, clamping `confidence` into `[0, 1]`.
    #[must_use]
    pub fn new(description: impl Into<String>, confidence: f32) -> Self {
        Self {
            description: description.into(),
            examples: Vec::new(),
            extraction_strategy: String::new(),
            confidence: confidence.clamp(0.0, 1.0),
            regex_pattern: None,
        }
    }
}

/// A group of related items sharing a synthesis-assigned grouping key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemGroup {
    /// Grouping key.
    pub key: String,
    /// Members of the group.
    pub items: Vec<Item>,
}

/// Raw and grouped extraction output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedData {
    /// Every item Extractor produced, in extraction order.
    pub raw: Vec<Item>,
    /// Items grouped by `ItemGroup::key` (populated by Synthesizer).
    pub structured: Vec<ItemGroup>,
}

/// Reserved: the `DataAnalyzer` stage is disabled by design.
/// SynthesisCoordinator reads `ExtractedData::raw` directly; nothing
/// populates this type, but it is kept representable so a future,
/// explicitly-specified analyzer has somewhere to write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedData {
    /// Would hold analyzer-filtered items; always empty in this build.
    pub cleaned: Vec<Item>,
}

/// Final answer shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisStructure {
    /// Prose paragraph.
    Paragraph,
    /// Ranked/ordered list.
    List,
    /// Tabular comparison.
    Table,
    /// "How/why" explanation.
    Explanation,
}

/// The synthesized answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synthesis {
    /// Markdown answer text. Empty until a synthesis agent runs.
    pub answer: String,
    /// Why the answer takes this shape.
    pub reasoning: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    /// Chosen presentation.
    pub structure: SynthesisStructure,
}

impl Default for Synthesis {
    fn default() -> Self {
        Self {
            answer: String::new(),
            reasoning: String::new(),
            confidence: 0.0,
            structure: SynthesisStructure::Paragraph,
        }
    }
}

/// DataInspector's read on the query itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Understanding {
    /// What the user is trying to accomplish.
    pub intent: String,
    /// The subject-matter domain.
    pub domain: String,
    /// Constraints/requirements implied by the query.
    pub requirements: Vec<String>,
    /// Coarse query classification (e.g. "ranking", "factual", "how").
    pub query_type: String,
}

/// RAG retrieval results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RagResults {
    /// Retrieved chunks, retrieval-ranked (insertion order is meaningful).
    pub chunks: Vec<Chunk>,
    /// A short prose summary of the retrieval, if produced.
    pub summary: String,
}

/// The single shared, mutable record carried through the pipeline.
/// Created per query, owned exclusively by the Orchestrator for the
/// run's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchContext {
    /// The user's natural-language question.
    pub query: String,
    /// Retrieved chunks and retrieval summary.
    pub rag_results: RagResults,
    /// DataInspector's categorization, once produced.
    pub document_analysis: Option<DocumentAnalysis>,
    /// Patterns appended by PatternGenerator/PatternInducer. Append-only;
    /// duplicates are permitted.
    pub patterns: Vec<Pattern>,
    /// Extraction output.
    pub extracted_data: ExtractedData,
    /// Reserved; the DataAnalyzer stage is disabled.
    pub analyzed_data: Option<AnalyzedData>,
    /// The synthesized answer.
    pub synthesis: Synthesis,
    /// DataInspector's read on the query.
    pub understanding: Understanding,
    /// Cross-agent communication bag.
    pub shared_knowledge: SharedKnowledge,
}

impl ResearchContext {
    /// Starts a fresh context for `query` over `chunks`, all other fields
    /// at their defaults.
    #[must_use]
    pub fn new(query: impl Into<String>, chunks: Vec<Chunk>) -> Self {
        Self {
            query: query.into(),
            rag_results: RagResults {
                chunks,
                summary: String::new(),
            },
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_confidence_is_clamped() {
        assert_eq!(Item::new("x", 1.5).confidence, 1.0);
        assert_eq!(Item::new("x", -0.5).confidence, 0.0);
        assert!((Item::new("x", 0.42).confidence - 0.42).abs() < f32::EPSILON);
    }

    #[test]
    fn new_context_starts_with_empty_synthesis() {
        let ctx = ResearchContext::new("q", vec![Chunk::rag("1", "t", "s", 0.9)]);
        assert_eq!(ctx.rag_results.chunks.len(), 1);
        assert!(ctx.synthesis.answer.is_empty());
        assert!(ctx.patterns.is_empty());
        assert!(ctx.extracted_data.raw.is_empty());
    }

    #[test]
    fn strictness_defaults_to_should() {
        assert_eq!(Strictness::default(), Strictness::Should);
    }
}
