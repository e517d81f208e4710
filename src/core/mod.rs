//! Core data types: the shared research context and its building blocks.

pub mod chunk;
pub mod research_context;

pub use chunk::{Chunk, SourceType};
pub use research_context::{
    AnalyzedData, DocumentAnalysis, DocumentInsights, DocumentSummary, ExecutionPlan,
    ExtractedData, ExtractionMethod, ExtractionStrategy, IntelligentExpectations, Item, ItemGroup,
    ItemKind, ItemMetadata, Measurement, Pattern, PatternCategories, PlanStep, QualityFlag,
    QueryConstraints, RagResults, ResearchContext, SharedKnowledge, SkippedAgent, Strictness,
    Synthesis, SynthesisStructure, Understanding,
};
