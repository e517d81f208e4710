//! Concrete agent implementations: the stages the orchestrator dispatches to.

pub mod data_inspector;
pub mod extractor;
pub mod pattern_generator;
pub mod planning;
pub mod synthesizer;
pub mod web_search;

pub use data_inspector::DataInspector;
pub use extractor::Extractor;
pub use pattern_generator::PatternGenerator;
pub use planning::PlanningAgent;
pub use synthesizer::SynthesisCoordinator;
pub use web_search::{NullWebSearchClient, WebSearchAgent, WebSearchClient};
