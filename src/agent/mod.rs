//! Agentic research orchestration.
//!
//! Drives an iterative, advisor-guided pipeline over a single shared
//! [`crate::core::ResearchContext`]: at each step the orchestrator asks
//! an injected [`provider::LlmAdvisor`] what to do next, runs the named
//! agent from a fixed [`registry::AgentRegistry`], assesses the result,
//! and repeats until the advisor declares the research complete or the
//! iteration cap is hit.
//!
//! # Architecture
//!
//! ```text
//! User query → Orchestrator::research
//!   loop (bounded by OrchestratorConfig::iteration_cap):
//!     advisor.llm(decision prompt) → Decision
//!     name normalization → registry lookup → agent.process(&mut context, ...)
//!     quality assessment → maybe retry (bounded by retry_cap)
//!   → context.synthesis.answer
//! ```
//!
//! A concrete [`LlmAdvisor`] backend ships under [`providers`], gated
//! behind the `openai` feature; the orchestrator itself depends only on
//! the trait.

pub mod agents;
pub mod config;
pub mod decision;
pub mod json_util;
pub mod names;
pub mod orchestrator;
pub mod pattern_inducer;
pub mod progress;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod quality;
pub mod registry;
pub mod traits;
pub mod vector_store;

pub use agents::{DataInspector, Extractor, NullWebSearchClient, PatternGenerator, PlanningAgent, SynthesisCoordinator, WebSearchAgent, WebSearchClient};
pub use config::OrchestratorConfig;
pub use names::NameNormalizer;
pub use orchestrator::Orchestrator;
pub use progress::{ProgressObserver, ProgressTracker};
pub use provider::{LlmAdvisor, ScriptedAdvisor};
#[cfg(feature = "openai")]
pub use providers::OpenAiAdvisor;
pub use registry::AgentRegistry;
pub use traits::Agent;
pub use vector_store::{InMemoryVectorStore, VectorStore};
