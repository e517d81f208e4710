//! # research-core
//!
//! A retrieval-augmented research orchestration core: a bounded,
//! advisor-driven decision loop that coordinates a small pipeline of
//! agents (document inspection, planning, pattern generation,
//! extraction, synthesis, and optional web search) over a single shared
//! research context.
//!
//! ## Architecture
//!
//! - **Core** ([`core`]): the shared [`core::ResearchContext`] data
//!   model every agent reads and appends to.
//! - **Agent** ([`agent`]): the [`agent::Orchestrator`], the
//!   [`agent::AgentRegistry`] of concrete agents, name normalization,
//!   pattern induction, and the pluggable [`agent::LlmAdvisor`] seam.
//!
//! The orchestration contract is total: [`agent::Orchestrator::research`]
//! always returns a `String`, never an `Err`. Agent failures are
//! recorded into the context's shared knowledge rather than propagated.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod agent;
pub mod cli;
pub mod core;
pub mod error;

// Re-export commonly used types at crate root.
pub use error::AgentError;

pub use core::{Chunk, ResearchContext, SourceType};

pub use agent::{AgentRegistry, LlmAdvisor, Orchestrator, OrchestratorConfig};
