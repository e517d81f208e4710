//! Error types for the orchestration core.
//!
//! Per the `research`/`rerun_agent` contract, the core is total:
//! `research()` always returns a `String`, never an `Err`. Agent
//! failures are captured into `ResearchContext::shared_knowledge` rather
//! than propagated. `AgentError` exists for the layers beneath that
//! contract — name resolution, advisor transport, and `rerun_agent`,
//! whose registry-missing case is the one place an error legitimately
//! surfaces to the caller.

use thiserror::Error;

/// Errors surfaced by the orchestration core.
#[derive(Debug, Error)]
pub enum AgentError {
    /// No API key was configured for the default advisor backend.
    #[error("no API key configured for the LLM advisor")]
    ApiKeyMissing,

    /// An unsupported provider name was requested.
    #[error("unsupported LLM provider: {name}")]
    UnsupportedProvider {
        /// The requested provider name.
        name: String,
    },

    /// A general orchestration failure (malformed config, invalid query).
    #[error("orchestration error: {message}")]
    Orchestration {
        /// Description of the failure.
        message: String,
    },

    /// The decision loop reran or retried past its own tracking limits.
    #[error("tool loop exceeded {max_iterations} iterations")]
    ToolLoopExceeded {
        /// The configured iteration cap.
        max_iterations: usize,
    },

    /// An advisor response could not be parsed by any parser tier.
    #[error("failed to parse advisor response: {message}")]
    ResponseParse {
        /// Description of the parse failure.
        message: String,
        /// The raw content that failed to parse, for diagnostics.
        content: String,
    },

    /// A named agent is not present in the registry.
    #[error("unknown agent: {name}")]
    UnknownAgent {
        /// The (post-normalization) name that was not found.
        name: String,
    },

    /// `rerun_agent` was asked to target a name the registry has never
    /// heard of, even after normalization. This is the one case the
    /// orchestration contract allows to surface as an `Err`.
    #[error("cannot rerun unregistered agent: {name}")]
    RegistryMissing {
        /// The requested agent name.
        name: String,
    },

    /// A vector-store or advisor call did not complete within its
    /// configured timeout.
    #[error("{operation} timed out after {elapsed_ms}ms")]
    Timeout {
        /// What was being awaited.
        operation: String,
        /// How long the caller waited before giving up.
        elapsed_ms: u64,
    },

    /// An advisor transport error (HTTP failure, malformed SDK response).
    #[error("LLM advisor error: {message}")]
    Advisor {
        /// Description of the transport failure.
        message: String,
    },
}
