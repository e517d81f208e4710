//! Orchestrator configuration with builder pattern and environment variable
//! support.
//!
//! Configuration is resolved in order: explicit values → environment
//! variables → defaults.

use std::time::Duration;

/// Iteration cap for the decision loop.
pub const DEFAULT_ITERATION_CAP: usize = 15;
/// Per-agent rerun cap.
pub const DEFAULT_RERUN_CAP: u32 = 2;
/// Per-agent quality-retry cap.
pub const DEFAULT_RETRY_CAP: u32 = 2;
/// Top-N induced pattern families kept by `PatternInducer`.
pub const DEFAULT_PATTERN_CAP: usize = 12;
/// Max new chunks added per retrieval-augmentation pass.
pub const DEFAULT_RXDB_CAP: usize = 10;
/// Chunks sampled by DataInspector before full-set expansion.
pub const DEFAULT_DATA_INSPECTOR_SAMPLE: usize = 8;
/// Timeout for context-search-scale calls.
pub const DEFAULT_CONTEXT_SEARCH_TIMEOUT_SECS: u64 = 15;
/// Timeout for document-search-scale calls.
pub const DEFAULT_DOCUMENT_SEARCH_TIMEOUT_SECS: u64 = 30;

/// Resource bounds and tuning knobs for the [`Orchestrator`](super::orchestrator::Orchestrator).
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Maximum decision-loop iterations before stopping.
    pub iteration_cap: usize,
    /// Maximum context-aware reruns per agent.
    pub rerun_cap: u32,
    /// Maximum quality-driven retries per agent.
    pub retry_cap: u32,
    /// Maximum induced pattern families kept after ranking.
    pub pattern_cap: usize,
    /// Maximum chunks added per retrieval-augmentation pass.
    pub rxdb_cap: usize,
    /// Chunks DataInspector samples before expansion.
    pub data_inspector_sample: usize,
    /// Timeout applied to context-scale advisor/vector-store calls.
    pub context_search_timeout: Duration,
    /// Timeout applied to document-scale advisor/vector-store calls.
    pub document_search_timeout: Duration,
    /// Whether `WebSearchAgent` may be invoked.
    pub enable_web_search: bool,
    /// Whether the primary RAG chunk set may be used.
    pub enable_rag_search: bool,
}

impl OrchestratorConfig {
    /// Creates a new builder for `OrchestratorConfig`.
    #[must_use]
    pub fn builder() -> OrchestratorConfigBuilder {
        OrchestratorConfigBuilder::default()
    }

    /// Builds configuration from environment variables with defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::builder().from_env().build()
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`OrchestratorConfig`].
#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfigBuilder {
    iteration_cap: Option<usize>,
    rerun_cap: Option<u32>,
    retry_cap: Option<u32>,
    pattern_cap: Option<usize>,
    rxdb_cap: Option<usize>,
    data_inspector_sample: Option<usize>,
    context_search_timeout: Option<Duration>,
    document_search_timeout: Option<Duration>,
    enable_web_search: Option<bool>,
    enable_rag_search: Option<bool>,
}

impl OrchestratorConfigBuilder {
    /// Populates unset fields from `RESEARCH_*` environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.iteration_cap.is_none() {
            self.iteration_cap = std::env::var("RESEARCH_ITERATION_CAP")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.rerun_cap.is_none() {
            self.rerun_cap = std::env::var("RESEARCH_RERUN_CAP")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.retry_cap.is_none() {
            self.retry_cap = std::env::var("RESEARCH_RETRY_CAP")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.pattern_cap.is_none() {
            self.pattern_cap = std::env::var("RESEARCH_PATTERN_CAP")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.rxdb_cap.is_none() {
            self.rxdb_cap = std::env::var("RESEARCH_RXDB_CAP")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.enable_web_search.is_none() {
            self.enable_web_search = std::env::var("RESEARCH_ENABLE_WEB_SEARCH")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        self
    }

    /// Sets the iteration cap.
    #[must_use]
    pub const fn iteration_cap(mut self, n: usize) -> Self {
        self.iteration_cap = Some(n);
        self
    }

    /// Sets the rerun cap.
    #[must_use]
    pub const fn rerun_cap(mut self, n: u32) -> Self {
        self.rerun_cap = Some(n);
        self
    }

    /// Sets the quality-retry cap.
    #[must_use]
    pub const fn retry_cap(mut self, n: u32) -> Self {
        self.retry_cap = Some(n);
        self
    }

    /// Sets the induced-pattern cap.
    #[must_use]
    pub const fn pattern_cap(mut self, n: usize) -> Self {
        self.pattern_cap = Some(n);
        self
    }

    /// Sets the RxDB augmentation cap.
    #[must_use]
    pub const fn rxdb_cap(mut self, n: usize) -> Self {
        self.rxdb_cap = Some(n);
        self
    }

    /// Sets the DataInspector sample size.
    #[must_use]
    pub const fn data_inspector_sample(mut self, n: usize) -> Self {
        self.data_inspector_sample = Some(n);
        self
    }

    /// Sets the context-search timeout.
    #[must_use]
    pub const fn context_search_timeout(mut self, duration: Duration) -> Self {
        self.context_search_timeout = Some(duration);
        self
    }

    /// Sets the document-search timeout.
    #[must_use]
    pub const fn document_search_timeout(mut self, duration: Duration) -> Self {
        self.document_search_timeout = Some(duration);
        self
    }

    /// Sets whether `WebSearchAgent` is enabled.
    #[must_use]
    pub const fn enable_web_search(mut self, enabled: bool) -> Self {
        self.enable_web_search = Some(enabled);
        self
    }

    /// Sets whether RAG search is enabled.
    #[must_use]
    pub const fn enable_rag_search(mut self, enabled: bool) -> Self {
        self.enable_rag_search = Some(enabled);
        self
    }

    /// Builds the [`OrchestratorConfig`], filling unset fields with
    /// defaults. Infallible: every field has a safe default.
    #[must_use]
    pub fn build(self) -> OrchestratorConfig {
        OrchestratorConfig {
            iteration_cap: self.iteration_cap.unwrap_or(DEFAULT_ITERATION_CAP),
            rerun_cap: self.rerun_cap.unwrap_or(DEFAULT_RERUN_CAP),
            retry_cap: self.retry_cap.unwrap_or(DEFAULT_RETRY_CAP),
            pattern_cap: self.pattern_cap.unwrap_or(DEFAULT_PATTERN_CAP),
            rxdb_cap: self.rxdb_cap.unwrap_or(DEFAULT_RXDB_CAP),
            data_inspector_sample: self
                .data_inspector_sample
                .unwrap_or(DEFAULT_DATA_INSPECTOR_SAMPLE),
            context_search_timeout: self
                .context_search_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_CONTEXT_SEARCH_TIMEOUT_SECS)),
            document_search_timeout: self
                .document_search_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_DOCUMENT_SEARCH_TIMEOUT_SECS)),
            enable_web_search: self.enable_web_search.unwrap_or(false),
            enable_rag_search: self.enable_rag_search.unwrap_or(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_bounds() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.iteration_cap, 15);
        assert_eq!(config.rerun_cap, 2);
        assert_eq!(config.retry_cap, 2);
        assert_eq!(config.pattern_cap, 12);
        assert_eq!(config.rxdb_cap, 10);
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = OrchestratorConfig::builder()
            .iteration_cap(5)
            .rerun_cap(1)
            .enable_web_search(true)
            .build();
        assert_eq!(config.iteration_cap, 5);
        assert_eq!(config.rerun_cap, 1);
        assert!(config.enable_web_search);
    }
}
