//! Progress observation for the research loop.
//!
//! A small observer trait so a UI or test harness can subscribe to
//! per-agent lifecycle events without parsing log lines.

use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Per-agent-call metrics accumulated while it runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentMetrics {
    /// Number of advisor calls this agent made.
    pub llm_calls: u32,
    /// Approximate tokens used across those calls, if known.
    pub tokens_used: u64,
    /// Wall-clock time the agent took.
    pub response_time: Duration,
    /// Self-reported or inferred confidence in `[0, 1]`.
    pub confidence: f32,
}

/// Lifecycle events an [`Agent`](super::traits::Agent) run can emit.
pub trait ProgressObserver: Send + Sync {
    /// Called just before an agent starts processing.
    fn on_agent_start(&self, agent: &str) {
        let _ = agent;
    }

    /// Called with a human-readable progress update mid-run.
    fn on_agent_progress(&self, agent: &str, message: &str) {
        let _ = (agent, message);
    }

    /// Called with the advisor's raw "thinking" text, when available.
    fn on_agent_thinking(&self, agent: &str, thought: &str) {
        let _ = (agent, thought);
    }

    /// Called when an agent finishes successfully.
    fn on_agent_complete(&self, agent: &str, metrics: &AgentMetrics) {
        let _ = (agent, metrics);
    }

    /// Called when an agent fails.
    fn on_agent_error(&self, agent: &str, error: &str) {
        let _ = (agent, error);
    }
}

/// A [`ProgressObserver`] that logs every event via `tracing`.
#[derive(Debug, Default)]
pub struct TracingProgressObserver;

impl ProgressObserver for TracingProgressObserver {
    fn on_agent_start(&self, agent: &str) {
        tracing::debug!(agent, "agent starting");
    }

    fn on_agent_progress(&self, agent: &str, message: &str) {
        tracing::debug!(agent, message, "agent progress");
    }

    fn on_agent_thinking(&self, agent: &str, thought: &str) {
        tracing::trace!(agent, thought, "agent thinking");
    }

    fn on_agent_complete(&self, agent: &str, metrics: &AgentMetrics) {
        tracing::debug!(
            agent,
            llm_calls = metrics.llm_calls,
            tokens_used = metrics.tokens_used,
            response_time_ms = metrics.response_time.as_millis() as u64,
            confidence = metrics.confidence,
            "agent complete"
        );
    }

    fn on_agent_error(&self, agent: &str, error: &str) {
        tracing::warn!(agent, error, "agent failed");
    }
}

/// A [`ProgressObserver`] that records every event in order, for tests
/// that assert on orchestrator-driven lifecycle sequencing.
#[derive(Debug, Default)]
pub struct RecordingProgressObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingProgressObserver {
    /// Returns a snapshot of recorded event labels, in emission order.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn push(&self, label: String) {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).push(label);
    }
}

impl ProgressObserver for RecordingProgressObserver {
    fn on_agent_start(&self, agent: &str) {
        self.push(format!("start:{agent}"));
    }

    fn on_agent_progress(&self, agent: &str, message: &str) {
        self.push(format!("progress:{agent}:{message}"));
    }

    fn on_agent_thinking(&self, agent: &str, _thought: &str) {
        self.push(format!("thinking:{agent}"));
    }

    fn on_agent_complete(&self, agent: &str, _metrics: &AgentMetrics) {
        self.push(format!("complete:{agent}"));
    }

    fn on_agent_error(&self, agent: &str, error: &str) {
        self.push(format!("error:{agent}:{error}"));
    }
}

/// Fans events out to a fixed set of observers, so the orchestrator can
/// hold one tracker regardless of how many observers are attached.
#[derive(Clone)]
pub struct ProgressTracker {
    observers: Arc<Vec<Arc<dyn ProgressObserver>>>,
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("observer_count", &self.observers.len())
            .finish()
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(vec![Arc::new(TracingProgressObserver)])
    }
}

impl ProgressTracker {
    /// Builds a tracker fanning out to `observers`.
    #[must_use]
    pub fn new(observers: Vec<Arc<dyn ProgressObserver>>) -> Self {
        Self {
            observers: Arc::new(observers),
        }
    }

    /// A tracker with no observers attached, for tests that don't care
    /// about progress events.
    #[must_use]
    pub fn silent() -> Self {
        Self::new(Vec::new())
    }

    /// Notifies observers that `agent` is starting.
    pub fn start(&self, agent: &str) {
        for o in self.observers.iter() {
            o.on_agent_start(agent);
        }
    }

    /// Notifies observers of a progress message from `agent`.
    pub fn progress(&self, agent: &str, message: &str) {
        for o in self.observers.iter() {
            o.on_agent_progress(agent, message);
        }
    }

    /// Notifies observers of `agent`'s raw thinking text.
    pub fn thinking(&self, agent: &str, thought: &str) {
        for o in self.observers.iter() {
            o.on_agent_thinking(agent, thought);
        }
    }

    /// Notifies observers that `agent` completed, with final metrics.
    pub fn complete(&self, agent: &str, metrics: &AgentMetrics) {
        for o in self.observers.iter() {
            o.on_agent_complete(agent, metrics);
        }
    }

    /// Notifies observers that `agent` failed.
    pub fn error(&self, agent: &str, error: &str) {
        for o in self.observers.iter() {
            o.on_agent_error(agent, error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_observer_captures_sequence_in_order() {
        let recorder = Arc::new(RecordingProgressObserver::default());
        let tracker = ProgressTracker::new(vec![recorder.clone()]);

        tracker.start("Extractor");
        tracker.progress("Extractor", "scanning chunks");
        tracker.complete("Extractor", &AgentMetrics::default());

        assert_eq!(
            recorder.events(),
            vec![
                "start:Extractor".to_string(),
                "progress:Extractor:scanning chunks".to_string(),
                "complete:Extractor".to_string(),
            ]
        );
    }

    #[test]
    fn silent_tracker_has_no_observers() {
        let tracker = ProgressTracker::silent();
        tracker.start("DataInspector");
    }
}
