//! Pluggable LLM advisor trait.
//!
//! The core requires only an injected `llm(prompt) -> string` function; it
//! does not depend on any specific model or vendor.

use async_trait::async_trait;

use crate::error::AgentError;

/// A language-model advisor the Orchestrator consults for decisions,
/// plans, and quality assessments.
///
/// Implementations handle the transport layer (HTTP, SDK calls, retries)
/// for a specific backend while presenting a single uniform call to the
/// orchestrator.
#[async_trait]
pub trait LlmAdvisor: Send + Sync {
    /// Advisor name, for logging.
    fn name(&self) -> &'static str;

    /// Sends `prompt` to the model and returns its raw text response.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Advisor`] on transport failures.
    async fn llm(&self, prompt: &str) -> Result<String, AgentError>;
}

/// A canned advisor for tests: returns queued responses in order, looping
/// the last one once exhausted.
#[derive(Debug, Default)]
pub struct ScriptedAdvisor {
    responses: std::sync::Mutex<Vec<String>>,
    calls: std::sync::atomic::AtomicUsize,
}

impl ScriptedAdvisor {
    /// Builds an advisor that returns each of `responses` in order.
    #[must_use]
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Number of times [`LlmAdvisor::llm`] has been called.
    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmAdvisor for ScriptedAdvisor {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn llm(&self, _prompt: &str) -> Result<String, AgentError> {
        let idx = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let responses = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        Ok(responses
            .get(idx)
            .or_else(|| responses.last())
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_advisor_returns_in_order_then_repeats_last() {
        let advisor = ScriptedAdvisor::new(vec!["one".to_string(), "two".to_string()]);
        assert_eq!(advisor.llm("p").await.unwrap_or_default(), "one");
        assert_eq!(advisor.llm("p").await.unwrap_or_default(), "two");
        assert_eq!(advisor.llm("p").await.unwrap_or_default(), "two");
        assert_eq!(advisor.call_count(), 3);
    }
}
