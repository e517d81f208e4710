//! `OpenAI`-compatible [`LlmAdvisor`] backend, feature-gated by `openai`.
//!
//! A single-turn advisor contract: one user message in, one text
//! response out. Compatible with any API following the `OpenAI` chat
//! completion format via the base URL override.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;

use crate::agent::provider::LlmAdvisor;
use crate::error::AgentError;

/// Calls an `OpenAI`-compatible chat completion endpoint for advisor
/// decisions. The model sees only a single user message per call; the
/// orchestrator's prompt builders embed everything the model needs
/// (system instructions, query, context) into that one string.
pub struct OpenAiAdvisor {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiAdvisor {
    /// Builds an advisor for `model`, authenticating with `api_key` and
    /// optionally targeting a non-default `base_url` (Azure, a local
    /// proxy, or any other `OpenAI`-compatible endpoint).
    #[must_use]
    pub fn new(api_key: &str, model: &str, base_url: Option<&str>) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base_url) = base_url {
            config = config.with_api_base(base_url);
        }
        Self {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }
}

impl std::fmt::Debug for OpenAiAdvisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiAdvisor")
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl LlmAdvisor for OpenAiAdvisor {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn llm(&self, prompt: &str) -> Result<String, AgentError> {
        let message = ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(prompt.to_string()),
            name: None,
        });

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![message])
            .build()
            .map_err(|e| AgentError::Advisor { message: e.to_string() })?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AgentError::Advisor { message: e.to_string() })?;

        Ok(response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .cloned()
            .unwrap_or_default())
    }
}
