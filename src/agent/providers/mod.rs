//! Concrete [`super::provider::LlmAdvisor`] backends.

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "openai")]
pub use openai::OpenAiAdvisor;
