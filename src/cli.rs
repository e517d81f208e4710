//! Command-line argument parsing and dispatch for the demo binary.
//!
//! A thin driver over [`crate::agent::Orchestrator`]: load a JSON chunk
//! file, build an advisor, run the research loop, print the answer.
//! Two operations: `query` runs a fresh research loop, `rerun` replays a
//! single agent against a previously saved context.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::agent::{AgentRegistry, DataInspector, Extractor, NullWebSearchClient, Orchestrator, OrchestratorConfig, PatternGenerator, PlanningAgent, SynthesisCoordinator, WebSearchAgent};
use crate::core::{Chunk, ResearchContext};
use crate::error::AgentError;

/// Demo CLI for the research orchestration core.
#[derive(Parser, Debug)]
#[command(name = "research-core")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a fresh research query over a JSON file of retrieved chunks.
    #[command(after_help = r#"Examples:
  research-core query "what was the fastest benchmark result?" --chunks chunks.json
  research-core query "summarize the incident" --chunks chunks.json --model gpt-4o-mini
  research-core query "..." --chunks chunks.json --enable-web-search
"#)]
    Query {
        /// The natural-language question to research.
        query: String,

        /// Path to a JSON array of `Chunk` (see [`crate::core::Chunk`]).
        #[arg(long)]
        chunks: PathBuf,

        /// Advisor model name (requires the `openai` feature).
        #[arg(long, default_value = "gpt-4o-mini")]
        model: String,

        /// API key for the advisor backend.
        #[arg(long, env = "OPENAI_API_KEY")]
        api_key: Option<String>,

        /// Base URL override, for `OpenAI`-compatible proxies.
        #[arg(long)]
        base_url: Option<String>,

        /// Allow `WebSearchAgent` to run (still a no-op without a real
        /// search client wired in; see [`crate::agent::WebSearchClient`]).
        #[arg(long)]
        enable_web_search: bool,
    },

    /// Rerun a single named agent against a previously saved context.
    #[command(after_help = r#"Examples:
  research-core rerun --agent Extractor --context ctx.json --model gpt-4o-mini
"#)]
    Rerun {
        /// Agent name (advisor-emitted aliases are normalized).
        #[arg(long)]
        agent: String,

        /// Path to a previously serialized `ResearchContext` JSON file.
        #[arg(long)]
        context: PathBuf,

        /// Advisor model name (requires the `openai` feature).
        #[arg(long, default_value = "gpt-4o-mini")]
        model: String,

        /// API key for the advisor backend.
        #[arg(long, env = "OPENAI_API_KEY")]
        api_key: Option<String>,

        /// Base URL override, for `OpenAI`-compatible proxies.
        #[arg(long)]
        base_url: Option<String>,
    },
}

fn build_registry(config: &OrchestratorConfig) -> AgentRegistry {
    AgentRegistry::new(vec![
        Arc::new(DataInspector::new(config)),
        Arc::new(PlanningAgent),
        Arc::new(PatternGenerator::new(config.pattern_cap, config.rxdb_cap)),
        Arc::new(Extractor),
        Arc::new(SynthesisCoordinator),
        Arc::new(WebSearchAgent::with_enabled(
            Box::new(NullWebSearchClient),
            config.enable_web_search,
        )),
    ])
}

#[cfg(feature = "openai")]
fn build_advisor(model: &str, api_key: Option<&str>, base_url: Option<&str>) -> Result<Arc<dyn crate::agent::LlmAdvisor>, AgentError> {
    let api_key = api_key.ok_or(AgentError::ApiKeyMissing)?;
    Ok(Arc::new(crate::agent::OpenAiAdvisor::new(api_key, model, base_url)))
}

#[cfg(not(feature = "openai"))]
fn build_advisor(_model: &str, _api_key: Option<&str>, _base_url: Option<&str>) -> Result<Arc<dyn crate::agent::LlmAdvisor>, AgentError> {
    Err(AgentError::UnsupportedProvider {
        name: "no advisor backend compiled in (build with --features openai)".to_string(),
    })
}

fn load_chunks(path: &PathBuf) -> Result<Vec<Chunk>, AgentError> {
    let raw = std::fs::read_to_string(path).map_err(|e| AgentError::Orchestration {
        message: format!("failed to read {}: {e}", path.display()),
    })?;
    serde_json::from_str(&raw).map_err(|e| AgentError::ResponseParse {
        message: e.to_string(),
        content: raw,
    })
}

/// Executes the parsed CLI and returns the text to print on success.
///
/// # Errors
///
/// Returns an [`AgentError`] if input files can't be read, no advisor
/// backend is available, or (for `rerun`) the context file or agent
/// name don't resolve.
pub async fn execute(cli: &Cli) -> Result<String, AgentError> {
    match &cli.command {
        Commands::Query {
            query,
            chunks,
            model,
            api_key,
            base_url,
            enable_web_search,
        } => {
            let chunks = load_chunks(chunks)?;
            let config = OrchestratorConfig::builder()
                .enable_web_search(*enable_web_search)
                .build();
            let advisor = build_advisor(model, api_key.as_deref(), base_url.as_deref())?;
            let store = Arc::new(crate::agent::InMemoryVectorStore::new(chunks.clone()));
            let orchestrator = Orchestrator::new(advisor, build_registry(&config), store, config);

            Ok(orchestrator.research(query, chunks).await)
        }
        Commands::Rerun {
            agent,
            context,
            model,
            api_key,
            base_url,
        } => {
            let raw = std::fs::read_to_string(context).map_err(|e| AgentError::Orchestration {
                message: format!("failed to read {}: {e}", context.display()),
            })?;
            let context: ResearchContext = serde_json::from_str(&raw).map_err(|e| AgentError::ResponseParse {
                message: e.to_string(),
                content: raw,
            })?;

            let config = OrchestratorConfig::default();
            let advisor = build_advisor(model, api_key.as_deref(), base_url.as_deref())?;
            let store = Arc::new(crate::agent::InMemoryVectorStore::new(context.rag_results.chunks.clone()));
            let orchestrator = Orchestrator::new(advisor, build_registry(&config), store, config);

            let context = orchestrator.rerun_agent(agent, context, false).await?;
            serde_json::to_string_pretty(&context).map_err(|e| AgentError::Orchestration {
                message: format!("failed to serialize rerun result: {e}"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_well_formed() {
        Cli::command().debug_assert();
    }
}
