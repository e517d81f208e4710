//! `PlanningAgent`: builds the step-by-step execution plan.

use async_trait::async_trait;
use serde::Deserialize;

use crate::agent::json_util::parse_lenient;
use crate::agent::prompt::{build_planning_prompt, PLANNING_AGENT_SYSTEM_PROMPT};
use crate::agent::provider::LlmAdvisor;
use crate::agent::traits::Agent;
use crate::agent::vector_store::VectorStore;
use crate::core::{ExecutionPlan, QueryConstraints, ResearchContext};
use crate::error::AgentError;

#[derive(Debug, Default, Deserialize)]
struct PlanningResponse {
    #[serde(default)]
    steps: Vec<crate::core::PlanStep>,
    #[serde(default)]
    fallback_options: Vec<String>,
    #[serde(default)]
    query_constraints: Option<QueryConstraints>,
}

fn summarize_understanding(ctx: &ResearchContext) -> String {
    format!(
        "intent={}; domain={}; query_type={}; requirements={:?}",
        ctx.understanding.intent,
        ctx.understanding.domain,
        ctx.understanding.query_type,
        ctx.understanding.requirements
    )
}

/// Produces the ordered execution plan the Orchestrator's plan-aware
/// validation checks steps against.
pub struct PlanningAgent;

#[async_trait]
impl Agent for PlanningAgent {
    fn name(&self) -> &'static str {
        "PlanningAgent"
    }

    fn description(&self) -> &str {
        "Produces an ordered execution plan naming which agents to call and why."
    }

    async fn process(
        &self,
        context: &mut ResearchContext,
        advisor: &dyn LlmAdvisor,
        _vector_store: &dyn VectorStore,
    ) -> Result<(), AgentError> {
        let prompt = build_planning_prompt(&context.query, &summarize_understanding(context));
        let raw = advisor.llm(&format!("{PLANNING_AGENT_SYSTEM_PROMPT}\n\n{prompt}")).await?;
        let parsed: PlanningResponse = parse_lenient(&raw);

        context.shared_knowledge.execution_plan = Some(ExecutionPlan {
            steps: parsed.steps,
            fallback_options: parsed.fallback_options,
        });
        context.shared_knowledge.query_constraints = parsed.query_constraints;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::provider::ScriptedAdvisor;
    use crate::agent::vector_store::InMemoryVectorStore;

    #[tokio::test]
    async fn populates_execution_plan() {
        let response = r#"{
            "steps": [{"agent": "Extractor", "action": "pull items", "reasoning": "need data", "dependencies": []}],
            "fallback_options": ["skip to SynthesisCoordinator"],
            "query_constraints": {"expected_domain_candidates": ["ml"], "expected_title_hints": [], "expected_owner": null, "strictness": "should"}
        }"#;
        let advisor = ScriptedAdvisor::new(vec![response.to_string()]);
        let store = InMemoryVectorStore::default();
        let mut ctx = ResearchContext::new("q", vec![]);

        PlanningAgent.process(&mut ctx, &advisor, &store).await.unwrap_or_else(|e| panic!("{e}"));

        let plan = ctx.shared_knowledge.execution_plan.unwrap_or_default();
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].agent, "Extractor");
        assert!(ctx.shared_knowledge.query_constraints.is_some());
    }
}
