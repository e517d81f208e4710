//! Decision parsing.
//!
//! The advisor's free-text response is parsed into a [`Decision`] via a
//! three-tier parser: structured field lines, then a fallback
//! "decision section" scan, then a last-resort keyword scan.

use regex::Regex;

/// What the advisor decided to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Invoke the named tool/agent.
    CallTool,
    /// The advisor believes the research is done.
    Complete,
    /// Neither of the above could be determined.
    Other,
}

/// A parsed advisor decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// What to do.
    pub action: Action,
    /// The requested tool/agent name, when `action == CallTool`.
    pub tool_name: Option<String>,
    /// The advisor's stated reasoning, if present.
    pub reasoning: String,
    /// The advisor's stated next goal, if present.
    pub next_goal: String,
}

/// Completion synonyms the advisor has been observed to emit instead of
/// a bare `COMPLETE`.
const COMPLETION_SYNONYMS: &[&str] = &["complete", "comp lete", "done", "finish", "end"];

fn field(re_body: &str, content: &str) -> Option<String> {
    Regex::new(re_body)
        .ok()
        .and_then(|re| re.captures(content))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Tier 1: structured `FIELD: value` lines anywhere in the content.
fn parse_structured(content: &str) -> Option<Decision> {
    let action_raw = field(r"(?im)^\s*ACTION:\s*(.+)$", content)?;
    let tool_name = field(r"(?im)^\s*TOOL_NAME:\s*(.+)$", content);
    let reasoning = field(r"(?im)^\s*REASONING:\s*(.+)$", content).unwrap_or_default();
    let next_goal = field(r"(?im)^\s*NEXT_GOAL:\s*(.+)$", content).unwrap_or_default();

    Some(Decision {
        action: classify_action(&action_raw, tool_name.is_some()),
        tool_name,
        reasoning,
        next_goal,
    })
}

/// Tier 2: text after a trailing `</think>` block or a `DECISION:`
/// marker, re-scanned for the same structured fields.
fn parse_section(content: &str) -> Option<Decision> {
    let section = content
        .rsplit_once("</think>")
        .map(|(_, rest)| rest)
        .or_else(|| content.split_once("DECISION:").map(|(_, rest)| rest))
        .or_else(|| content.split_once("Decision:").map(|(_, rest)| rest))?;
    parse_structured(section).or_else(|| parse_keyword_scan(section))
}

/// Tier 3: last-resort keyword scan. No structured fields required;
/// just looks for a completion synonym or a known agent-like token.
fn parse_keyword_scan(content: &str) -> Option<Decision> {
    let lower = content.to_lowercase();
    if COMPLETION_SYNONYMS.iter().any(|s| lower.contains(s)) {
        return Some(Decision {
            action: Action::Complete,
            tool_name: None,
            reasoning: String::new(),
            next_goal: String::new(),
        });
    }

    // Look for anything shaped like an agent name token.
    let token_re = Regex::new(r"[A-Za-z][A-Za-z_]{3,}").ok()?;
    let candidate = token_re
        .find_iter(&lower)
        .map(|m| m.as_str())
        .find(|t| {
            ["extractor", "inspector", "generator", "synthes", "planner", "planning", "search"]
                .iter()
                .any(|marker| t.contains(marker))
        })?;

    Some(Decision {
        action: Action::CallTool,
        tool_name: Some(candidate.to_string()),
        reasoning: String::new(),
        next_goal: String::new(),
    })
}

fn classify_action(action_raw: &str, has_tool_name: bool) -> Action {
    let normalized = action_raw.trim().to_lowercase();
    if COMPLETION_SYNONYMS.iter().any(|s| normalized.contains(s)) {
        Action::Complete
    } else if normalized.contains("call_tool") || normalized.contains("call tool") || has_tool_name {
        Action::CallTool
    } else {
        Action::Other
    }
}

/// Strips markdown code fences.
fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    if trimmed.starts_with("```") {
        trimmed
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
    } else {
        trimmed
    }
}

/// Parses an advisor response into a [`Decision`] using the three-tier
/// strategy above. Never fails: the last tier always returns
/// `Action::Other` with empty fields rather than propagating an error,
/// matching the orchestrator's "never throw on advisor drift" posture.
#[must_use]
pub fn parse_decision(content: &str) -> Decision {
    let content = strip_fences(content);
    parse_structured(content)
        .or_else(|| parse_section(content))
        .or_else(|| parse_keyword_scan(content))
        .unwrap_or(Decision {
            action: Action::Other,
            tool_name: None,
            reasoning: String::new(),
            next_goal: String::new(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_structured_fields() {
        let content = "ACTION: CALL_TOOL\nTOOL_NAME: DataInspector\nREASONING: need to inspect first\nNEXT_GOAL: categorize documents";
        let decision = parse_decision(content);
        assert_eq!(decision.action, Action::CallTool);
        assert_eq!(decision.tool_name.as_deref(), Some("DataInspector"));
        assert_eq!(decision.reasoning, "need to inspect first");
    }

    #[test]
    fn recognizes_completion_synonyms() {
        for synonym in ["COMPLETE", "DONE", "FINISH", "COMP LETE"] {
            let content = format!("ACTION: {synonym}");
            assert_eq!(parse_decision(&content).action, Action::Complete, "{synonym}");
        }
    }

    #[test]
    fn falls_back_to_decision_section() {
        let content = "<think>reasoning here</think>\nDECISION:\nACTION: COMPLETE";
        assert_eq!(parse_decision(content).action, Action::Complete);
    }

    #[test]
    fn falls_back_to_keyword_scan() {
        let content = "I think we should call the extractor next since patterns exist.";
        let decision = parse_decision(content);
        assert_eq!(decision.action, Action::CallTool);
        assert!(decision.tool_name.unwrap_or_default().contains("extractor"));
    }

    #[test]
    fn handles_markdown_fences() {
        let content = "```\nACTION: COMPLETE\n```";
        assert_eq!(parse_decision(content).action, Action::Complete);
    }

    #[test]
    fn total_on_garbage_input() {
        let decision = parse_decision("the weather is nice today");
        assert_eq!(decision.action, Action::Other);
    }
}
