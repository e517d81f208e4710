//! Quality assessment and retry decision.

use regex::Regex;

/// The advisor's structured verdict on an agent's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityStatus {
    /// Output is good enough to proceed.
    Acceptable,
    /// Output is inadequate but no retry was explicitly recommended.
    Insufficient,
    /// Output is inadequate and a retry is recommended.
    RetryRecommended,
}

/// A parsed quality assessment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityAssessment {
    /// The verdict.
    pub status: QualityStatus,
    /// Why the advisor reached this verdict.
    pub reason: String,
    /// Concrete improvement suggestion, to steer a retry.
    pub improvement: String,
}

fn field(re_body: &str, content: &str) -> Option<String> {
    Regex::new(re_body)
        .ok()
        .and_then(|re| re.captures(content))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Parses an advisor's `STATUS/REASON/IMPROVEMENT` response. Falls back
/// to `Acceptable` with an empty reason when the fields can't be found,
/// since an unparseable assessment must never stall the loop.
#[must_use]
pub fn parse_quality_assessment(content: &str) -> QualityAssessment {
    let status_raw = field(r"(?im)^\s*STATUS:\s*(.+)$", content).unwrap_or_default();
    let reason = field(r"(?im)^\s*REASON:\s*(.+)$", content).unwrap_or_default();
    let improvement = field(r"(?im)^\s*IMPROVEMENT:\s*(.+)$", content).unwrap_or_default();

    let status = match status_raw.to_lowercase().as_str() {
        s if s.contains("retry") => QualityStatus::RetryRecommended,
        s if s.contains("insufficient") => QualityStatus::Insufficient,
        s if s.contains("acceptable") => QualityStatus::Acceptable,
        _ => QualityStatus::Acceptable,
    };

    QualityAssessment {
        status,
        reason,
        improvement,
    }
}

/// Builds the quality-assessment prompt for `agent`'s most recent
/// output, summarized via `context_summary`.
#[must_use]
pub fn build_quality_prompt(query: &str, agent: &str, context_summary: &str) -> String {
    format!(
        "/no_think\n\
         <query>{query}</query>\n\
         <agent>{agent}</agent>\n\
         <result_summary>\n{context_summary}\n</result_summary>\n\n\
         Assess whether this agent's output is sufficient to continue the research.\n\
         Respond with exactly these fields:\n\
         STATUS: acceptable | insufficient | retry_recommended\n\
         REASON: <one sentence>\n\
         IMPROVEMENT: <what the agent should do differently, if retrying>"
    )
}

/// Deterministic structural floors corroborating the advisor's verdict
/// (Open Question decision #2 in DESIGN.md): a retry is only honored
/// when a cheap structural signal agrees there is room to improve.
#[must_use]
pub const fn structural_floor_met(agent: &str, item_count: usize, confidence: f32) -> bool {
    match agent.as_bytes() {
        b"Extractor" => item_count < 1,
        b"PatternGenerator" => item_count < 1,
        b"SynthesisCoordinator" => confidence < 0.4,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_three_statuses() {
        assert_eq!(
            parse_quality_assessment("STATUS: acceptable\nREASON: fine\nIMPROVEMENT: none").status,
            QualityStatus::Acceptable
        );
        assert_eq!(
            parse_quality_assessment("STATUS: insufficient\nREASON: too few items").status,
            QualityStatus::Insufficient
        );
        assert_eq!(
            parse_quality_assessment("STATUS: retry_recommended\nREASON: missing data").status,
            QualityStatus::RetryRecommended
        );
    }

    #[test]
    fn unparseable_defaults_to_acceptable() {
        assert_eq!(parse_quality_assessment("garbage").status, QualityStatus::Acceptable);
    }

    #[test]
    fn structural_floor_flags_empty_extraction() {
        assert!(structural_floor_met("Extractor", 0, 0.0));
        assert!(!structural_floor_met("Extractor", 3, 0.0));
        assert!(structural_floor_met("SynthesisCoordinator", 5, 0.1));
        assert!(!structural_floor_met("SynthesisCoordinator", 5, 0.9));
    }
}
