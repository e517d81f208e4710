//! Lenient JSON extraction shared by every agent's response parser.
//!
//! Strips markdown code fences, then falls back to the outermost
//! `{...}` span if the advisor wrapped valid JSON in prose.

/// Strips a leading/trailing markdown code fence, if present.
#[must_use]
pub fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        rest.trim().trim_end_matches("```").trim()
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest.trim().trim_end_matches("```").trim()
    } else {
        trimmed
    }
}

/// Extracts the outermost `{...}` span from `content`, if any.
fn outer_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

/// Parses `content` as `T`, trying the fence-stripped text first and the
/// outermost `{...}` span second. Returns `T::default()` when both fail,
/// since an unparseable agent response must never stall the decision
/// loop.
#[must_use]
pub fn parse_lenient<T>(content: &str) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    let stripped = strip_fences(content);
    if let Ok(value) = serde_json::from_str::<T>(stripped) {
        return value;
    }
    outer_object(stripped)
        .and_then(|obj| serde_json::from_str::<T>(obj).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Sample {
        #[serde(default)]
        value: i32,
    }

    #[test]
    fn parses_clean_json() {
        let parsed: Sample = parse_lenient(r#"{"value": 7}"#);
        assert_eq!(parsed, Sample { value: 7 });
    }

    #[test]
    fn parses_fenced_json() {
        let parsed: Sample = parse_lenient("```json\n{\"value\": 3}\n```");
        assert_eq!(parsed, Sample { value: 3 });
    }

    #[test]
    fn parses_json_wrapped_in_prose() {
        let parsed: Sample = parse_lenient("Sure, here you go: {\"value\": 9} hope that helps");
        assert_eq!(parsed, Sample { value: 9 });
    }

    #[test]
    fn falls_back_to_default_on_garbage() {
        let parsed: Sample = parse_lenient("not json at all");
        assert_eq!(parsed, Sample::default());
    }
}
