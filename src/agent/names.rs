//! Name normalization.
//!
//! Maps an arbitrary advisor-emitted string to a canonical agent name.
//! This is the load-bearing defense against advisor drift: the same
//! "try progressively looser matches, never hard-fail" posture the
//! lenient JSON parsers elsewhere in this crate apply to malformed
//! *structure* is applied here to *names*.

use std::collections::HashMap;

/// The fixed set of canonical agent names this crate registers.
pub const CANONICAL_NAMES: &[&str] = &[
    "DataInspector",
    "PlanningAgent",
    "PatternGenerator",
    "Extractor",
    "SynthesisCoordinator",
    "WebSearchAgent",
];

/// Case-/punctuation-insensitive alias table, including common advisor
/// hallucinations seen in practice.
fn alias_table() -> HashMap<&'static str, &'static str> {
    let pairs: &[(&str, &str)] = &[
        ("datainspector", "DataInspector"),
        ("data_inspector", "DataInspector"),
        ("data-inspector", "DataInspector"),
        ("datainspirater", "DataInspector"),
        ("data_inspirater", "DataInspector"),
        ("dataanalyzer", "DataInspector"),
        ("analyzer", "DataInspector"),
        ("planningagent", "PlanningAgent"),
        ("planning_agent", "PlanningAgent"),
        ("planner", "PlanningAgent"),
        ("patterngenerator", "PatternGenerator"),
        ("pattern_generator", "PatternGenerator"),
        ("patterngen", "PatternGenerator"),
        ("regexgenerator", "PatternGenerator"),
        ("extractor", "Extractor"),
        ("dataextractor", "Extractor"),
        ("regexextractor", "Extractor"),
        ("patternextractor", "Extractor"),
        ("synthesiscoordinator", "SynthesisCoordinator"),
        ("synthesis_coordinator", "SynthesisCoordinator"),
        ("synthesizer", "SynthesisCoordinator"),
        ("synesthesizer", "SynthesisCoordinator"),
        ("responseformatter", "SynthesisCoordinator"),
        ("websearchagent", "WebSearchAgent"),
        ("web_search_agent", "WebSearchAgent"),
        ("websearch", "WebSearchAgent"),
    ];
    pairs.iter().copied().collect()
}

/// Strips punctuation and whitespace, lowercases, and removes leading
/// `CALL_`/`CALL ` prefixes (step 1 normalization key).
fn lookup_key(raw: &str) -> String {
    let trimmed = raw.trim();
    let no_call_prefix = trimmed
        .strip_prefix("CALL_")
        .or_else(|| trimmed.strip_prefix("CALL "))
        .or_else(|| trimmed.strip_prefix("call_"))
        .or_else(|| trimmed.strip_prefix("call "))
        .unwrap_or(trimmed);
    no_call_prefix
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

/// Substring pattern fallback (step 2).
fn pattern_fallback(key: &str) -> Option<&'static str> {
    if key.contains("extractor") {
        Some("Extractor")
    } else if key.contains("pattern") && key.contains("generator") {
        Some("PatternGenerator")
    } else if key.contains("generator") {
        Some("PatternGenerator")
    } else if key.contains("inspector") || key.contains("analyzer") {
        Some("DataInspector")
    } else if key.contains("synthesis") || key.contains("coordinator") {
        Some("SynthesisCoordinator")
    } else if key.contains("planner") || key.contains("planning") {
        Some("PlanningAgent")
    } else if key.contains("websearch") || key.contains("search") {
        Some("WebSearchAgent")
    } else {
        None
    }
}

/// Strips known prefixes/suffixes for the semantic-equivalence fallback
/// (step 4).
fn strip_affixes(key: &str) -> String {
    let prefixes = ["data", "pattern", "synthesis", "web"];
    let suffixes = ["agent", "tool", "coordinator"];

    let mut s = key.to_string();
    for p in prefixes {
        if let Some(rest) = s.strip_prefix(p) {
            s = rest.to_string();
            break;
        }
    }
    for suf in suffixes {
        if let Some(rest) = s.strip_suffix(suf) {
            s = rest.to_string();
            break;
        }
    }
    s
}

/// Declares `a` and `b` semantically equivalent when equal, or when one
/// contains the other and they differ in length by at most 2 characters.
fn semantically_equivalent(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    !shorter.is_empty() && longer.contains(shorter) && longer.len() - shorter.len() <= 2
}

/// Maps arbitrary advisor-emitted tool names to canonical agent names.
///
/// Idempotent: `normalize(normalize(x)) == normalize(x)` for all `x`,
/// because every canonical name round-trips through every tier (the
/// alias table contains each canonical name's own lowercase form, and
/// the pattern/suffix/semantic tiers all degrade to identity on an
/// already-canonical input).
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    registered: Vec<String>,
}

impl NameNormalizer {
    /// Builds a normalizer aware of exactly the given registered
    /// canonical names (used by tier 3's fuzzy retry and tier 4's
    /// semantic-equivalence scan, both of which only consider names the
    /// registry actually has).
    #[must_use]
    pub fn new(registered: Vec<String>) -> Self {
        Self { registered }
    }

    /// Builds a normalizer over the default canonical set.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(CANONICAL_NAMES.iter().map(|s| (*s).to_string()).collect())
    }

    /// Normalizes `raw` to a canonical name, or returns `raw` unchanged
    /// (with a tracing diagnostic) if every tier fails.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> String {
        let key = lookup_key(raw);
        if key.is_empty() {
            tracing::debug!(raw, "empty name after normalization key extraction");
            return raw.to_string();
        }

        // Tier 1: exhaustive alias table (also covers exact canonical names,
        // since the table's values lowercase back onto their own keys).
        let aliases = alias_table();
        if let Some(canonical) = aliases.get(key.as_str()) {
            return (*canonical).to_string();
        }
        if let Some(canonical) = self
            .registered
            .iter()
            .find(|name| lookup_key(name) == key)
        {
            return canonical.clone();
        }

        // Tier 2: substring pattern fallback.
        if let Some(canonical) = pattern_fallback(&key) {
            if self.registered.iter().any(|n| n == canonical) {
                return canonical.to_string();
            }
        }

        // Tier 3: strip trailing "agent" and retry both tiers above.
        if let Some(stripped) = key.strip_suffix("agent") {
            if let Some(canonical) = aliases.get(stripped) {
                return (*canonical).to_string();
            }
            if let Some(canonical) = pattern_fallback(stripped) {
                if self.registered.iter().any(|n| n == canonical) {
                    return canonical.to_string();
                }
            }
        }

        // Tier 4: semantic-equivalence fallback against registered names.
        let stripped_key = strip_affixes(&key);
        for candidate in &self.registered {
            let candidate_key = strip_affixes(&lookup_key(candidate));
            if semantically_equivalent(&stripped_key, &candidate_key) {
                return candidate.clone();
            }
        }

        // Tier 5: give up, emit a diagnostic, return the raw name.
        tracing::warn!(raw, key, "name normalization fell through to raw name");
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> NameNormalizer {
        NameNormalizer::with_defaults()
    }

    #[test]
    fn exact_canonical_name_round_trips() {
        for name in CANONICAL_NAMES {
            assert_eq!(normalizer().normalize(name), *name);
        }
    }

    #[test]
    fn call_prefix_and_typo_normalize() {
        assert_eq!(normalizer().normalize("CALL_DATA_INSPIRATER"), "DataInspector");
        assert_eq!(normalizer().normalize("call datainspirater"), "DataInspector");
        assert_eq!(normalizer().normalize("synesthesizer"), "SynthesisCoordinator");
        assert_eq!(normalizer().normalize("dataextractor"), "Extractor");
        assert_eq!(normalizer().normalize("regexextractor"), "Extractor");
    }

    #[test]
    fn snake_case_and_case_insensitive() {
        assert_eq!(normalizer().normalize("pattern_generator"), "PatternGenerator");
        assert_eq!(normalizer().normalize("EXTRACTOR"), "Extractor");
    }

    #[test]
    fn pattern_fallback_catches_substrings() {
        assert_eq!(normalizer().normalize("SuperExtractorDeluxe"), "Extractor");
        assert_eq!(normalizer().normalize("MyPatternGeneratorV2"), "PatternGenerator");
    }

    #[test]
    fn unresolvable_name_falls_through_unchanged() {
        assert_eq!(normalizer().normalize("TotallyUnknownThing"), "TotallyUnknownThing");
    }

    #[test]
    fn normalization_is_idempotent() {
        let n = normalizer();
        for raw in [
            "CALL_DATA_INSPIRATER",
            "synesthesizer",
            "Extractor",
            "random_garbage_name",
            "PatternGeneratorAgent",
        ] {
            let once = n.normalize(raw);
            let twice = n.normalize(&once);
            assert_eq!(once, twice, "normalize not idempotent for {raw}");
        }
    }
}
