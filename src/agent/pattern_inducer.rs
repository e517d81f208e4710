//! Bottom-up numeric pattern induction.
//!
//! Scans raw chunk text for number-shaped substrings, learns the
//! decimal/joiner/unit conventions the corpus actually uses, and
//! synthesizes a small set of regexes ranked by how many hits they would
//! have covered. This runs independently of `PatternGenerator`'s
//! LLM-proposed patterns and is meant to backstop it when the advisor's
//! own patterns come up empty.

use std::collections::HashMap;

use regex::Regex;

use crate::core::Pattern;

/// A candidate numeric hit harvested from chunk text, with surrounding
/// context for joiner/unit learning.
struct NumericHit {
    matched: String,
    before: String,
    after: String,
}

/// How this corpus writes decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecimalStyle {
    Dot,
    Space,
    Mixed,
}

fn harvest_numeric_hits(text: &str) -> Vec<NumericHit> {
    let Ok(re) = Regex::new(r"\d+[\s.:]\d{1,2}|\d+(?:\.\d+)?") else {
        return Vec::new();
    };
    re.find_iter(text)
        .map(|m| {
            let start = m.start().saturating_sub(32);
            let end = (m.end() + 32).min(text.len());
            NumericHit {
                matched: m.as_str().to_string(),
                before: text[start..m.start()].to_string(),
                after: text[m.end()..end].to_string(),
            }
        })
        .collect()
}

fn learn_decimal_style(hits: &[NumericHit]) -> DecimalStyle {
    let (mut dot, mut space) = (0usize, 0usize);
    for hit in hits {
        if hit.matched.contains('.') {
            dot += 1;
        }
        if hit.matched.chars().any(char::is_whitespace) {
            space += 1;
        }
    }
    match (dot > 0, space > 0) {
        (true, false) => DecimalStyle::Dot,
        (false, true) => DecimalStyle::Space,
        _ => DecimalStyle::Mixed,
    }
}

/// First alphabetic token immediately following whitespace, used as a
/// unit candidate (e.g. "12.5 kg" -> "kg").
fn first_alpha_token(s: &str) -> Option<&str> {
    let trimmed = s.trim_start();
    let end = trimmed.find(|c: char| !c.is_alphabetic()).unwrap_or(trimmed.len());
    (end > 0 && end <= 12).then(|| &trimmed[..end])
}

/// One learned "measurement family": a joiner/unit convention with a
/// support count of how many hits exhibited it.
struct MeasurementFamily {
    key: String,
    support: usize,
    kind: FamilyKind,
}

#[derive(Clone)]
enum FamilyKind {
    /// `N/unit` or `N per unit`.
    SlashOrPer { unit: String },
    /// `N unit` (unit is the first alphabetic token after the number).
    LeadingUnit { unit: String },
}

fn learn_measurement_families(hits: &[NumericHit]) -> Vec<MeasurementFamily> {
    let mut counts: HashMap<String, (usize, FamilyKind)> = HashMap::new();

    for hit in hits {
        if let Some(unit) = hit.after.trim_start().strip_prefix('/') {
            if let Some(token) = first_alpha_token(unit) {
                let key = format!("slash:{token}");
                counts
                    .entry(key.clone())
                    .and_modify(|(n, _)| *n += 1)
                    .or_insert((1, FamilyKind::SlashOrPer { unit: token.to_string() }));
                continue;
            }
        }
        if let Some(rest) = hit.after.trim_start().strip_prefix("per ") {
            if let Some(token) = first_alpha_token(rest) {
                let key = format!("per:{token}");
                counts
                    .entry(key.clone())
                    .and_modify(|(n, _)| *n += 1)
                    .or_insert((1, FamilyKind::SlashOrPer { unit: token.to_string() }));
                continue;
            }
        }
        if let Some(token) = first_alpha_token(&hit.after) {
            let key = format!("unit:{token}");
            counts
                .entry(key.clone())
                .and_modify(|(n, _)| *n += 1)
                .or_insert((1, FamilyKind::LeadingUnit { unit: token.to_string() }));
        }
    }

    counts
        .into_iter()
        .map(|(key, (support, kind))| MeasurementFamily { key, support, kind })
        .collect()
}

fn decimal_fragment(style: DecimalStyle) -> &'static str {
    match style {
        DecimalStyle::Dot => r"\d+\.\d+",
        DecimalStyle::Space => r"\d+\s\d{1,2}",
        DecimalStyle::Mixed => r"\d+[\s.]\d{1,2}",
    }
}

fn synthesize_regex(family: &MeasurementFamily, style: DecimalStyle) -> String {
    let number = decimal_fragment(style);
    match &family.kind {
        FamilyKind::SlashOrPer { unit } => format!(r"{number}\s*/\s*{}", regex::escape(unit)),
        FamilyKind::LeadingUnit { unit } => format!(r"{number}\s*{}", regex::escape(unit)),
    }
}

const INDUCED_CONFIDENCE: f32 = 0.92;

/// Length above which a synthesized regex is considered malformed
/// (shared heuristic with `PatternGenerator`).
const MAX_PATTERN_LEN: usize = 300;

/// True if `pattern` contains a parenthesized group immediately followed
/// by a `{n}`/`{n,}`/`{n,m}` quantifier whose lower bound is 5 or more —
/// e.g. `(•.*?){12}` or `(\s*){10,}`. A handful of repeats of a grouped
/// sub-pattern is normal; five or more is a sign the pattern was
/// generated by blindly repeating a fragment rather than describing the
/// data.
fn has_excessive_group_repetition(pattern: &str) -> bool {
    let Ok(re) = Regex::new(r"\([^()]*\)\{(\d+)(?:,\d*)?\}") else { return false };
    re.captures_iter(pattern).any(|caps| {
        caps.get(1)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .is_some_and(|n| n >= 5)
    })
}

/// Regex-shaped "useless generic" patterns: a pattern whose entire body
/// *is* one of these shapes matches almost anything and carries no
/// extraction value.
fn matches_useless_generic_shape(pattern: &str) -> bool {
    const SHAPES: &[&str] = &[r"^pattern\d*$", r"^\w+$", r"^[a-z]{1,3}$", r"^\d+$"];
    SHAPES
        .iter()
        .filter_map(|shape| Regex::new(shape).ok())
        .any(|re| re.is_match(pattern))
}

/// A synthesized pattern is malformed if: it exceeds [`MAX_PATTERN_LEN`],
/// it repeats a single character 50 or more times in a row, it repeats a
/// parenthesized group 5 or more times, or it is one of a small set (or
/// shape) of "useless generic" patterns that match almost anything.
#[must_use]
pub fn is_malformed_pattern(pattern: &str) -> bool {
    if pattern.len() > MAX_PATTERN_LEN {
        return true;
    }
    if pattern.is_empty() {
        return true;
    }

    let bytes = pattern.as_bytes();
    let mut run = 1usize;
    for w in bytes.windows(2) {
        if w[0] == w[1] {
            run += 1;
            if run >= 50 {
                return true;
            }
        } else {
            run = 1;
        }
    }

    if has_excessive_group_repetition(pattern) {
        return true;
    }

    const USELESS_GENERIC: &[&str] = &[".*", ".+", r"\d+", r"\w+", r"\s+", ".", r"[\s\S]*"];
    if USELESS_GENERIC.contains(&pattern) {
        return true;
    }

    matches_useless_generic_shape(pattern)
}

/// Induces up to `pattern_cap` numeric patterns from `texts`, ranked by
/// support (number of hits the family covered). Returns an empty vec
/// when `texts` contains no numeric hits.
#[must_use]
pub fn induce_patterns(texts: &[&str], pattern_cap: usize) -> Vec<Pattern> {
    let hits: Vec<NumericHit> = texts.iter().flat_map(|t| harvest_numeric_hits(t)).collect();
    if hits.is_empty() {
        return Vec::new();
    }

    let style = learn_decimal_style(&hits);
    let mut families = learn_measurement_families(&hits);
    families.sort_by(|a, b| b.support.cmp(&a.support).then_with(|| a.key.cmp(&b.key)));

    families
        .into_iter()
        .filter_map(|family| {
            let regex_str = synthesize_regex(&family, style);
            if is_malformed_pattern(&regex_str) {
                return None;
            }
            let description = format!("numeric measurement pattern ({})", family.key);
            let mut pattern = Pattern::new(description, INDUCED_CONFIDENCE);
            pattern.extraction_strategy = format!("induced, support={}", family.support);
            pattern.regex_pattern = Some(regex_str);
            Some(pattern)
        })
        .take(pattern_cap)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_numbers_yields_zero_patterns() {
        let texts = ["no numbers appear anywhere in this text at all"];
        assert!(induce_patterns(&texts, 12).is_empty());
    }

    #[test]
    fn learns_unit_family_from_repeated_measurements() {
        let texts = [
            "the reading was 12.5 kg and later 13.0 kg was recorded",
            "a third sample measured 11.2 kg on site",
        ];
        let patterns = induce_patterns(&texts, 12);
        assert!(!patterns.is_empty());
        assert!(patterns[0].extraction_strategy.contains("support=2"));
    }

    #[test]
    fn respects_pattern_cap() {
        let text = "1 aa 2 bb 3 cc 4 dd 5 ee 6 ff 7 gg 8 hh 9 ii 10 jj 11 kk 12 ll 13 mm 14 nn";
        let patterns = induce_patterns(&[text], 3);
        assert!(patterns.len() <= 3);
    }

    #[test]
    fn detects_malformed_patterns() {
        assert!(is_malformed_pattern(&"a".repeat(60)));
        assert!(is_malformed_pattern(&"x".repeat(400)));
        assert!(is_malformed_pattern(r"\d+"));
        assert!(!is_malformed_pattern(r"\d+\.\d+\s*kg"));
    }

    #[test]
    fn detects_excessive_group_repetition() {
        assert!(is_malformed_pattern(r"(•.*?){12}"));
        assert!(is_malformed_pattern(r"(\s*){10,}"));
        assert!(!is_malformed_pattern(r"(kg){1,2}"));
    }

    #[test]
    fn detects_regex_shaped_useless_generics() {
        assert!(is_malformed_pattern("pattern1"));
        assert!(is_malformed_pattern("abc"));
        assert!(is_malformed_pattern("xyz"));
        assert!(!is_malformed_pattern(r"\d+\.\d+\s*kg"));
    }
}
