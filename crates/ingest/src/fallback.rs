//! Best-effort resolution of unclassified sources.
//!
//! When `fields` is not JSON, the text goes through [`HEURISTIC_RULES`] in
//! order and the first rule that matches wins. A labeled number such as
//! `total: 42` must beat the bare-number rule even though both match.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};

use cockpit_core::SourceData;

use crate::connectors::FetchOutcome;
use crate::plan::UnclassifiedPlan;

/// Decimal number, `,` accepted as decimal separator.
pub const NUMBER_PATTERN: &str = r"\d+(?:[.,]\d+)?";

pub const UNCLASSIFIED_GUIDANCE: &str =
    "Source non reconnue: indiquez une URL http(s), un JSON ou un texte contenant une valeur";

/// A named extractor in the heuristic chain.
pub struct HeuristicRule {
    pub name: &'static str,
    pub apply: fn(&str) -> Option<Value>,
}

/// Evaluated top to bottom; first match wins.
pub const HEURISTIC_RULES: &[HeuristicRule] = &[
    HeuristicRule {
        name: "labeled-number",
        apply: labeled_number,
    },
    HeuristicRule {
        name: "bare-number",
        apply: bare_number,
    },
    HeuristicRule {
        name: "raw-text",
        apply: raw_text,
    },
];

pub fn resolve_unclassified(plan: &UnclassifiedPlan) -> FetchOutcome {
    let Some(raw) = plan.raw.as_deref().filter(|r| !r.trim().is_empty()) else {
        return FetchOutcome::Skipped(UNCLASSIFIED_GUIDANCE.to_string());
    };

    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return FetchOutcome::Fetched(SourceData::from_json(value));
    }

    match apply_heuristics(raw) {
        Some((rule, value)) => {
            tracing::debug!(rule, "unclassified source resolved by heuristic");
            FetchOutcome::Fetched(SourceData::from_json(value))
        }
        None => FetchOutcome::Skipped(UNCLASSIFIED_GUIDANCE.to_string()),
    }
}

/// Run the chain and report which rule matched.
pub fn apply_heuristics(text: &str) -> Option<(&'static str, Value)> {
    HEURISTIC_RULES
        .iter()
        .find_map(|rule| (rule.apply)(text).map(|value| (rule.name, value)))
}

/// Parse a matched number, accepting `,` as decimal separator.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse().ok()
}

/// First number inside `text`.
pub fn first_number(text: &str) -> Option<f64> {
    number_regex().find(text).and_then(|m| parse_number(m.as_str()))
}

/// JSON number, integral values rendered as integers.
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

fn number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(NUMBER_PATTERN).expect("valid number regex"))
}

fn labeled_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?i)(?:valeur|value|total|count|nombre)[:=\s]+({NUMBER_PATTERN})"
        ))
        .expect("valid labeled number regex")
    })
}

fn labeled_number(text: &str) -> Option<Value> {
    let caps = labeled_regex().captures(text)?;
    let n = parse_number(caps.get(1)?.as_str())?;
    Some(json!({ "value": number_value(n) }))
}

fn bare_number(text: &str) -> Option<Value> {
    first_number(text).map(|n| json!({ "value": number_value(n) }))
}

fn raw_text(text: &str) -> Option<Value> {
    (!text.trim().is_empty()).then(|| json!({ "rawText": text, "value": text }))
}
