//! Value mining from email bodies.
//!
//! Patterns are compiled with the `regex` crate, which has no lookaround
//! and no backreferences. A pattern using them does not compile and is
//! matched as literal text instead (see [`extract_values`]).

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::debug;

use super::Email;
use crate::fallback::{first_number, parse_number, NUMBER_PATTERN};

/// A number mined from one email body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedValue {
    pub email_id: String,
    pub subject: String,
    pub date: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_match: Option<String>,
}

impl ExtractedValue {
    fn new(email: &Email, value: f64, raw_match: &str) -> Self {
        Self {
            email_id: email.id.clone(),
            subject: email.subject.clone(),
            date: email.date.clone(),
            value,
            raw_match: Some(raw_match.to_string()),
        }
    }
}

/// Mine values from `emails` with a user-supplied pattern.
///
/// The pattern is compiled case-insensitively and every match containing
/// a number yields one value. A pattern that does not compile is treated
/// as literal text instead: emails containing it are searched for a
/// number right after it (`<text>[\s:=]*<number>`).
pub fn extract_values(emails: &[Email], pattern: &str) -> Vec<ExtractedValue> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(re) => emails
            .iter()
            .flat_map(|email| {
                re.find_iter(&email.body).filter_map(move |m| {
                    first_number(m.as_str()).map(|value| ExtractedValue::new(email, value, m.as_str()))
                })
            })
            .collect(),
        Err(e) => {
            debug!(error = %e, "extract pattern is not a regex, matching as text");
            literal_values(emails, pattern)
        }
    }
}

fn literal_values(emails: &[Email], pattern: &str) -> Vec<ExtractedValue> {
    let needle = pattern.to_lowercase();
    let trailing = match Regex::new(&format!(
        r"(?i){}[\s:=]*({NUMBER_PATTERN})",
        regex::escape(pattern)
    )) {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };

    emails
        .iter()
        .filter(|email| email.body.to_lowercase().contains(&needle))
        .filter_map(|email| {
            let caps = trailing.captures(&email.body)?;
            let value = parse_number(caps.get(1)?.as_str())?;
            Some(ExtractedValue::new(email, value, caps.get(0)?.as_str()))
        })
        .collect()
}
