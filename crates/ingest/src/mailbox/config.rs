use serde_json::{Map, Value};
use tracing::debug;

pub const DEFAULT_FOLDER: &str = "inbox";
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Mailbox API family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailProvider {
    Microsoft,
    Gmail,
    Custom,
}

impl MailProvider {
    /// Map a provider name or an address domain fragment.
    fn from_hint(hint: &str) -> Self {
        let hint = hint.to_lowercase();
        if ["outlook", "microsoft", "hotmail"].iter().any(|k| hint.contains(k)) {
            Self::Microsoft
        } else if hint.contains("gmail") || hint == "google" {
            Self::Gmail
        } else {
            Self::Custom
        }
    }

    /// Infer from the domain part of an address (whole string if no `@`).
    pub fn infer(address: &str) -> Self {
        let domain = address.rsplit('@').next().unwrap_or(address);
        Self::from_hint(domain)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Microsoft => "microsoft",
            Self::Gmail => "gmail",
            Self::Custom => "custom",
        }
    }
}

/// Mailbox settings read from a source's `connection` string.
#[derive(Debug, Clone, PartialEq)]
pub struct MailboxConfig {
    /// Explicit provider, if the connection named one.
    pub provider: Option<MailProvider>,
    pub token: Option<String>,
    pub api_url: Option<String>,
    pub folder: String,
    pub subject: Option<String>,
    pub from: Option<String>,
    pub max_results: usize,
    pub extract_pattern: Option<String>,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            provider: None,
            token: None,
            api_url: None,
            folder: DEFAULT_FOLDER.to_string(),
            subject: None,
            from: None,
            max_results: DEFAULT_MAX_RESULTS,
            extract_pattern: None,
        }
    }
}

impl MailboxConfig {
    /// A JSON object is read key by key; a string that is not JSON is
    /// taken as a bare token. Any other JSON value yields the defaults.
    /// Blank or wrongly typed keys count as absent and do not affect the
    /// other keys.
    pub fn parse(connection: Option<&str>) -> Self {
        let Some(raw) = connection.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::default();
        };

        let obj = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(obj)) => obj,
            Ok(other) => {
                debug!(kind = json_kind(&other), "mailbox connection is neither an object nor a token");
                return Self::default();
            }
            Err(_) => {
                return Self {
                    token: Some(raw.to_string()),
                    ..Self::default()
                };
            }
        };

        Self {
            provider: string_key(&obj, "provider").map(|p| MailProvider::from_hint(&p)),
            token: string_key(&obj, "token"),
            api_url: string_key(&obj, "apiUrl"),
            folder: string_key(&obj, "folder").unwrap_or_else(|| DEFAULT_FOLDER.to_string()),
            subject: string_key(&obj, "subject"),
            from: string_key(&obj, "from"),
            max_results: obj
                .get("maxResults")
                .and_then(positive_count)
                .unwrap_or(DEFAULT_MAX_RESULTS),
            extract_pattern: string_key(&obj, "extractPattern"),
        }
    }

    /// Explicit provider wins; otherwise infer from the address.
    pub fn resolve_provider(&self, address: &str) -> MailProvider {
        self.provider.unwrap_or_else(|| MailProvider::infer(address))
    }
}

/// Non-blank string value of `key`. Other JSON types are ignored.
fn string_key(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::String(_) | Value::Null => None,
        other => {
            debug!(key, kind = json_kind(other), "ignoring mailbox key with unexpected type");
            None
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `maxResults` may arrive as a number or a numeric string.
fn positive_count(value: &Value) -> Option<usize> {
    let n = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    usize::try_from(n).ok().filter(|n| *n > 0)
}
