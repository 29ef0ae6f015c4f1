use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Normalized output of a connector.
///
/// Serializes untagged, so callers see the same JSON they would have
/// seen from the upstream feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceData {
    /// A sequence of records (JSON array, CSV rows, SQL rows, emails).
    Records(Vec<Value>),
    /// Raw text body.
    Text(String),
    /// A single record or scalar.
    Record(Value),
}

impl SourceData {
    /// Wrap a decoded JSON body. `null` means "no data".
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Array(items) => Some(Self::Records(items)),
            Value::String(text) => Some(Self::Text(text)),
            other => Some(Self::Record(other)),
        }
    }

    /// Number of records reported in the ledger: the length for a
    /// sequence, 1 for a scalar, 0 for an empty or falsy scalar.
    pub fn record_count(&self) -> usize {
        match self {
            Self::Records(items) => items.len(),
            Self::Text(text) => usize::from(!text.is_empty()),
            Self::Record(value) => usize::from(!is_falsy(value)),
        }
    }

    pub fn as_records(&self) -> Option<&[Value]> {
        match self {
            Self::Records(items) => Some(items),
            _ => None,
        }
    }

    pub fn into_json(self) -> Value {
        match self {
            Self::Records(items) => Value::Array(items),
            Self::Text(text) => Value::String(text),
            Self::Record(value) => value,
        }
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
