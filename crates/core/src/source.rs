use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of external feed a descriptor points at.
///
/// Unknown `type` strings fall into [`SourceKind::Other`], the best-effort branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Api,
    Json,
    Csv,
    Excel,
    Database,
    Supervision,
    Hypervision,
    Observability,
    Email,
    Manual,
    Static,
    Other,
}

impl SourceKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "api" => Self::Api,
            "json" => Self::Json,
            "csv" => Self::Csv,
            "excel" => Self::Excel,
            "database" => Self::Database,
            "supervision" => Self::Supervision,
            "hypervision" => Self::Hypervision,
            "observability" => Self::Observability,
            "email" => Self::Email,
            "manual" => Self::Manual,
            "static" => Self::Static,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Excel => "excel",
            Self::Database => "database",
            Self::Supervision => "supervision",
            Self::Hypervision => "hypervision",
            Self::Observability => "observability",
            Self::Email => "email",
            Self::Manual => "manual",
            Self::Static => "static",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extra settings attached to a descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceSettings {
    /// Literal payload for manual/static sources.
    #[serde(default)]
    pub data: Option<Value>,
}

/// Configuration of one external data feed, as stored in a cockpit.
///
/// The string fields are overloaded per kind (`fields` may hold a
/// projection spec, literal data, a SQL query or a regex); they are
/// interpreted once when the ingest pipeline builds its fetch plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    #[serde(rename = "type", default)]
    pub source_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub connection: Option<String>,
    #[serde(default)]
    pub fields: Option<String>,
    #[serde(default)]
    pub config: Option<SourceSettings>,
}

impl SourceDescriptor {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            source_type: Some(kind.as_str().to_string()),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_connection(mut self, connection: impl Into<String>) -> Self {
        self.connection = Some(connection.into());
        self
    }

    pub fn with_fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.config = Some(SourceSettings { data: Some(data) });
        self
    }

    /// Parsed kind, or `None` when `type` is missing or blank.
    pub fn kind(&self) -> Option<SourceKind> {
        self.source_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(SourceKind::parse)
    }

    pub fn location(&self) -> Option<&str> {
        non_blank(self.location.as_deref())
    }

    pub fn connection(&self) -> Option<&str> {
        non_blank(self.connection.as_deref())
    }

    pub fn fields(&self) -> Option<&str> {
        non_blank(self.fields.as_deref())
    }

    /// `config.data`, ignoring an explicit JSON `null`.
    pub fn literal_data(&self) -> Option<&Value> {
        self.config
            .as_ref()
            .and_then(|c| c.data.as_ref())
            .filter(|v| !v.is_null())
    }

    /// Display label for logs and ledger messages.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(self.source_type.as_deref())
            .unwrap_or("source")
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse_known_and_unknown() {
        assert_eq!(SourceKind::parse("api"), SourceKind::Api);
        assert_eq!(SourceKind::parse(" CSV "), SourceKind::Csv);
        assert_eq!(SourceKind::parse("observability"), SourceKind::Observability);
        assert_eq!(SourceKind::parse("ftp"), SourceKind::Other);
    }

    #[test]
    fn test_descriptor_from_cockpit_json() {
        let json = r#"{
            "type": "api",
            "name": "Tickets ouverts",
            "location": "https://helpdesk.example.com/api/tickets",
            "connection": "{\"apiKey\":\"k-123\"}",
            "fields": "id, status"
        }"#;
        let source: SourceDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(source.kind(), Some(SourceKind::Api));
        assert_eq!(source.label(), "Tickets ouverts");
        assert_eq!(source.fields(), Some("id, status"));
        assert!(source.literal_data().is_none());
    }

    #[test]
    fn test_missing_or_blank_type() {
        let source: SourceDescriptor = serde_json::from_str(r#"{"name":"x"}"#).unwrap();
        assert_eq!(source.kind(), None);

        let blank: SourceDescriptor = serde_json::from_str(r#"{"type":"  "}"#).unwrap();
        assert_eq!(blank.kind(), None);
    }

    #[test]
    fn test_blank_strings_are_absent() {
        let source = SourceDescriptor::new(SourceKind::Csv)
            .with_location("   ")
            .with_connection("");
        assert_eq!(source.location(), None);
        assert_eq!(source.connection(), None);
    }

    #[test]
    fn test_literal_data_ignores_null() {
        let json = r#"{"type":"manual","config":{"data":null}}"#;
        let source: SourceDescriptor = serde_json::from_str(json).unwrap();
        assert!(source.literal_data().is_none());

        let source = SourceDescriptor::new(SourceKind::Static)
            .with_data(serde_json::json!({"value": 3}));
        assert_eq!(source.literal_data(), Some(&serde_json::json!({"value": 3})));
    }
}
