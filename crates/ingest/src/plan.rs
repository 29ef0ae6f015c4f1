//! Boundary parsing: turn a loosely typed [`SourceDescriptor`] into a
//! [`SourcePlan`] whose variants carry exactly what each connector needs.
//!
//! The overloaded `connection` and `fields` strings are interpreted here
//! once, never again inside a connector.

use serde_json::Value;

use cockpit_core::{SourceDescriptor, SourceError, SourceKind};

use crate::extract::FieldSpec;
use crate::http::RequestHeaders;
use crate::mailbox::MailboxConfig;

/// Headers derived from a REST source's `connection` string.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpAuth {
    headers: RequestHeaders,
}

impl HttpAuth {
    /// `connection` may be a JSON object (`headers` merged over the
    /// defaults, `apiKey` turned into a bearer header) or a bare token.
    /// Any other JSON value adds nothing.
    pub fn parse(connection: Option<&str>) -> Self {
        let mut headers = RequestHeaders::new();
        headers.insert("Content-Type".into(), "application/json".into());

        let Some(raw) = connection.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self { headers };
        };

        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(config)) => {
                if let Some(Value::Object(extra)) = config.get("headers") {
                    for (name, value) in extra {
                        let value = match value {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        headers.insert(name.clone(), value);
                    }
                }
                if let Some(key) = config.get("apiKey").and_then(Value::as_str) {
                    headers.insert("Authorization".into(), format!("Bearer {key}"));
                }
            }
            Ok(_) => {}
            Err(_) => {
                headers.insert("Authorization".into(), format!("Bearer {raw}"));
            }
        }
        Self { headers }
    }

    pub fn headers(&self) -> &RequestHeaders {
        &self.headers
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestPlan {
    pub url: String,
    pub auth: HttpAuth,
    pub fields: FieldSpec,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatabasePlan {
    pub connection: String,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MailboxPlan {
    /// Mailbox address, used to infer the provider.
    pub address: String,
    pub config: MailboxConfig,
    /// `extractPattern` from the config, else the descriptor's `fields`.
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralPlan {
    pub data: Option<Value>,
    pub raw: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnclassifiedPlan {
    pub raw: Option<String>,
}

/// What the orchestrator will do for one descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum SourcePlan {
    /// `api`, the monitoring aliases, and `other` sources with an http(s) location.
    Rest(RestPlan),
    Json { url: String },
    Csv { url: String },
    /// `excel`: fetched only when a [`WorkbookParser`](crate::connectors::spreadsheet::WorkbookParser)
    /// is installed, otherwise skipped.
    Spreadsheet {
        url: Option<String>,
        fields: Option<String>,
    },
    Database(DatabasePlan),
    Mailbox(MailboxPlan),
    Literal(LiteralPlan),
    Unclassified(UnclassifiedPlan),
}

impl SourcePlan {
    pub fn from_descriptor(kind: SourceKind, source: &SourceDescriptor) -> Result<Self, SourceError> {
        let plan = match kind {
            SourceKind::Api
            | SourceKind::Supervision
            | SourceKind::Hypervision
            | SourceKind::Observability => Self::Rest(rest_plan(source)?),
            SourceKind::Json => Self::Json {
                url: require_url(source)?,
            },
            SourceKind::Csv => Self::Csv {
                url: require_url(source)?,
            },
            SourceKind::Excel => Self::Spreadsheet {
                url: source.location().map(|l| l.trim().to_string()),
                fields: source.fields().map(str::to_string),
            },
            SourceKind::Database => Self::Database(DatabasePlan {
                connection: source
                    .connection()
                    .ok_or(SourceError::MissingConnection)?
                    .to_string(),
                query: source.fields().unwrap_or_default().to_string(),
            }),
            SourceKind::Email => {
                let config = MailboxConfig::parse(source.connection());
                let pattern = config
                    .extract_pattern
                    .clone()
                    .or_else(|| source.fields().map(str::to_string));
                Self::Mailbox(MailboxPlan {
                    address: source.location().unwrap_or_default().trim().to_string(),
                    config,
                    pattern,
                })
            }
            SourceKind::Manual | SourceKind::Static => Self::Literal(LiteralPlan {
                data: source.literal_data().cloned(),
                raw: source.fields().map(str::to_string),
            }),
            SourceKind::Other => match source.location().filter(|l| is_absolute_http(l)) {
                Some(_) => Self::Rest(rest_plan(source)?),
                None => Self::Unclassified(UnclassifiedPlan {
                    raw: source.fields().map(str::to_string),
                }),
            },
        };
        Ok(plan)
    }
}

fn require_url(source: &SourceDescriptor) -> Result<String, SourceError> {
    source
        .location()
        .map(|l| l.trim().to_string())
        .ok_or(SourceError::MissingUrl)
}

fn rest_plan(source: &SourceDescriptor) -> Result<RestPlan, SourceError> {
    Ok(RestPlan {
        url: require_url(source)?,
        auth: HttpAuth::parse(source.connection()),
        fields: FieldSpec::parse(source.fields().unwrap_or_default()),
    })
}

/// `true` for absolute `http://` / `https://` URLs with a host.
pub fn is_absolute_http(location: &str) -> bool {
    url::Url::parse(location.trim())
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}
