//! Mailbox connector: mine values out of recent emails.
//!
//! Flow: resolve the provider, fetch messages (Microsoft Graph, Gmail or
//! a custom JSON endpoint), narrow by subject then sender, and either
//! extract numeric values with the source's pattern or return previews.
//!
//! A missing token/apiUrl is not raised as an error. The connector writes
//! the configuration guidance into the current ledger step itself and
//! returns no data.

mod config;
mod custom;
mod gmail;
mod microsoft;
mod values;

pub use config::{MailProvider, MailboxConfig, DEFAULT_FOLDER, DEFAULT_MAX_RESULTS};
pub use values::{extract_values, ExtractedValue};

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use cockpit_core::config::MailboxApiConfig;
use cockpit_core::{ExecutionLedger, SourceData, SourceError, StepIndex, StepStatus};

use crate::http::HttpFetcher;
use crate::plan::MailboxPlan;

/// Length of `bodyPreview` in the default projection, in characters.
pub const PREVIEW_CHARS: usize = 200;

/// Provider-neutral message.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    pub id: String,
    pub subject: String,
    pub from: String,
    pub body: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,
}

impl Email {
    fn preview(&self) -> Value {
        json!({
            "id": self.id,
            "subject": self.subject,
            "from": self.from,
            "date": self.date,
            "bodyPreview": self.body.chars().take(PREVIEW_CHARS).collect::<String>(),
        })
    }
}

pub struct MailboxConnector<'a> {
    http: &'a dyn HttpFetcher,
    endpoints: &'a MailboxApiConfig,
}

impl<'a> MailboxConnector<'a> {
    pub fn new(http: &'a dyn HttpFetcher, endpoints: &'a MailboxApiConfig) -> Self {
        Self { http, endpoints }
    }

    /// Fetch, filter and mine one mailbox. `step` is the caller's running
    /// ledger step; it is finalized here only on a configuration error.
    pub async fn fetch(
        &self,
        plan: &MailboxPlan,
        ledger: &mut ExecutionLedger,
        step: StepIndex,
    ) -> Result<Option<SourceData>, SourceError> {
        let config = &plan.config;
        let provider = config.resolve_provider(&plan.address);

        let emails = match (provider, config.token.as_deref(), config.api_url.as_deref()) {
            (MailProvider::Microsoft, Some(token), _) => {
                microsoft::fetch_messages(self.http, &self.endpoints.graph_api_url, token, config).await?
            }
            (MailProvider::Gmail, Some(token), _) => {
                gmail::fetch_messages(self.http, &self.endpoints.gmail_api_url, token, config).await?
            }
            (_, Some(token), Some(api_url)) => custom::fetch_messages(self.http, api_url, token).await?,
            _ => {
                let message = configuration_guidance(provider, config);
                warn!(provider = provider.as_str(), "mailbox source is not configured");
                ledger.finalize(
                    step,
                    StepStatus::Error,
                    message,
                    Some(json!({ "provider": provider.as_str() })),
                );
                return Ok(None);
            }
        };

        let fetched = emails.len();
        let emails = apply_filters(emails, config);
        debug!(
            provider = provider.as_str(),
            fetched,
            kept = emails.len(),
            "mailbox messages filtered"
        );

        if let Some(pattern) = plan.pattern.as_deref().filter(|p| !p.is_empty()) {
            if !emails.is_empty() {
                let values = extract_values(&emails, pattern);
                if !values.is_empty() {
                    let records = values
                        .iter()
                        .map(serde_json::to_value)
                        .collect::<Result<Vec<_>, _>>()?;
                    return Ok(Some(SourceData::Records(records)));
                }
            }
        }

        Ok(Some(SourceData::Records(
            emails.iter().map(Email::preview).collect(),
        )))
    }
}

/// Narrow by subject, then by sender; case-insensitive substring match.
pub fn apply_filters(mut emails: Vec<Email>, config: &MailboxConfig) -> Vec<Email> {
    if let Some(subject) = &config.subject {
        let needle = subject.to_lowercase();
        emails.retain(|e| e.subject.to_lowercase().contains(&needle));
    }
    if let Some(from) = &config.from {
        let needle = from.to_lowercase();
        emails.retain(|e| e.from.to_lowercase().contains(&needle));
    }
    emails
}

fn configuration_guidance(provider: MailProvider, config: &MailboxConfig) -> String {
    match provider {
        MailProvider::Microsoft | MailProvider::Gmail => format!(
            "Configuration email incomplète: `token` manquant pour le fournisseur {}. \
             Renseignez la connexion au format {{\"token\": \"...\"}}, ou \
             {{\"provider\": \"custom\", \"apiUrl\": \"...\", \"token\": \"...\"}}",
            provider.as_str()
        ),
        MailProvider::Custom => {
            let missing: Vec<&str> = [
                config.api_url.is_none().then_some("apiUrl"),
                config.token.is_none().then_some("token"),
            ]
            .into_iter()
            .flatten()
            .collect();
            format!(
                "Configuration email incomplète: {} manquant(s). Renseignez la connexion au format \
                 {{\"apiUrl\": \"...\", \"token\": \"...\"}}, ou indiquez une adresse Gmail/Outlook avec un `token`",
                missing.join(" et ")
            )
        }
    }
}
