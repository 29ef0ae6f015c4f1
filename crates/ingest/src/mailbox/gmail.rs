//! Gmail path: list message ids, then fetch each message one at a time.
//!
//! Messages are fetched strictly sequentially, at most `maxResults` of them.
//!
//! Body selection: the first `text/plain` part wins and ends the scan,
//! while for HTML the *last* `text/html` part seen wins.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use tracing::debug;

use cockpit_core::SourceError;

use super::{Email, MailboxConfig};
use crate::http::{HttpFetcher, RequestHeaders};

#[derive(Debug, Deserialize)]
struct GmailMessagesListResponse {
    #[serde(default)]
    messages: Vec<GmailMessageRef>,
}

#[derive(Debug, Deserialize)]
struct GmailMessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessage {
    #[serde(default)]
    id: String,
    #[serde(default)]
    snippet: String,
    internal_date: Option<String>,
    payload: Option<GmailPart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailPart {
    mime_type: Option<String>,
    #[serde(default)]
    headers: Vec<GmailHeader>,
    body: Option<GmailBody>,
    #[serde(default)]
    parts: Vec<GmailPart>,
}

#[derive(Debug, Deserialize)]
struct GmailHeader {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct GmailBody {
    data: Option<String>,
}

impl GmailPart {
    fn data(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| b.data.as_deref())
            .filter(|d| !d.is_empty())
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }
}

/// Gmail search query for the server-side filter, e.g.
/// `subject:"Rapport KPI" from:bot@acme.io`.
pub(super) fn search_query(config: &MailboxConfig) -> Option<String> {
    let mut terms = Vec::new();
    if let Some(subject) = &config.subject {
        terms.push(format!("subject:\"{subject}\""));
    }
    if let Some(from) = &config.from {
        terms.push(format!("from:{from}"));
    }
    (!terms.is_empty()).then(|| terms.join(" "))
}

pub(super) fn list_url(base: &str, config: &MailboxConfig) -> String {
    let mut url = format!("{base}/users/me/messages?maxResults={}", config.max_results);
    if let Some(q) = search_query(config) {
        url.push_str("&q=");
        url.push_str(&urlencoding::encode(&q));
    }
    url
}

pub(super) fn message_url(base: &str, id: &str) -> String {
    format!("{base}/users/me/messages/{}?format=full", urlencoding::encode(id))
}

pub(super) async fn fetch_messages(
    http: &dyn HttpFetcher,
    base: &str,
    token: &str,
    config: &MailboxConfig,
) -> Result<Vec<Email>, SourceError> {
    let mut headers = RequestHeaders::new();
    headers.insert("Authorization".into(), format!("Bearer {token}"));

    let url = list_url(base, config);
    let response = http.get(&url, &headers).await?.error_for_status(&url)?;
    let listing: GmailMessagesListResponse = serde_json::from_slice(&response.body)?;
    debug!(listed = listing.messages.len(), "gmail message ids listed");

    let mut emails = Vec::new();
    for message_ref in listing.messages.iter().take(config.max_results) {
        let url = message_url(base, &message_ref.id);
        let response = http.get(&url, &headers).await?.error_for_status(&url)?;
        let message: GmailMessage = serde_json::from_slice(&response.body)?;
        emails.push(to_email(message));
    }
    Ok(emails)
}

fn to_email(message: GmailMessage) -> Email {
    let body = select_body(&message);
    let payload = message.payload.unwrap_or_default();
    Email {
        id: message.id,
        subject: payload.header("Subject").unwrap_or_default().to_string(),
        from: payload.header("From").unwrap_or_default().to_string(),
        date: payload
            .header("Date")
            .map(str::to_string)
            .or(message.internal_date)
            .unwrap_or_default(),
        body,
        is_read: None,
    }
}

fn select_body(message: &GmailMessage) -> String {
    let Some(payload) = &message.payload else {
        return message.snippet.clone();
    };

    let mut html = None;
    for part in &payload.parts {
        let Some(data) = part.data() else { continue };
        match part.mime_type.as_deref() {
            Some("text/plain") => return decode_part(data),
            Some("text/html") => html = Some(data),
            _ => {}
        }
    }

    html.or_else(|| payload.data())
        .map(decode_part)
        .unwrap_or_else(|| message.snippet.clone())
}

/// Gmail part data is base64url, usually without padding.
fn decode_part(data: &str) -> String {
    match URL_SAFE_NO_PAD.decode(data.trim_end_matches('=')) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            debug!(error = %e, "undecodable gmail part");
            String::new()
        }
    }
}
