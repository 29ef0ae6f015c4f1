//! Microsoft Graph mail path: one call, newest messages first.

use serde::Deserialize;
use tracing::debug;

use cockpit_core::SourceError;

use super::{Email, MailboxConfig};
use crate::http::{HttpFetcher, RequestHeaders};

#[derive(Debug, Deserialize)]
struct GraphMessages {
    #[serde(default)]
    value: Vec<GraphMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphMessage {
    #[serde(default)]
    id: String,
    subject: Option<String>,
    from: Option<GraphRecipient>,
    body: Option<GraphBody>,
    body_preview: Option<String>,
    received_date_time: Option<String>,
    is_read: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphRecipient {
    email_address: Option<GraphAddress>,
}

#[derive(Debug, Deserialize)]
struct GraphAddress {
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphBody {
    content: Option<String>,
}

impl From<GraphMessage> for Email {
    fn from(m: GraphMessage) -> Self {
        let body = m
            .body
            .and_then(|b| b.content)
            .filter(|c| !c.is_empty())
            .or(m.body_preview)
            .unwrap_or_default();
        Email {
            id: m.id,
            subject: m.subject.unwrap_or_default(),
            from: m
                .from
                .and_then(|f| f.email_address)
                .and_then(|a| a.address)
                .unwrap_or_default(),
            body,
            date: m.received_date_time.unwrap_or_default(),
            is_read: m.is_read,
        }
    }
}

pub(super) fn messages_url(base: &str, folder: &str, top: usize) -> String {
    format!(
        "{base}/me/mailFolders/{}/messages?$top={top}&$orderby=receivedDateTime%20desc",
        urlencoding::encode(folder)
    )
}

pub(super) async fn fetch_messages(
    http: &dyn HttpFetcher,
    base: &str,
    token: &str,
    config: &MailboxConfig,
) -> Result<Vec<Email>, SourceError> {
    let url = messages_url(base, &config.folder, config.max_results);
    let mut headers = RequestHeaders::new();
    headers.insert("Authorization".into(), format!("Bearer {token}"));
    headers.insert("Content-Type".into(), "application/json".into());

    let response = http.get(&url, &headers).await?.error_for_status(&url)?;
    let page: GraphMessages = serde_json::from_slice(&response.body)?;
    debug!(count = page.value.len(), folder = %config.folder, "graph messages fetched");
    Ok(page.value.into_iter().map(Email::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeFetcher;

    const BASE: &str = "https://graph.microsoft.com/v1.0";

    #[test]
    fn test_messages_url() {
        assert_eq!(
            messages_url(BASE, "inbox", 10),
            "https://graph.microsoft.com/v1.0/me/mailFolders/inbox/messages?$top=10&$orderby=receivedDateTime%20desc"
        );
        assert!(messages_url(BASE, "Boîte KPI", 5).contains("/mailFolders/Bo%C3%AEte%20KPI/"));
    }

    #[tokio::test]
    async fn test_maps_graph_messages() {
        let url = messages_url(BASE, "inbox", 2);
        let http = FakeFetcher::new().route(
            &url,
            200,
            r#"{"value": [
                {"id": "AAMk1", "subject": "KPI", "from": {"emailAddress": {"address": "bot@corp.com", "name": "Bot"}},
                 "body": {"contentType": "html", "content": "<p>Total: 3</p>"}, "bodyPreview": "Total: 3",
                 "receivedDateTime": "2026-10-01T07:00:00Z", "isRead": true},
                {"id": "AAMk2", "subject": "Sans corps", "bodyPreview": "aperçu", "body": {"content": ""}}
            ]}"#,
        );
        let config = MailboxConfig {
            max_results: 2,
            ..MailboxConfig::default()
        };

        let emails = fetch_messages(&http, BASE, "tok", &config).await.unwrap();
        assert_eq!(emails.len(), 2);
        assert_eq!(emails[0].id, "AAMk1");
        assert_eq!(emails[0].from, "bot@corp.com");
        assert_eq!(emails[0].body, "<p>Total: 3</p>");
        assert_eq!(emails[0].date, "2026-10-01T07:00:00Z");
        assert_eq!(emails[0].is_read, Some(true));
        assert_eq!(emails[1].body, "aperçu");
        assert_eq!(emails[1].from, "");

        let headers = http.headers_for(&url).unwrap();
        assert_eq!(headers["Authorization"], "Bearer tok");
    }

    #[tokio::test]
    async fn test_expired_token_is_http_error() {
        let url = messages_url(BASE, "inbox", 10);
        let http = FakeFetcher::new().route(&url, 401, r#"{"error": {"code": "InvalidAuthenticationToken"}}"#);
        let err = fetch_messages(&http, BASE, "old", &MailboxConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Http { status: 401, .. }));
    }
}
