//! Custom JSON mail endpoint.
//!
//! The response may be a bare array or an object wrapping the list under
//! `emails`, `messages` or `data`. Anything else is read as one message.

use serde_json::Value;
use tracing::debug;

use cockpit_core::SourceError;

use super::Email;
use crate::http::{HttpFetcher, RequestHeaders};

const LIST_KEYS: [&str; 3] = ["emails", "messages", "data"];

pub(super) async fn fetch_messages(
    http: &dyn HttpFetcher,
    api_url: &str,
    token: &str,
) -> Result<Vec<Email>, SourceError> {
    let mut headers = RequestHeaders::new();
    headers.insert("Authorization".into(), format!("Bearer {token}"));
    headers.insert("Content-Type".into(), "application/json".into());

    let response = http.get(api_url, &headers).await?.error_for_status(api_url)?;
    let emails: Vec<Email> = message_list(response.json()?)
        .iter()
        .enumerate()
        .map(|(i, item)| to_email(i, item))
        .collect();
    debug!(count = emails.len(), "custom mail endpoint fetched");
    Ok(emails)
}

fn message_list(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            for key in LIST_KEYS {
                if let Some(Value::Array(items)) = map.remove(key) {
                    return items;
                }
            }
            vec![Value::Object(map)]
        }
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn first_str(item: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| match item.get(*k)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}

fn to_email(index: usize, item: &Value) -> Email {
    if let Value::String(text) = item {
        return Email {
            id: index.to_string(),
            body: text.clone(),
            ..Email::default()
        };
    }

    let id = first_str(item, &["id", "messageId"]);
    Email {
        id: if id.is_empty() { index.to_string() } else { id },
        subject: first_str(item, &["subject"]),
        from: first_str(item, &["from", "sender"]),
        body: first_str(item, &["body", "content", "text", "html"]),
        date: first_str(item, &["date", "receivedAt", "receivedDateTime"]),
        is_read: item.get("isRead").and_then(Value::as_bool),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeFetcher;
    use serde_json::json;

    const URL: &str = "https://mail.acme.io/api/messages";

    #[test]
    fn test_list_shapes() {
        assert_eq!(message_list(json!([1, 2])).len(), 2);
        assert_eq!(message_list(json!({"messages": [{}, {}, {}]})).len(), 3);
        assert_eq!(message_list(json!({"data": []})).len(), 0);
        assert_eq!(message_list(json!({"id": "solo"})), vec![json!({"id": "solo"})]);
        assert!(message_list(Value::Null).is_empty());
    }

    #[test]
    fn test_alternate_keys() {
        let email = to_email(
            0,
            &json!({
                "messageId": 77,
                "subject": "Alerte",
                "sender": "nagios@acme.io",
                "content": "CPU 93%",
                "receivedAt": "2026-10-02T10:00:00Z",
                "isRead": false
            }),
        );
        assert_eq!(email.id, "77");
        assert_eq!(email.from, "nagios@acme.io");
        assert_eq!(email.body, "CPU 93%");
        assert_eq!(email.date, "2026-10-02T10:00:00Z");
        assert_eq!(email.is_read, Some(false));
    }

    #[test]
    fn test_string_item_becomes_body() {
        let email = to_email(3, &json!("Total: 12"));
        assert_eq!(email.id, "3");
        assert_eq!(email.body, "Total: 12");
        assert_eq!(email.subject, "");
    }

    #[tokio::test]
    async fn test_sends_bearer_token() {
        let http = FakeFetcher::new().route(URL, 200, r#"{"emails": [{"id": "a", "body": "x"}]}"#);
        let emails = fetch_messages(&http, URL, "secret").await.unwrap();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].id, "a");
        assert_eq!(http.headers_for(URL).unwrap()["Authorization"], "Bearer secret");
    }

    #[tokio::test]
    async fn test_server_error_propagates() {
        let http = FakeFetcher::new().route(URL, 503, "unavailable");
        let err = fetch_messages(&http, URL, "t").await.unwrap_err();
        assert!(matches!(err, SourceError::Http { status: 503, .. }));
    }
}
