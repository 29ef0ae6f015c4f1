use cockpit_core::{SourceData, SourceError};

use crate::http::{HttpFetcher, RequestHeaders};

/// Plain GET + JSON decode. No auth headers, no field projection.
pub async fn fetch_json(http: &dyn HttpFetcher, url: &str) -> Result<Option<SourceData>, SourceError> {
    let response = http
        .get(url, &RequestHeaders::new())
        .await?
        .error_for_status(url)?;
    Ok(SourceData::from_json(response.json()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeFetcher;
    use serde_json::json;

    const URL: &str = "https://static.example.com/kpi.json";

    #[tokio::test]
    async fn test_fetch_json_document() {
        let http = FakeFetcher::new().route(URL, 200, r#"{"sla": 99.2}"#);
        let data = fetch_json(&http, URL).await.unwrap();
        assert_eq!(data, Some(SourceData::Record(json!({"sla": 99.2}))));
        assert!(http.headers_for(URL).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_null_document_is_no_data() {
        let http = FakeFetcher::new().route(URL, 200, "null");
        assert_eq!(fetch_json(&http, URL).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_not_found() {
        let http = FakeFetcher::new().route(URL, 404, "");
        let err = fetch_json(&http, URL).await.unwrap_err();
        assert!(matches!(err, SourceError::Http { status: 404, .. }));
    }
}
