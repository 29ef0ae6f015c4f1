//! REST connector. Also serves the monitoring kinds (supervision,
//! hypervision, observability), which share its contract.

use tracing::debug;

use cockpit_core::{SourceData, SourceError};

use crate::http::HttpFetcher;
use crate::plan::RestPlan;

/// GET the plan's URL with its auth headers, decode JSON, then project
/// `fields` when a spec was given.
pub async fn fetch_rest(
    http: &dyn HttpFetcher,
    plan: &RestPlan,
) -> Result<Option<SourceData>, SourceError> {
    debug!(
        url = %plan.url,
        headers = plan.auth.headers().len(),
        "fetching REST source"
    );
    let response = http
        .get(&plan.url, plan.auth.headers())
        .await?
        .error_for_status(&plan.url)?;
    let body = response.json()?;
    Ok(SourceData::from_json(body).map(|data| plan.fields.apply(data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::FieldSpec;
    use crate::plan::HttpAuth;
    use crate::testing::FakeFetcher;
    use serde_json::json;

    const URL: &str = "https://helpdesk.example.com/api/tickets";

    fn plan(connection: Option<&str>, fields: &str) -> RestPlan {
        RestPlan {
            url: URL.into(),
            auth: HttpAuth::parse(connection),
            fields: FieldSpec::parse(fields),
        }
    }

    #[tokio::test]
    async fn test_fetch_and_project() {
        let http = FakeFetcher::new().route(
            URL,
            200,
            r#"[{"id": 1, "status": "open", "owner": {"team": "N1"}}, {"id": 2, "status": "closed", "owner": {"team": "N2"}}]"#,
        );

        let data = fetch_rest(&http, &plan(None, "id, owner.team")).await.unwrap();
        assert_eq!(
            data,
            Some(SourceData::Records(vec![
                json!({"id": 1, "owner.team": "N1"}),
                json!({"id": 2, "owner.team": "N2"}),
            ]))
        );
    }

    #[tokio::test]
    async fn test_sends_bearer_from_api_key() {
        let http = FakeFetcher::new().route(URL, 200, r#"{"open": 4}"#);
        let data = fetch_rest(&http, &plan(Some(r#"{"apiKey":"k-9"}"#), ""))
            .await
            .unwrap();
        assert_eq!(data, Some(SourceData::Record(json!({"open": 4}))));

        let headers = http.headers_for(URL).unwrap();
        assert_eq!(headers["Authorization"], "Bearer k-9");
        assert_eq!(headers["Content-Type"], "application/json");
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let http = FakeFetcher::new().route(URL, 401, "unauthorized");
        let err = fetch_rest(&http, &plan(None, "")).await.unwrap_err();
        assert!(matches!(err, SourceError::Http { status: 401, .. }));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let http = FakeFetcher::new().route(URL, 200, "<html>maintenance</html>");
        let err = fetch_rest(&http, &plan(None, "")).await.unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let http = FakeFetcher::new();
        let err = fetch_rest(&http, &plan(None, "")).await.unwrap_err();
        assert!(matches!(err, SourceError::Network(_)));
    }
}
