//! Source fetch orchestration.
//!
//! [`SourceFetcher::fetch_source_data`] validates one descriptor, records a
//! `running` step, dispatches to the matching connector and finalizes that
//! step to exactly one of `success`, `error` or `skipped`. Nothing escapes:
//! a `None` return means "read the last ledger step".

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, warn};

use cockpit_core::config::MailboxApiConfig;
use cockpit_core::{
    Config, ExecutionLedger, SourceData, SourceDescriptor, SourceError, SourceKind, StepIndex,
    StepStatus,
};

use crate::connectors::database::{run_query, PgExecutor, SqlExecutor};
use crate::connectors::spreadsheet::{fetch_spreadsheet, WorkbookParser, SPREADSHEET_GUIDANCE};
use crate::connectors::{api, csv, json as json_source, literal, FetchOutcome};
use crate::fallback::resolve_unclassified;
use crate::http::{HttpFetcher, ReqwestFetcher};
use crate::mailbox::MailboxConnector;
use crate::plan::SourcePlan;

/// Characters of `location` kept in the running step's details.
pub const LOCATION_PREVIEW_CHARS: usize = 50;

/// Entry point of the ingestion pipeline. Holds the I/O capabilities the
/// connectors need; cheap to clone.
#[derive(Clone)]
pub struct SourceFetcher {
    http: Arc<dyn HttpFetcher>,
    sql: Arc<dyn SqlExecutor>,
    workbooks: Option<Arc<dyn WorkbookParser>>,
    mailbox: MailboxApiConfig,
}

impl SourceFetcher {
    pub fn new(
        http: Arc<dyn HttpFetcher>,
        sql: Arc<dyn SqlExecutor>,
        mailbox: MailboxApiConfig,
    ) -> Self {
        Self {
            http,
            sql,
            workbooks: None,
            mailbox,
        }
    }

    /// reqwest for HTTP, sqlx for Postgres.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(ReqwestFetcher::new(&config.http)),
            Arc::new(PgExecutor::new(&config.database)),
            config.mailbox.clone(),
        )
    }

    /// Enable live `excel` sources. Without a parser they are skipped.
    pub fn with_workbook_parser(mut self, parser: Arc<dyn WorkbookParser>) -> Self {
        self.workbooks = Some(parser);
        self
    }

    /// Fetch one source, recording exactly one finalized step in `ledger`.
    pub async fn fetch_source_data(
        &self,
        source: Option<&SourceDescriptor>,
        ledger: &mut ExecutionLedger,
    ) -> Option<SourceData> {
        let (source, kind) = match validate(source) {
            Ok(valid) => valid,
            Err(e) => {
                warn!(error = %e, "rejecting source descriptor");
                let step = ledger.push("validate_source", "Validation de la source", None);
                ledger.finalize(step, StepStatus::Error, e.to_string(), None);
                return None;
            }
        };

        let step = ledger.push(
            format!("fetch_{}", kind.as_str()),
            format!("Récupération de la source « {} »", source.label()),
            Some(json!({
                "type": kind.as_str(),
                "name": source.name,
                "location": source.location().map(location_preview),
            })),
        );
        info!(source_type = kind.as_str(), source = source.label(), step, "fetching source");

        let outcome = match SourcePlan::from_descriptor(kind, source) {
            Ok(plan) => self.dispatch(plan, ledger, step).await,
            Err(e) => Err(e),
        };

        if ledger.is_terminal(step) {
            // The connector reported its own outcome (mailbox configuration).
            return None;
        }

        match outcome {
            Ok(FetchOutcome::Fetched(data)) => {
                let count = data.as_ref().map_or(0, SourceData::record_count);
                info!(source_type = kind.as_str(), step, records = count, "source fetched");
                ledger.finalize(
                    step,
                    StepStatus::Success,
                    format!("{count} enregistrement(s) récupéré(s)"),
                    Some(json!({ "recordCount": count })),
                );
                data
            }
            Ok(FetchOutcome::Skipped(guidance)) => {
                warn!(source_type = kind.as_str(), step, "source skipped");
                ledger.finalize(step, StepStatus::Skipped, guidance, None);
                None
            }
            Err(e) => {
                warn!(source_type = kind.as_str(), step, error = %e, "source fetch failed");
                ledger.finalize(
                    step,
                    StepStatus::Error,
                    e.to_string(),
                    Some(json!({ "type": kind.as_str() })),
                );
                None
            }
        }
    }

    async fn dispatch(
        &self,
        plan: SourcePlan,
        ledger: &mut ExecutionLedger,
        step: StepIndex,
    ) -> Result<FetchOutcome, SourceError> {
        let http = self.http.as_ref();
        let data = match plan {
            SourcePlan::Rest(rest) => api::fetch_rest(http, &rest).await?,
            SourcePlan::Json { url } => json_source::fetch_json(http, &url).await?,
            SourcePlan::Csv { url } => csv::fetch_csv(http, &url).await?,
            SourcePlan::Spreadsheet { url, fields } => match (&self.workbooks, url) {
                (Some(parser), Some(url)) => {
                    fetch_spreadsheet(http, parser.as_ref(), &url, fields.as_deref()).await?
                }
                _ => return Ok(FetchOutcome::Skipped(SPREADSHEET_GUIDANCE.to_string())),
            },
            SourcePlan::Database(db) => run_query(self.sql.as_ref(), &db).await?,
            SourcePlan::Mailbox(mailbox) => {
                MailboxConnector::new(http, &self.mailbox)
                    .fetch(&mailbox, ledger, step)
                    .await?
            }
            SourcePlan::Literal(plan) => return Ok(literal::resolve_literal(&plan)),
            SourcePlan::Unclassified(plan) => return Ok(resolve_unclassified(&plan)),
        };
        Ok(FetchOutcome::Fetched(data))
    }
}

fn validate(
    source: Option<&SourceDescriptor>,
) -> Result<(&SourceDescriptor, SourceKind), SourceError> {
    let source = source.ok_or_else(|| SourceError::Validation("source non définie".into()))?;
    let kind = source
        .kind()
        .ok_or_else(|| SourceError::Validation("type de source manquant".into()))?;
    Ok((source, kind))
}

fn location_preview(location: &str) -> Value {
    Value::String(location.chars().take(LOCATION_PREVIEW_CHARS).collect())
}
