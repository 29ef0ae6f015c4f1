//! Multi-source data ingestion for cockpit indicators.
//!
//! A [`SourceDescriptor`](cockpit_core::SourceDescriptor) goes in, optional
//! [`SourceData`](cockpit_core::SourceData) comes out, and every attempt is
//! recorded in an [`ExecutionLedger`](cockpit_core::ExecutionLedger).
//! Connectors cover REST/JSON/CSV over HTTP, read-only SQL, mailboxes
//! (Microsoft Graph, Gmail, custom endpoints) and literal or free-text
//! sources.

pub mod connectors;
pub mod extract;
pub mod fallback;
pub mod http;
pub mod mailbox;
pub mod orchestrator;
pub mod plan;

#[cfg(test)]
mod testing;

pub use connectors::database::{PgExecutor, SqlExecutor};
pub use connectors::spreadsheet::{Sheet, Workbook, WorkbookParser};
pub use connectors::FetchOutcome;
pub use extract::{extract, FieldSpec};
pub use http::{HttpFetcher, HttpResponse, ReqwestFetcher, RequestHeaders};
pub use orchestrator::SourceFetcher;
pub use plan::SourcePlan;
