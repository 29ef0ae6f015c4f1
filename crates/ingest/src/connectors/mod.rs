//! Per-kind fetch routines.
//!
//! Each connector performs its own I/O and returns either data or a
//! [`SourceError`](cockpit_core::SourceError); the orchestrator turns the
//! result into a ledger step.

pub mod api;
pub mod csv;
pub mod database;
pub mod json;
pub mod literal;
pub mod spreadsheet;

use cockpit_core::SourceData;

/// Result of a connector that completed without raising.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Data was resolved (`None` when the source legitimately returned nothing).
    Fetched(Option<SourceData>),
    /// Deliberately not fetched. The reason is shown to the user as guidance.
    Skipped(String),
}
