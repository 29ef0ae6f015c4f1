use serde_json::Value;

use cockpit_core::SourceData;

use super::FetchOutcome;
use crate::plan::LiteralPlan;

pub const LITERAL_GUIDANCE: &str =
    "Aucune donnée statique: renseignez config.data ou un JSON valide dans le champ fields";

/// Manual/static sources: `config.data` first, then `fields` as JSON.
pub fn resolve_literal(plan: &LiteralPlan) -> FetchOutcome {
    if let Some(data) = &plan.data {
        return FetchOutcome::Fetched(SourceData::from_json(data.clone()));
    }
    match plan
        .raw
        .as_deref()
        .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
    {
        Some(value) => FetchOutcome::Fetched(SourceData::from_json(value)),
        None => FetchOutcome::Skipped(LITERAL_GUIDANCE.to_string()),
    }
}
