//! CSV connector.
//!
//! The parser is naive: cells are split on every comma and quoted fields
//! containing commas are NOT supported. Such values shift the following
//! columns.

use serde_json::{Map, Value};

use cockpit_core::{SourceData, SourceError};

use crate::http::{HttpFetcher, RequestHeaders};

pub async fn fetch_csv(http: &dyn HttpFetcher, url: &str) -> Result<Option<SourceData>, SourceError> {
    let response = http
        .get(url, &RequestHeaders::new())
        .await?
        .error_for_status(url)?;
    Ok(Some(SourceData::Records(parse_csv(&response.text()))))
}

/// First non-blank line is the header row; every following line becomes a
/// record keyed by header. Short rows are padded with `""`, extra cells
/// are dropped.
pub fn parse_csv(text: &str) -> Vec<Value> {
    let mut lines = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty());

    let Some(header_line) = lines.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header_line.split(',').map(clean_cell).collect();

    lines
        .map(|line| {
            let mut cells = line.split(',').map(clean_cell);
            let mut row = Map::with_capacity(headers.len());
            for header in &headers {
                let cell = cells.next().unwrap_or_default();
                row.insert(header.clone(), Value::String(cell));
            }
            Value::Object(row)
        })
        .collect()
}

fn clean_cell(cell: &str) -> String {
    cell.trim().trim_matches('"').to_string()
}
