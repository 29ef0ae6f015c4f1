//! Spreadsheet connector.
//!
//! Binary parsing is delegated to a [`WorkbookParser`]; this module only
//! fetches the file and picks the sheet. `excel` descriptors are still
//! soft-skipped by the orchestrator, so this path is for callers that
//! bring their own parser.

use serde_json::Value;

use cockpit_core::{SourceData, SourceError};

use crate::http::{HttpFetcher, RequestHeaders};

/// Guidance shown when an `excel` source is skipped.
pub const SPREADSHEET_GUIDANCE: &str =
    "Import Excel non supporté en direct: exportez la feuille en CSV ou exposez-la via une API";

/// One named sheet, already converted to row objects keyed by header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Value>,
}

/// Parsed workbook; sheets in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// The sheet named by a `sheet:<name>` token in `fields`, or the
    /// first sheet when there is no token or no sheet by that name.
    pub fn select(&self, fields: Option<&str>) -> Option<&Sheet> {
        requested_sheet(fields)
            .and_then(|name| self.sheets.iter().find(|s| s.name == name))
            .or_else(|| self.sheets.first())
    }
}

/// Turns raw spreadsheet bytes into sheets of row objects.
pub trait WorkbookParser: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<Workbook, SourceError>;
}

pub async fn fetch_spreadsheet(
    http: &dyn HttpFetcher,
    parser: &dyn WorkbookParser,
    url: &str,
    fields: Option<&str>,
) -> Result<Option<SourceData>, SourceError> {
    let response = http
        .get(url, &RequestHeaders::new())
        .await?
        .error_for_status(url)?;
    let workbook = parser.parse(&response.body)?;
    let rows = workbook
        .select(fields)
        .map(|sheet| sheet.rows.clone())
        .unwrap_or_default();
    Ok(Some(SourceData::Records(rows)))
}

/// Extract `<name>` from a `sheet:<name>` token. The name runs until the
/// next comma.
fn requested_sheet(fields: Option<&str>) -> Option<&str> {
    let fields = fields?;
    let start = fields.find("sheet:")? + "sheet:".len();
    let rest = &fields[start..];
    let name = rest.split(',').next().unwrap_or(rest).trim();
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeFetcher;
    use serde_json::json;

    struct StaticParser(Workbook);

    impl WorkbookParser for StaticParser {
        fn parse(&self, _bytes: &[u8]) -> Result<Workbook, SourceError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenParser;

    impl WorkbookParser for BrokenParser {
        fn parse(&self, _bytes: &[u8]) -> Result<Workbook, SourceError> {
            Err(SourceError::Spreadsheet("not a zip archive".into()))
        }
    }

    fn workbook() -> Workbook {
        Workbook {
            sheets: vec![
                Sheet {
                    name: "Synthèse".into(),
                    rows: vec![json!({"kpi": "dispo", "value": 99})],
                },
                Sheet {
                    name: "Détail".into(),
                    rows: vec![json!({"site": "Lyon"}), json!({"site": "Nantes"})],
                },
            ],
        }
    }

    #[test]
    fn test_requested_sheet() {
        assert_eq!(requested_sheet(Some("sheet:Détail")), Some("Détail"));
        assert_eq!(requested_sheet(Some("a,sheet: Détail ,b")), Some("Détail"));
        assert_eq!(requested_sheet(Some("a,b")), None);
        assert_eq!(requested_sheet(Some("sheet:")), None);
        assert_eq!(requested_sheet(None), None);
    }

    #[test]
    fn test_select_named_or_first() {
        let wb = workbook();
        assert_eq!(wb.select(Some("sheet:Détail")).unwrap().name, "Détail");
        assert_eq!(wb.select(Some("sheet:Inconnue")).unwrap().name, "Synthèse");
        assert_eq!(wb.select(None).unwrap().name, "Synthèse");
        assert!(Workbook::default().select(None).is_none());
    }

    #[tokio::test]
    async fn test_fetch_selected_sheet() {
        let url = "https://files.example.com/report.xlsx";
        let http = FakeFetcher::new().route(url, 200, vec![0x50u8, 0x4b, 0x03, 0x04]);
        let parser = StaticParser(workbook());

        let data = fetch_spreadsheet(&http, &parser, url, Some("sheet:Détail"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(data.record_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_workbook_yields_no_rows() {
        let url = "https://files.example.com/empty.xlsx";
        let http = FakeFetcher::new().route(url, 200, vec![0u8]);
        let parser = StaticParser(Workbook::default());
        let data = fetch_spreadsheet(&http, &parser, url, None).await.unwrap();
        assert_eq!(data, Some(SourceData::Records(vec![])));
    }

    #[tokio::test]
    async fn test_parser_failure_propagates() {
        let url = "https://files.example.com/broken.xlsx";
        let http = FakeFetcher::new().route(url, 200, vec![1u8, 2, 3]);
        let err = fetch_spreadsheet(&http, &BrokenParser, url, None)
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Spreadsheet(_)));
    }
}
