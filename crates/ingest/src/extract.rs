//! Field projection over fetched records.
//!
//! A spec such as `"id, owner.name"` keeps only the listed fields of each
//! record. Dotted names walk nested objects; output keys keep the dotted
//! name as written. A path that does not resolve yields `null` instead of
//! failing.

use serde_json::{Map, Value};

use cockpit_core::SourceData;

/// Parsed comma-separated field list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSpec {
    fields: Vec<String>,
}

impl FieldSpec {
    pub fn parse(spec: &str) -> Self {
        Self {
            fields: spec
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Project a single record. Non-object records project every field to `null`.
    pub fn project(&self, record: &Value) -> Value {
        let mut out = Map::with_capacity(self.fields.len());
        for field in &self.fields {
            let value = resolve_path(record, field).cloned().unwrap_or(Value::Null);
            out.insert(field.clone(), value);
        }
        Value::Object(out)
    }

    /// Apply the projection to connector output. Sequences are projected
    /// element by element; raw text has nothing to project.
    pub fn apply(&self, data: SourceData) -> SourceData {
        if self.is_empty() {
            return data;
        }
        match data {
            SourceData::Records(items) => {
                SourceData::Records(items.iter().map(|item| self.project(item)).collect())
            }
            SourceData::Record(record) => SourceData::Record(self.project(&record)),
            text @ SourceData::Text(_) => text,
        }
    }
}

/// Convenience wrapper: parse `spec` and apply it.
pub fn extract(data: SourceData, spec: &str) -> SourceData {
    FieldSpec::parse(spec).apply(data)
}

/// Walk a dotted path. Numeric segments index into arrays.
pub fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, key| match current {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_trims_and_drops_empty_names() {
        let spec = FieldSpec::parse(" a , b.c ,, ");
        assert_eq!(spec.fields(), &["a".to_string(), "b.c".to_string()]);
        assert!(FieldSpec::parse("").is_empty());
        assert!(FieldSpec::parse(" , ").is_empty());
    }

    #[test]
    fn test_empty_spec_returns_data_unchanged() {
        let data = SourceData::Record(json!({"a": 1, "b": 2}));
        assert_eq!(extract(data.clone(), ""), data);
    }

    #[test]
    fn test_sequence_projection() {
        let data = SourceData::Records(vec![json!({"a": 1, "b": 2}), json!({"a": 3, "b": 4})]);
        assert_eq!(
            extract(data, "a"),
            SourceData::Records(vec![json!({"a": 1}), json!({"a": 3})])
        );
    }

    #[test]
    fn test_dotted_path_keeps_dotted_key() {
        let data = SourceData::Record(json!({"x": {"y": 5}}));
        assert_eq!(extract(data, "x.y"), SourceData::Record(json!({"x.y": 5})));
    }

    #[test]
    fn test_missing_path_yields_null() {
        let data = SourceData::Record(json!({"x": {}}));
        assert_eq!(extract(data, "x.y"), SourceData::Record(json!({"x.y": null})));

        let data = SourceData::Record(json!({"x": 3}));
        assert_eq!(extract(data, "x.y.z"), SourceData::Record(json!({"x.y.z": null})));
    }

    #[test]
    fn test_leaf_value_is_not_flattened() {
        let data = SourceData::Record(json!({"owner": {"name": "Ops", "tags": ["a", "b"]}}));
        assert_eq!(
            extract(data, "owner"),
            SourceData::Record(json!({"owner": {"name": "Ops", "tags": ["a", "b"]}}))
        );
    }

    #[test]
    fn test_array_index_segments() {
        let record = json!({"items": [{"name": "first"}, {"name": "second"}]});
        assert_eq!(resolve_path(&record, "items.1.name"), Some(&json!("second")));
        assert_eq!(resolve_path(&record, "items.9.name"), None);
    }

    #[test]
    fn test_text_is_left_alone() {
        let data = SourceData::Text("raw body".into());
        assert_eq!(extract(data.clone(), "a"), data);
    }

    #[test]
    fn test_scalar_elements_project_to_null() {
        let data = SourceData::Records(vec![json!(1), json!({"a": 2})]);
        assert_eq!(
            extract(data, "a"),
            SourceData::Records(vec![json!({"a": null}), json!({"a": 2})])
        );
    }
}
