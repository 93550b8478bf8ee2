use anyhow::{bail, Result};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{info, instrument};

use crate::store::{read_json, write_json_atomic};

/// Drop every key listed in `excluded` from each record, keeping key order.
///
/// Returns the pruned records and the number of fields removed. Fails if the
/// document is not an array of objects.
pub fn prune_records(doc: Value, excluded: &[&str]) -> Result<(Vec<Map<String, Value>>, usize)> {
    let items = match doc {
        Value::Array(items) => items,
        other => bail!("expected a JSON array of records, found {}", kind_of(&other)),
    };

    let mut removed = 0;
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        let record = match item {
            Value::Object(record) => record,
            other => bail!("record {} is {}, not an object", i, kind_of(&other)),
        };
        let before = record.len();
        let kept: Map<String, Value> = record
            .into_iter()
            .filter(|(k, _)| !excluded.contains(&k.as_str()))
            .collect();
        removed += before - kept.len();
        out.push(kept);
    }
    Ok((out, removed))
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Prune the records in the JSON file at `path`, rewriting it in place.
#[instrument(level = "info", skip(excluded))]
pub fn prune_file(path: &Path, excluded: &[&str]) -> Result<usize> {
    let doc: Value = read_json(path)?;
    let (records, removed) = prune_records(doc, excluded)?;
    write_json_atomic(path, &records)?;
    info!(records = records.len(), removed, "pruned {}", path.display());
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EXCLUDED_FIELDS;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn sample() -> Value {
        json!([
            {"Location": "Italy", "OpenDate": "Apr", "Cost": 1200, "Bike Hire": "yes", "Notes": ""},
            {"Location": "NZ", "Campground": 35, "CamperMon": "", "DuoAccom": 80,
             "CloseMonth": "Oct", "OtherCost": 1, "CamperCity": "x", "CarHire": 2},
            {"Location": "Japan"}
        ])
    }

    #[test]
    fn test_excluded_fields_are_gone_and_others_kept() {
        let (out, removed) = prune_records(sample(), EXCLUDED_FIELDS).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(removed, 9);
        for rec in &out {
            for f in EXCLUDED_FIELDS {
                assert!(!rec.contains_key(*f));
            }
        }
        let keys: Vec<_> = out[0].keys().cloned().collect();
        assert_eq!(keys, vec!["Location", "Cost", "Notes"]);
        assert_eq!(out[0]["Cost"], json!(1200));
        assert_eq!(Value::Object(out[2].clone()), json!({"Location": "Japan"}));
    }

    #[test]
    fn test_prune_is_idempotent() {
        let (once, _) = prune_records(sample(), EXCLUDED_FIELDS).unwrap();
        let again = Value::Array(once.iter().cloned().map(Value::Object).collect());
        let (twice, removed) = prune_records(again, EXCLUDED_FIELDS).unwrap();
        assert_eq!(once, twice);
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_shape_errors() {
        assert!(prune_records(json!({"Location": "Italy"}), EXCLUDED_FIELDS).is_err());
        let err = prune_records(json!([{"a": 1}, 5]), EXCLUDED_FIELDS).unwrap_err();
        assert!(err.to_string().contains("record 1 is a number"));
    }

    #[test]
    fn test_prune_file_rewrites_in_place() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("locations.json");
        fs::write(&path, serde_json::to_string(&sample()).unwrap()).unwrap();

        assert_eq!(prune_file(&path, EXCLUDED_FIELDS).unwrap(), 3);
        let first = fs::read_to_string(&path).unwrap();
        assert!(!first.contains("OpenDate"));
        assert!(first.starts_with("[\n  {\n    \"Location\": \"Italy\""));

        prune_file(&path, EXCLUDED_FIELDS).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), first);
    }

    #[test]
    fn test_prune_file_malformed_leaves_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("locations.json");
        fs::write(&path, "[{\"Location\": ").unwrap();
        assert!(prune_file(&path, EXCLUDED_FIELDS).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "[{\"Location\": ");
    }
}
