// src/seasons.rs

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{collections::HashMap, path::Path};
use tracing::{info, instrument};

use crate::month::Month;
use crate::store::{read_json, write_json_atomic};
use crate::table::Table;

/// Location column plus one column per month.
pub const SEASON_COLUMNS: usize = 13;

/// Seasonal quality of one location in one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonRecord {
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Month")]
    pub month: String,
    #[serde(rename = "Quality")]
    pub quality: String,
}

impl SeasonRecord {
    pub fn new(location: impl Into<String>, month: Month, quality: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            month: month.as_str().to_string(),
            quality: quality.into(),
        }
    }
}

/// Wide seasons table → one record per (location, month).
///
/// Columns after the thirteenth are ignored and the header text is not
/// consulted: column 0 is the location, columns 1..=12 are Jan..Dec.
/// Returns `None` when the table is too narrow to be a seasons table.
pub fn melt(table: &Table) -> Option<Vec<SeasonRecord>> {
    if table.width() < SEASON_COLUMNS {
        return None;
    }
    let mut out = Vec::with_capacity(table.len() * Month::ALL.len());
    for row in table.rows() {
        let location = &row[0];
        for month in Month::ALL {
            out.push(SeasonRecord::new(
                location.clone(),
                month,
                row[1 + month.index()].clone(),
            ));
        }
    }
    Some(out)
}

/* ───────────────────────────── backfill ───────────────────────────── */

type Labels = [&'static str; 12];

const TEMPERATE: Labels = [
    "Winter", "Winter", "Spring", "Spring", "Spring", "Summer", "Summer", "Summer", "Autumn",
    "Autumn", "Autumn", "Winter",
];

/// Estimated seasons for locations the spreadsheet leaves blank, Jan..Dec.
pub static BACKFILL_TABLE: &[(&str, Labels)] = &[
    ("France", TEMPERATE),
    ("Romania", TEMPERATE),
    ("Hungary", TEMPERATE),
    ("Japan", TEMPERATE),
    (
        "California",
        [
            "Mild Winter",
            "Mild Winter",
            "Spring",
            "Spring",
            "Spring",
            "Summer",
            "Summer",
            "Summer",
            "Autumn",
            "Autumn",
            "Autumn",
            "Mild Winter",
        ],
    ),
    (
        "Vietnam",
        [
            "Winter", "Spring", "Spring", "Spring", "Summer", "Monsoon", "Monsoon", "Monsoon",
            "Monsoon", "Autumn", "Autumn", "Winter",
        ],
    ),
    ("Mexico", TEMPERATE),
    ("Baltics", TEMPERATE),
    ("Italy", TEMPERATE),
    ("Greece", TEMPERATE),
    // southern hemisphere
    (
        "NZ",
        [
            "Summer", "Summer", "Autumn", "Autumn", "Autumn", "Winter", "Winter", "Winter",
            "Spring", "Spring", "Spring", "Summer",
        ],
    ),
    // events have no season
    ("Events", [""; 12]),
];

static BACKFILL_INDEX: Lazy<HashMap<&'static str, &'static Labels>> =
    Lazy::new(|| BACKFILL_TABLE.iter().map(|(loc, l)| (*loc, l)).collect());

/// Estimated label for `location` in `month`.
///
/// `Ok(None)` when the location has no estimate; an error when it has one
/// but `month` is not a month abbreviation.
pub fn lookup(location: &str, month: &str) -> Result<Option<&'static str>> {
    let Some(labels) = BACKFILL_INDEX.get(location) else {
        return Ok(None);
    };
    let month: Month = month
        .parse()
        .with_context(|| format!("backfill lookup for {location}"))?;
    Ok(Some(labels[month.index()]))
}

pub fn is_known_location(location: &str) -> bool {
    BACKFILL_INDEX.contains_key(location)
}

/// Counts reported after a backfill pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub total: usize,
    /// Labels written during this pass.
    pub filled: usize,
    /// Records with a known location and a non-empty label after the pass,
    /// whether filled now or already present.
    pub known_non_empty: usize,
}

fn field<'a>(rec: &'a Map<String, Value>, key: &str, i: usize) -> Result<&'a Value> {
    rec.get(key)
        .ok_or_else(|| anyhow!("season record {i} has no {key:?} field"))
}

fn is_empty_label(v: &Value) -> bool {
    v.as_str() == Some("")
}

/// Fill every `Quality` that is exactly `""` on a record whose location has
/// an estimate.
///
/// Records are edited in place, so key order and every other value stay as
/// read. Only `Quality` of a matching record is ever replaced. On error
/// `records` may be partly filled; callers that persist must discard them.
pub fn backfill(records: &mut [Map<String, Value>]) -> Result<BackfillReport> {
    let mut filled = 0;
    for (i, rec) in records.iter_mut().enumerate() {
        let Some(location) = field(rec, "Location", i)?.as_str() else {
            continue;
        };
        if !is_known_location(location) || !is_empty_label(field(rec, "Quality", i)?) {
            continue;
        }
        let month = field(rec, "Month", i)?
            .as_str()
            .ok_or_else(|| anyhow!("season record {i}: Month is not a string"))?;
        let label = lookup(location, month)
            .with_context(|| format!("season record {i}"))?
            .unwrap_or_default();
        if !label.is_empty() {
            filled += 1;
            rec.insert("Quality".to_string(), Value::String(label.to_string()));
        }
    }

    let known_non_empty = records
        .iter()
        .filter(|r| {
            r.get("Location")
                .and_then(Value::as_str)
                .is_some_and(is_known_location)
                && !r.get("Quality").is_some_and(is_empty_label)
        })
        .count();

    Ok(BackfillReport {
        total: records.len(),
        filled,
        known_non_empty,
    })
}

/// Backfill the seasons file at `path` in place.
#[instrument(level = "info")]
pub fn backfill_file(path: &Path) -> Result<BackfillReport> {
    let mut records: Vec<Map<String, Value>> = read_json(path)?;
    let report =
        backfill(&mut records).with_context(|| format!("backfilling {}", path.display()))?;
    write_json_atomic(path, &records)?;

    info!(
        total = report.total,
        filled = report.filled,
        "season data updated"
    );
    info!("Total entries: {}", report.total);
    info!("Updated entries: {}", report.known_non_empty);
    Ok(report)
}
