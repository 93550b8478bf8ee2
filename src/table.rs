// src/table.rs

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use serde_json::{Map, Number, Value};

/// Cell texts the spreadsheet export uses for "no value". They are read as
/// empty cells, same as a blank field.
pub static NA_SENTINELS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A CSV export held in memory: one header row plus data rows of the same width.
///
/// Missing cells are already normalized to `""`.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// How a column is written out as JSON.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Int,
    Float,
    Bool,
    Text,
}

impl Table {
    /// Parse comma-separated text whose first non-blank line is the header.
    ///
    /// Short rows are padded with empty cells; a row wider than the header is
    /// an error. Blank header cells become `Unnamed: <i>` and repeated names
    /// get a `.<n>` suffix.
    pub fn from_csv(text: &str) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let raw_headers = rdr.headers().context("reading CSV header row")?.clone();
        if raw_headers.is_empty() {
            bail!("CSV export has no header row");
        }
        let headers = normalize_headers(&raw_headers);
        let width = headers.len();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.context("parsing CSV record")?;
            if record.len() > width {
                let line = record.position().map(|p| p.line()).unwrap_or_default();
                bail!(
                    "CSV line {}: expected {} fields, saw {}",
                    line,
                    width,
                    record.len()
                );
            }
            let mut row: Vec<String> = record.iter().map(normalize_cell).collect();
            row.resize(width, String::new());
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    /// Build a table from already-split cells, padding short rows with `""`.
    ///
    /// A row wider than `headers` is an error, as in [`Table::from_csv`].
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let width = headers.len();
        let mut padded = Vec::with_capacity(rows.len());
        for (i, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                bail!("row {}: expected {} fields, saw {}", i, width, row.len());
            }
            row.resize(width, String::new());
            padded.push(row);
        }
        Ok(Self {
            headers,
            rows: padded,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Kind of every column, in header order.
    pub fn column_kinds(&self) -> Vec<ColumnKind> {
        (0..self.width())
            .map(|c| infer_kind(self.rows.iter().map(|r| r[c].as_str())))
            .collect()
    }

    /// One JSON object per row, keys in header order, values typed per column.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        let kinds = self.column_kinds();
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .zip(row)
                    .zip(&kinds)
                    .map(|((h, cell), kind)| (h.clone(), typed_value(cell, *kind)))
                    .collect()
            })
            .collect()
    }
}

fn normalize_headers(raw: &StringRecord) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for (i, h) in raw.iter().enumerate() {
        let base = if h.is_empty() {
            format!("Unnamed: {i}")
        } else {
            h.to_string()
        };
        let mut name = base.clone();
        let mut n = 0;
        while out.contains(&name) {
            n += 1;
            name = format!("{base}.{n}");
        }
        out.push(name);
    }
    out
}

fn normalize_cell(raw: &str) -> String {
    if NA_SENTINELS.contains(&raw) {
        String::new()
    } else {
        raw.to_string()
    }
}

fn parse_float(s: &str) -> Option<f64> {
    // f64::from_str also accepts "inf" and "NaN"
    if !s.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Narrowest kind that fits every non-empty cell; empty-only columns are text.
pub fn infer_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let (mut int, mut float, mut boolean) = (true, true, true);
    let mut any = false;
    for cell in cells.filter(|c| !c.is_empty()) {
        any = true;
        int = int && cell.parse::<i64>().is_ok();
        float = float && parse_float(cell).is_some();
        boolean = boolean && parse_bool(cell).is_some();
        if !(int || float || boolean) {
            return ColumnKind::Text;
        }
    }
    match (any, int, float, boolean) {
        (false, ..) => ColumnKind::Text,
        (true, true, ..) => ColumnKind::Int,
        (true, false, true, _) => ColumnKind::Float,
        (true, false, false, true) => ColumnKind::Bool,
        _ => ColumnKind::Text,
    }
}

fn typed_value(cell: &str, kind: ColumnKind) -> Value {
    if cell.is_empty() {
        return Value::String(String::new());
    }
    let typed = match kind {
        ColumnKind::Int => cell.parse::<i64>().ok().map(Value::from),
        ColumnKind::Float => parse_float(cell)
            .and_then(Number::from_f64)
            .map(Value::Number),
        ColumnKind::Bool => parse_bool(cell).map(Value::Bool),
        ColumnKind::Text => None,
    };
    typed.unwrap_or_else(|| Value::String(cell.to_string()))
}
