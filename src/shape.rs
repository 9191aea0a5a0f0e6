//! Sheet shape detection.
//!
//! Turns either input shape into a [`PreparedSheet`]: a single key/value
//! lookup for two-column label sheets, or a list of keyed rows for
//! ordinary tables. Field mapping only ever sees the prepared form.
use crate::types::{Cell, Record, SheetInput};
use crate::util::{first_non_empty_string, normalize_header};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use tracing::info;

// Column names spreadsheet-to-object converters invent for blank headers.
static PLACEHOLDER_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:__empty(?:_\d+)?|column\s*\d+|field\s*\d+|unnamed:?\s*\d+)$")
        .expect("placeholder pattern compiles")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetLayout {
    KeyValue,
    Table,
}

impl fmt::Display for SheetLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SheetLayout::KeyValue => "key-value",
            SheetLayout::Table => "table",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PreparedSheet {
    /// Label -> value pairs, one attribute per source row.
    KeyValue(Record),
    /// Header-keyed data rows.
    Table(Vec<Record>),
}

impl PreparedSheet {
    pub fn layout(&self) -> SheetLayout {
        match self {
            PreparedSheet::KeyValue(_) => SheetLayout::KeyValue,
            PreparedSheet::Table(_) => SheetLayout::Table,
        }
    }
}

pub fn is_placeholder_header(header: &str) -> bool {
    PLACEHOLDER_HEADER.is_match(header.trim())
}

/// Ordered union of column names across all rows.
pub fn column_headers(rows: &[Record]) -> Vec<&str> {
    let mut headers: Vec<&str> = Vec::new();
    for row in rows {
        for h in row.headers() {
            if !headers.contains(&h) {
                headers.push(h);
            }
        }
    }
    headers
}

/// Classify record-form rows as a key/value sheet or a table.
pub fn classify_records(rows: &[Record]) -> SheetLayout {
    let headers = column_headers(rows);
    if headers.is_empty() || headers.iter().all(|h| is_placeholder_header(h)) {
        return SheetLayout::KeyValue;
    }
    if headers.len() == 2 && matches!(normalize_header(headers[0]).as_str(), "key" | "name") {
        return SheetLayout::KeyValue;
    }
    SheetLayout::Table
}

/// Run shape detection over either input form.
pub fn prepare(input: &SheetInput) -> PreparedSheet {
    let prepared = match input {
        SheetInput::Matrix(rows) => prepare_matrix(rows),
        SheetInput::Records(rows) => match classify_records(rows) {
            SheetLayout::KeyValue => PreparedSheet::KeyValue(key_value_lookup(
                rows.iter().map(|r| r.entries().iter().map(|(_, c)| c).collect::<Vec<_>>()),
            )),
            SheetLayout::Table => PreparedSheet::Table(rows.clone()),
        },
    };
    info!(layout = %prepared.layout(), rows = input.row_count(), "classified sheet");
    prepared
}

// The header row decides: more than two filled cells means a table,
// otherwise every following row is a literal (label, value) pair.
fn prepare_matrix(rows: &[Vec<Cell>]) -> PreparedSheet {
    let Some((header, body)) = rows.split_first() else {
        return PreparedSheet::KeyValue(Record::new());
    };
    let filled = header.iter().filter(|c| !c.is_blank()).count();
    if filled > 2 {
        PreparedSheet::Table(records_from_matrix(header, body))
    } else {
        PreparedSheet::KeyValue(key_value_lookup(body.iter().map(|r| r.iter().collect::<Vec<_>>())))
    }
}

fn records_from_matrix(header: &[Cell], body: &[Vec<Cell>]) -> Vec<Record> {
    let width = body.iter().map(Vec::len).chain(std::iter::once(header.len())).max().unwrap_or(0);
    let names: Vec<String> = (0..width)
        .map(|i| {
            header
                .get(i)
                .and_then(first_non_empty_string)
                .unwrap_or_else(|| format!("__EMPTY_{}", i))
        })
        .collect();
    body.iter()
        .map(|row| {
            names
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), row.get(i).cloned().unwrap_or_default()))
                .collect()
        })
        .collect()
}

// Rows with fewer than two cells or a blank label are skipped. A repeated
// label keeps the value of its last occurrence.
fn key_value_lookup<'a, I>(rows: I) -> Record
where
    I: Iterator<Item = Vec<&'a Cell>>,
{
    let mut lookup = Record::new();
    for row in rows {
        if row.len() < 2 {
            continue;
        }
        if let Some(key) = first_non_empty_string(row[0]) {
            lookup.upsert(key, row[1].clone());
        }
    }
    lookup
}
