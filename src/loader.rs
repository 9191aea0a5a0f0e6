use crate::error::IngestError;
use crate::types::{Cell, SheetInput};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

/// Read a spreadsheet or JSON export from disk.
///
/// CSV and workbook files always come back in matrix form; the header row,
/// if any, is left for shape detection to interpret.
pub fn load_sheet(path: &Path) -> Result<SheetInput, IngestError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    let input = match ext.as_str() {
        "csv" => load_csv(path)?,
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_workbook(path)?,
        "json" => load_json(path)?,
        _ => return Err(IngestError::UnsupportedExtension(ext)),
    };
    info!(path = %path.display(), rows = input.row_count(), "loaded sheet");
    Ok(input)
}

fn load_csv(path: &Path) -> Result<SheetInput, IngestError> {
    let display = path.display().to_string();
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|source| IngestError::Csv { path: display.clone(), source })?;

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|source| IngestError::Csv { path: display.clone(), source })?;
        rows.push(record.iter().map(csv_cell).collect());
    }
    Ok(SheetInput::Matrix(rows))
}

fn csv_cell(field: &str) -> Cell {
    if field.trim().is_empty() {
        Cell::Empty
    } else {
        Cell::Text(field.to_string())
    }
}

fn load_workbook(path: &Path) -> Result<SheetInput, IngestError> {
    let display = path.display().to_string();
    let mut workbook = open_workbook_auto(path)
        .map_err(|source| IngestError::Workbook { path: display.clone(), source })?;
    if workbook.sheet_names().len() > 1 {
        let sheets = workbook.sheet_names().len();
        warn!(path = %path.display(), sheets, "reading first worksheet only");
    }
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::NoWorksheet(display.clone()))?
        .map_err(|source| IngestError::Workbook { path: display.clone(), source })?;

    let rows = range
        .rows()
        .map(|row| row.iter().map(workbook_cell).collect())
        .collect();
    Ok(SheetInput::Matrix(rows))
}

fn workbook_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => csv_cell(s),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

fn load_json(path: &Path) -> Result<SheetInput, IngestError> {
    let display = path.display().to_string();
    let file =
        File::open(path).map_err(|source| IngestError::Io { path: display.clone(), source })?;
    let value: serde_json::Value = serde_json::from_reader(BufReader::new(file))
        .map_err(|source| IngestError::Json { path: display.clone(), source })?;
    SheetInput::from_json(&value)
}
