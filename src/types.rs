use crate::error::IngestError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tabled::Tabled;

pub const ANALYSIS_TYPE: &str = "cradle_to_gate";
pub const REPORT_FORMAT: &str = "json";

/// A single raw spreadsheet cell as handed over by a parser.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Cell {
    /// Empty cells and whitespace-only text both count as blank.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) | Cell::Bool(_) => false,
        }
    }

    fn from_json(value: &Value) -> Cell {
        match value {
            Value::Null => Cell::Empty,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
            Value::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => f.write_str(s),
            Cell::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<i32> for Cell {
    fn from(n: i32) -> Self {
        Cell::Number(n as f64)
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Number(n as f64)
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Cell::Bool(b)
    }
}

/// One row keyed by column name. Column order is kept; it decides
/// tie-breaks when two headers match the same field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    cells: Vec<(String, Cell)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append, mostly for callers assembling rows by hand.
    pub fn with(mut self, header: impl Into<String>, cell: impl Into<Cell>) -> Self {
        self.push(header, cell);
        self
    }

    pub fn push(&mut self, header: impl Into<String>, cell: impl Into<Cell>) {
        self.cells.push((header.into(), cell.into()));
    }

    /// Replace the value of an existing header (exact match) or append it.
    pub fn upsert(&mut self, header: impl Into<String>, cell: impl Into<Cell>) {
        let header = header.into();
        let cell = cell.into();
        match self.cells.iter_mut().find(|(h, _)| *h == header) {
            Some(slot) => slot.1 = cell,
            None => self.cells.push((header, cell)),
        }
    }

    pub fn headers(&self) -> Vec<&str> {
        self.cells.iter().map(|(h, _)| h.as_str()).collect()
    }

    pub fn entries(&self) -> &[(String, Cell)] {
        &self.cells
    }

    pub fn get(&self, index: usize) -> Option<&(String, Cell)> {
        self.cells.get(index)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, c)| c.is_blank())
    }
}

impl<K: Into<String>, C: Into<Cell>> FromIterator<(K, C)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, C)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, c) in iter {
            record.push(k, c);
        }
        record
    }
}

/// The two input shapes a caller may hand to the extractor.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetInput {
    /// Raw positional rows; the first row may be a header row.
    Matrix(Vec<Vec<Cell>>),
    /// Rows already keyed by column name.
    Records(Vec<Record>),
}

impl SheetInput {
    pub fn row_count(&self) -> usize {
        match self {
            SheetInput::Matrix(rows) => rows.len(),
            SheetInput::Records(rows) => rows.len(),
        }
    }

    /// Interpret a JSON document as sheet input.
    ///
    /// Accepts an array of arrays (matrix form) or an array of objects
    /// (record form). Anything else is a contract violation by the caller
    /// and is rejected instead of being coerced.
    pub fn from_json(value: &Value) -> Result<SheetInput, IngestError> {
        let Value::Array(rows) = value else {
            return Err(IngestError::UnsupportedShape(format!(
                "expected an array of rows, found {}",
                json_kind(value)
            )));
        };
        if rows.is_empty() {
            return Ok(SheetInput::Matrix(Vec::new()));
        }
        if rows.iter().all(Value::is_array) {
            let matrix = rows
                .iter()
                .filter_map(Value::as_array)
                .map(|row| row.iter().map(Cell::from_json).collect())
                .collect();
            return Ok(SheetInput::Matrix(matrix));
        }
        if rows.iter().all(Value::is_object) {
            let records = rows
                .iter()
                .filter_map(Value::as_object)
                .map(|obj| {
                    obj.iter()
                        .map(|(k, v)| (k.clone(), Cell::from_json(v)))
                        .collect::<Record>()
                })
                .collect();
            return Ok(SheetInput::Records(records));
        }
        Err(IngestError::UnsupportedShape(
            "rows must be all arrays or all objects".to_string(),
        ))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Truck,
    Ship,
    Rail,
    Air,
}

impl TransportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Truck => "truck",
            TransportMode::Ship => "ship",
            TransportMode::Rail => "rail",
            TransportMode::Air => "air",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSection {
    pub material_type: String,
    pub mass_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergySection {
    pub virgin_energy_kwh_per_kg: f64,
    pub recycled_energy_kwh_per_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionsSection {
    pub virgin_direct_emissions: f64,
    pub recycled_direct_emissions: f64,
}

/// Electricity grid mix, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridComposition {
    pub coal_percent: f64,
    pub gas_percent: f64,
    pub oil_percent: f64,
    pub nuclear_percent: f64,
    pub hydro_percent: f64,
    pub wind_percent: f64,
    pub solar_percent: f64,
    pub other_renewable_percent: f64,
}

impl GridComposition {
    pub fn shares(&self) -> [(&'static str, f64); 8] {
        [
            ("coal_percent", self.coal_percent),
            ("gas_percent", self.gas_percent),
            ("oil_percent", self.oil_percent),
            ("nuclear_percent", self.nuclear_percent),
            ("hydro_percent", self.hydro_percent),
            ("wind_percent", self.wind_percent),
            ("solar_percent", self.solar_percent),
            ("other_renewable_percent", self.other_renewable_percent),
        ]
    }

    pub fn total(&self) -> f64 {
        self.shares().iter().map(|(_, v)| v).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportSection {
    pub transport_mode: TransportMode,
    pub distance_km: f64,
    pub weight_tonnes: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emission_factor_override: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecyclingSection {
    pub recycled_content_percent: f64,
    pub collection_rate_percent: f64,
    pub recycling_efficiency_percent: f64,
}

/// The fixed-shape request body for the remote analysis service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPayload {
    pub material: MaterialSection,
    pub energy: EnergySection,
    pub emissions: EmissionsSection,
    pub grid_composition: GridComposition,
    pub transport: TransportSection,
    pub recycling: RecyclingSection,
    pub analysis_type: String,
    pub report_format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldSource {
    Sheet,
    Default,
    Derived,
}

impl fmt::Display for FieldSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldSource::Sheet => "sheet",
            FieldSource::Default => "default",
            FieldSource::Derived => "derived",
        })
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct FieldReportRow {
    #[serde(rename = "Field")]
    #[tabled(rename = "Field")]
    pub field: String,
    #[serde(rename = "Header")]
    #[tabled(rename = "Header")]
    pub header: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
    #[serde(rename = "Source")]
    #[tabled(rename = "Source")]
    pub source: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ScenarioRow {
    #[serde(rename = "Scenario")]
    #[tabled(rename = "Scenario")]
    pub scenario: usize,
    #[serde(rename = "Material")]
    #[tabled(rename = "Material")]
    pub material: String,
    #[serde(rename = "MassKg")]
    #[tabled(rename = "MassKg")]
    pub mass_kg: String,
    #[serde(rename = "TransportMode")]
    #[tabled(rename = "TransportMode")]
    pub transport_mode: String,
    #[serde(rename = "DistanceKm")]
    #[tabled(rename = "DistanceKm")]
    pub distance_km: String,
    #[serde(rename = "GridTotalPct")]
    #[tabled(rename = "GridTotalPct")]
    pub grid_total_pct: String,
    #[serde(rename = "RecycledContentPct")]
    #[tabled(rename = "RecycledContentPct")]
    pub recycled_content_pct: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ScenarioSummary {
    pub total_scenarios: usize,
    pub unique_materials: Vec<String>,
    pub total_mass_kg: f64,
    pub avg_mass_kg: f64,
    pub min_mass_kg: f64,
    pub max_mass_kg: f64,
    pub transport_modes: Vec<TransportMode>,
    pub avg_recycled_content_percent: f64,
}
