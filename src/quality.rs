//! Data-quality assessment of a prepared sheet and the payload derived
//! from it. Purely advisory, like validation.
use crate::catalog::is_known_header;
use crate::shape::{column_headers, is_placeholder_header, PreparedSheet};
use crate::types::AnalysisPayload;
use serde::Serialize;

const KNOWN_MATERIALS: &[&str] = &[
    "steel", "aluminum", "copper", "zinc", "lead", "nickel", "tin", "magnesium", "titanium",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub total_cells: usize,
    pub missing_cells: usize,
    /// Share of non-blank cells, 1.0 for an empty sheet.
    pub completeness: f64,
    pub unmapped_headers: Vec<String>,
    pub warnings: Vec<String>,
}

/// Canonical spelling of common material names; unknown names pass
/// through lowercased.
pub fn normalize_material(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    match lower.as_str() {
        "aluminium" | "al" => "aluminum".to_string(),
        "cu" => "copper".to_string(),
        _ => lower,
    }
}

pub fn assess(sheet: &PreparedSheet, payload: &AnalysisPayload) -> QualityReport {
    let (headers, cells): (Vec<&str>, Vec<bool>) = match sheet {
        PreparedSheet::KeyValue(lookup) => (
            lookup.headers(),
            lookup.entries().iter().map(|(_, c)| c.is_blank()).collect(),
        ),
        PreparedSheet::Table(rows) => (
            column_headers(rows),
            rows.iter()
                .flat_map(|r| r.entries().iter().map(|(_, c)| c.is_blank()))
                .collect(),
        ),
    };

    let total_cells = cells.len();
    let missing_cells = cells.iter().filter(|blank| **blank).count();
    let completeness = if total_cells == 0 {
        1.0
    } else {
        (total_cells - missing_cells) as f64 / total_cells as f64
    };

    let unmapped_headers = headers
        .iter()
        .filter(|h| !is_placeholder_header(h) && !is_known_header(h))
        .map(|h| h.to_string())
        .collect();

    QualityReport {
        total_cells,
        missing_cells,
        completeness,
        unmapped_headers,
        warnings: payload_warnings(payload),
    }
}

fn payload_warnings(payload: &AnalysisPayload) -> Vec<String> {
    let mut warnings = Vec::new();

    let material = normalize_material(&payload.material.material_type);
    if !KNOWN_MATERIALS.contains(&material.as_str()) {
        warnings.push(format!("unknown material: {}", payload.material.material_type));
    }

    let recycling = &payload.recycling;
    let percents = payload.grid_composition.shares().into_iter().chain([
        ("recycled_content_percent", recycling.recycled_content_percent),
        ("collection_rate_percent", recycling.collection_rate_percent),
        ("recycling_efficiency_percent", recycling.recycling_efficiency_percent),
    ]);
    for (name, value) in percents {
        if !(0.0..=100.0).contains(&value) {
            warnings.push(format!("{} is outside 0-100% ({})", name, value));
        }
    }

    for (name, value) in [
        ("mass_kg", payload.material.mass_kg),
        ("distance_km", payload.transport.distance_km),
        ("weight_tonnes", payload.transport.weight_tonnes),
    ] {
        if value < 0.0 {
            warnings.push(format!("{} is negative ({})", name, value));
        }
    }
    warnings
}
