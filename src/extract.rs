//! Field mapping and payload assembly.
//!
//! Resolution never fails: a field with no matching header, or whose cell
//! holds nothing numeric, takes its catalog default. Every decision is
//! recorded in a [`FieldResolution`] trace so a caller can show where each
//! value came from.
use crate::catalog::{lookup_field, FieldKey};
use crate::config::ExtractConfig;
use crate::selection::{candidate_rows, select_best_row, RowSelection};
use crate::shape::{prepare, PreparedSheet, SheetLayout};
use crate::types::{
    AnalysisPayload, EmissionsSection, EnergySection, FieldSource, GridComposition,
    MaterialSection, Record, RecyclingSection, SheetInput, TransportMode, TransportSection,
    ANALYSIS_TYPE, REPORT_FORMAT,
};
use crate::util::{first_non_empty_string, normalize_header, parse_number};
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct FieldResolution {
    pub field: &'static str,
    pub header: Option<String>,
    pub value: String,
    pub source: FieldSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub payload: AnalysisPayload,
    pub layout: SheetLayout,
    /// Only set for tables.
    pub selected_row: Option<RowSelection>,
    pub trace: Vec<FieldResolution>,
}

/// Derive the analysis payload with the default configuration.
pub fn extract_analysis_payload(input: &SheetInput) -> AnalysisPayload {
    extract(input, &ExtractConfig::default()).payload
}

pub fn extract(input: &SheetInput, config: &ExtractConfig) -> Extraction {
    extract_prepared(&prepare(input), config)
}

pub fn extract_prepared(sheet: &PreparedSheet, config: &ExtractConfig) -> Extraction {
    match sheet {
        PreparedSheet::KeyValue(lookup) => {
            let (payload, trace) = assemble(lookup, config);
            Extraction { payload, layout: SheetLayout::KeyValue, selected_row: None, trace }
        }
        PreparedSheet::Table(rows) => {
            let candidates = candidate_rows(rows);
            let selection = select_best_row(&candidates, config);
            info!(
                row = selection.index,
                score = selection.score,
                candidates = candidates.len(),
                "selected data row"
            );
            let (payload, trace) = assemble(&candidates[selection.index], config);
            Extraction { payload, layout: SheetLayout::Table, selected_row: Some(selection), trace }
        }
    }
}

/// One payload per non-blank data row of a table, or a single payload for
/// a key/value sheet.
pub fn extract_scenarios(input: &SheetInput, config: &ExtractConfig) -> Vec<AnalysisPayload> {
    match prepare(input) {
        PreparedSheet::KeyValue(lookup) => vec![assemble(&lookup, config).0],
        PreparedSheet::Table(rows) => candidate_rows(&rows)
            .iter()
            .map(|row| assemble(row, config).0)
            .collect(),
    }
}

/// Map a transport description to one of the four modes. Without a
/// recognizable description, long hauls go by ship and the rest by truck.
pub fn derive_transport_mode(
    explicit: Option<&str>,
    distance_km: f64,
    ship_threshold_km: f64,
) -> TransportMode {
    explicit
        .and_then(mode_from_text)
        .unwrap_or(if distance_km > ship_threshold_km {
            TransportMode::Ship
        } else {
            TransportMode::Truck
        })
}

fn mode_from_text(text: &str) -> Option<TransportMode> {
    let text = normalize_header(text);
    if text.contains("road") || text.contains("truck") {
        Some(TransportMode::Truck)
    } else if text.contains("ship") {
        Some(TransportMode::Ship)
    } else if text.contains("rail") {
        Some(TransportMode::Rail)
    } else if text.contains("air") {
        Some(TransportMode::Air)
    } else {
        None
    }
}

struct Resolver<'a> {
    record: &'a Record,
    trace: Vec<FieldResolution>,
}

impl<'a> Resolver<'a> {
    fn note(&mut self, key: FieldKey, header: Option<&str>, value: String, source: FieldSource) {
        self.trace.push(FieldResolution {
            field: key.canonical(),
            header: header.map(str::to_string),
            value,
            source,
        });
    }

    /// Numeric value from the sheet, without falling back.
    fn sheet_number(&self, key: FieldKey) -> Option<(&'a str, f64)> {
        let (header, cell) = lookup_field(self.record, key)?;
        parse_number(cell).map(|v| (header.as_str(), v))
    }

    fn header_of(&self, key: FieldKey) -> Option<&'a str> {
        lookup_field(self.record, key).map(|(h, _)| h.as_str())
    }

    fn number(&mut self, key: FieldKey) -> f64 {
        match self.sheet_number(key) {
            Some((header, v)) => {
                self.note(key, Some(header), v.to_string(), FieldSource::Sheet);
                v
            }
            None => {
                let v = key.spec().default_number();
                let header = self.header_of(key);
                self.note(key, header, v.to_string(), FieldSource::Default);
                v
            }
        }
    }

    fn text(&self, key: FieldKey) -> Option<(&'a str, String)> {
        let (header, cell) = lookup_field(self.record, key)?;
        first_non_empty_string(cell).map(|s| (header.as_str(), s))
    }
}

fn assemble(record: &Record, config: &ExtractConfig) -> (AnalysisPayload, Vec<FieldResolution>) {
    let mut r = Resolver { record, trace: Vec::new() };

    let material_type = match r.text(FieldKey::MaterialType) {
        Some((header, value)) => {
            r.note(FieldKey::MaterialType, Some(header), value.clone(), FieldSource::Sheet);
            value
        }
        None => {
            let header = r.header_of(FieldKey::MaterialType);
            let value = config.default_material.clone();
            r.note(FieldKey::MaterialType, header, value.clone(), FieldSource::Default);
            value
        }
    };
    let mass_kg = r.number(FieldKey::MassKg);

    let energy = EnergySection {
        virgin_energy_kwh_per_kg: r.number(FieldKey::VirginEnergyKwhPerKg),
        recycled_energy_kwh_per_kg: r.number(FieldKey::RecycledEnergyKwhPerKg),
    };
    let emissions = EmissionsSection {
        virgin_direct_emissions: r.number(FieldKey::VirginDirectEmissions),
        recycled_direct_emissions: r.number(FieldKey::RecycledDirectEmissions),
    };
    let grid_composition = GridComposition {
        coal_percent: r.number(FieldKey::CoalPercent),
        gas_percent: r.number(FieldKey::GasPercent),
        oil_percent: r.number(FieldKey::OilPercent),
        nuclear_percent: r.number(FieldKey::NuclearPercent),
        hydro_percent: r.number(FieldKey::HydroPercent),
        wind_percent: r.number(FieldKey::WindPercent),
        solar_percent: r.number(FieldKey::SolarPercent),
        other_renewable_percent: r.number(FieldKey::OtherRenewablePercent),
    };

    let distance_km = r.number(FieldKey::DistanceKm);
    let explicit_mode = r.text(FieldKey::TransportMode);
    let transport_mode = derive_transport_mode(
        explicit_mode.as_ref().map(|(_, v)| v.as_str()),
        distance_km,
        config.ship_distance_threshold_km,
    );
    let mode_source = match &explicit_mode {
        Some((_, v)) if mode_from_text(v).is_some() => FieldSource::Sheet,
        _ => FieldSource::Derived,
    };
    let mode_header = explicit_mode.as_ref().map(|(h, _)| *h);
    r.note(FieldKey::TransportMode, mode_header, transport_mode.to_string(), mode_source);

    let weight_tonnes = match r.sheet_number(FieldKey::WeightTonnes) {
        Some((header, v)) if v != 0.0 => {
            r.note(FieldKey::WeightTonnes, Some(header), v.to_string(), FieldSource::Sheet);
            v
        }
        _ => {
            let v = mass_kg / 1000.0;
            let header = r.header_of(FieldKey::WeightTonnes);
            r.note(FieldKey::WeightTonnes, header, v.to_string(), FieldSource::Derived);
            v
        }
    };

    let emission_factor_override = match r.sheet_number(FieldKey::TransportEmissionFactor) {
        Some((header, v)) => {
            let value = v.to_string();
            r.note(FieldKey::TransportEmissionFactor, Some(header), value, FieldSource::Sheet);
            Some(v)
        }
        None => {
            let header = r.header_of(FieldKey::TransportEmissionFactor);
            let value = "-".to_string();
            r.note(FieldKey::TransportEmissionFactor, header, value, FieldSource::Default);
            None
        }
    };

    let recycling = RecyclingSection {
        recycled_content_percent: r.number(FieldKey::RecycledContentPercent),
        collection_rate_percent: r.number(FieldKey::CollectionRatePercent),
        recycling_efficiency_percent: r.number(FieldKey::RecyclingEfficiencyPercent),
    };

    let payload = AnalysisPayload {
        material: MaterialSection { material_type, mass_kg },
        energy,
        emissions,
        grid_composition,
        transport: TransportSection {
            transport_mode,
            distance_km,
            weight_tonnes,
            emission_factor_override,
        },
        recycling,
        analysis_type: ANALYSIS_TYPE.to_string(),
        report_format: REPORT_FORMAT.to_string(),
    };
    (payload, r.trace)
}
