//! Canonical field catalog and header alias resolution.
//!
//! Every target field of the analysis payload is described once here: its
//! canonical name, the spreadsheet headers accepted for it (current and
//! legacy spellings) and the value used when nothing usable is found.
use crate::types::{Cell, Record};
use crate::util::{normalize_header, parse_number};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    MaterialType,
    MassKg,
    VirginEnergyKwhPerKg,
    RecycledEnergyKwhPerKg,
    VirginDirectEmissions,
    RecycledDirectEmissions,
    CoalPercent,
    GasPercent,
    OilPercent,
    NuclearPercent,
    HydroPercent,
    WindPercent,
    SolarPercent,
    OtherRenewablePercent,
    TransportMode,
    DistanceKm,
    WeightTonnes,
    TransportEmissionFactor,
    VirginEmissionFactor,
    SecondaryEmissionFactor,
    RecycledContentPercent,
    CollectionRatePercent,
    RecyclingEfficiencyPercent,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    Number(f64),
    Text(&'static str),
    /// Left out of the payload when unresolved.
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Numeric,
    Text,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: FieldKey,
    pub canonical: &'static str,
    /// Accepted headers in priority order. The canonical name comes first.
    pub aliases: &'static [&'static str],
    pub default: FieldDefault,
    pub kind: ValueKind,
}

impl FieldSpec {
    pub fn default_number(&self) -> f64 {
        match self.default {
            FieldDefault::Number(n) => n,
            _ => 0.0,
        }
    }
}

const fn numeric(
    key: FieldKey,
    canonical: &'static str,
    aliases: &'static [&'static str],
    default: FieldDefault,
) -> FieldSpec {
    FieldSpec { key, canonical, aliases, default, kind: ValueKind::Numeric }
}

const fn text(
    key: FieldKey,
    canonical: &'static str,
    aliases: &'static [&'static str],
    default: FieldDefault,
) -> FieldSpec {
    FieldSpec { key, canonical, aliases, default, kind: ValueKind::Text }
}

use FieldDefault::{Absent, Number, Text};

pub static FIELD_CATALOG: &[FieldSpec] = &[
    text(
        FieldKey::MaterialType,
        "material_type",
        &["material_type", "material", "material_name", "metal", "metal_type"],
        Text("steel"),
    ),
    numeric(
        FieldKey::MassKg,
        "mass_kg",
        &["mass_kg", "mass", "mass (kg)", "quantity", "quantity_kg", "production_kg"],
        Number(100.0),
    ),
    numeric(
        FieldKey::VirginEnergyKwhPerKg,
        "virgin_energy_kwh_per_kg",
        &[
            "virgin_energy_kwh_per_kg",
            "virgin_energy",
            "ei_process",
            "virgin_kwh_per_kg",
            "virgin_process_kwh_per_kg",
        ],
        Number(6.0),
    ),
    numeric(
        FieldKey::RecycledEnergyKwhPerKg,
        "recycled_energy_kwh_per_kg",
        &[
            "recycled_energy_kwh_per_kg",
            "recycled_energy",
            "ei_recycled",
            "recycled_kwh_per_kg",
            "recycled_process_kwh_per_kg",
        ],
        Number(2.5),
    ),
    numeric(
        FieldKey::VirginDirectEmissions,
        "virgin_direct_emissions",
        &["virgin_direct_emissions", "ef_direct", "direct_virgin"],
        Number(2.3),
    ),
    numeric(
        FieldKey::RecycledDirectEmissions,
        "recycled_direct_emissions",
        &["recycled_direct_emissions", "ef_direct_recycled", "direct_recycled"],
        Number(0.5),
    ),
    numeric(
        FieldKey::CoalPercent,
        "coal_percent",
        &["coal_percent", "coal_pct", "coal"],
        Number(30.0),
    ),
    numeric(FieldKey::GasPercent, "gas_percent", &["gas_percent", "gas_pct", "gas"], Number(30.0)),
    numeric(FieldKey::OilPercent, "oil_percent", &["oil_percent", "oil_pct", "oil"], Number(10.0)),
    numeric(
        FieldKey::NuclearPercent,
        "nuclear_percent",
        &["nuclear_percent", "nuclear_pct", "nuclear"],
        Number(10.0),
    ),
    numeric(
        FieldKey::HydroPercent,
        "hydro_percent",
        &["hydro_percent", "hydro_pct", "hydro"],
        Number(10.0),
    ),
    numeric(
        FieldKey::WindPercent,
        "wind_percent",
        &["wind_percent", "wind_pct", "wind"],
        Number(5.0),
    ),
    numeric(
        FieldKey::SolarPercent,
        "solar_percent",
        &["solar_percent", "solar_pct", "solar"],
        Number(3.0),
    ),
    numeric(
        FieldKey::OtherRenewablePercent,
        "other_renewable_percent",
        &[
            "other_renewable_percent",
            "other_renewable_pct",
            "other_renewable",
            "other_pct",
            "other_percent",
            "other",
        ],
        Number(2.0),
    ),
    text(
        FieldKey::TransportMode,
        "transport_mode",
        &["transport_mode", "mode", "transport_type", "transport"],
        Absent,
    ),
    numeric(
        FieldKey::DistanceKm,
        "distance_km",
        &["distance_km", "transport_distance_km", "distance", "transport_distance"],
        Number(500.0),
    ),
    numeric(
        FieldKey::WeightTonnes,
        "weight_tonnes",
        &["weight_tonnes", "transport_weight_t", "transport_weight", "weight_t", "weight"],
        Absent,
    ),
    numeric(
        FieldKey::TransportEmissionFactor,
        "transport_emission_factor",
        &["transport_emission_factor", "transport_ef", "emission_factor_kg_co2e_per_tkm"],
        Absent,
    ),
    numeric(
        FieldKey::VirginEmissionFactor,
        "virgin_emission_factor",
        &["virgin_emission_factor", "virgin_ef"],
        Absent,
    ),
    numeric(
        FieldKey::SecondaryEmissionFactor,
        "secondary_emission_factor",
        &["secondary_emission_factor", "secondary_ef", "recycled_ef", "recycled_emission_factor"],
        Absent,
    ),
    numeric(
        FieldKey::RecycledContentPercent,
        "recycled_content_percent",
        &[
            "recycled_content_percent",
            "secondary_content_existing",
            "recycled_content",
            "recycled_content_pct",
            "secondary_content",
        ],
        Number(40.0),
    ),
    numeric(
        FieldKey::CollectionRatePercent,
        "collection_rate_percent",
        &["collection_rate_percent", "collection_rate", "collection_rate_pct"],
        Number(75.0),
    ),
    numeric(
        FieldKey::RecyclingEfficiencyPercent,
        "recycling_efficiency_percent",
        &["recycling_efficiency_percent", "recycling_efficiency", "recycling_efficiency_pct"],
        Number(90.0),
    ),
];

/// Numeric fields that count towards a row's completeness score.
pub static SCORED_FIELDS: &[FieldKey] = &[
    FieldKey::MassKg,
    FieldKey::VirginEnergyKwhPerKg,
    FieldKey::RecycledEnergyKwhPerKg,
    FieldKey::VirginDirectEmissions,
    FieldKey::RecycledDirectEmissions,
    FieldKey::CoalPercent,
    FieldKey::GasPercent,
    FieldKey::OilPercent,
    FieldKey::NuclearPercent,
    FieldKey::HydroPercent,
    FieldKey::WindPercent,
    FieldKey::SolarPercent,
    FieldKey::OtherRenewablePercent,
    FieldKey::DistanceKm,
    FieldKey::WeightTonnes,
    FieldKey::TransportEmissionFactor,
    FieldKey::VirginEmissionFactor,
    FieldKey::SecondaryEmissionFactor,
    FieldKey::CollectionRatePercent,
    FieldKey::RecyclingEfficiencyPercent,
];

static BY_KEY: Lazy<HashMap<FieldKey, &'static FieldSpec>> =
    Lazy::new(|| FIELD_CATALOG.iter().map(|spec| (spec.key, spec)).collect());

// Normalized alias forms, computed once.
static NORMALIZED_ALIASES: Lazy<HashMap<FieldKey, Vec<String>>> = Lazy::new(|| {
    FIELD_CATALOG
        .iter()
        .map(|spec| {
            let normalized = spec.aliases.iter().map(|a| normalize_header(a)).collect();
            (spec.key, normalized)
        })
        .collect()
});

impl FieldKey {
    pub fn spec(&self) -> &'static FieldSpec {
        // Every key has a catalog entry; see `catalog_covers_every_key`.
        BY_KEY[self]
    }

    pub fn canonical(&self) -> &'static str {
        self.spec().canonical
    }

    fn normalized_aliases(&self) -> &'static [String] {
        NORMALIZED_ALIASES.get(self).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Index of the candidate header matching one of `aliases`.
///
/// Aliases are tried in order, so an earlier alias beats a later one even
/// when the later one sits in a column further left. For a given alias the
/// leftmost matching column wins.
pub fn resolve_alias<S: AsRef<str>>(candidates: &[S], aliases: &[&str]) -> Option<usize> {
    let aliases: Vec<String> = aliases.iter().map(|a| normalize_header(a)).collect();
    first_alias_match(candidates, &aliases)
}

/// [`resolve_alias`] against a catalog field's declared aliases.
pub fn resolve_field<S: AsRef<str>>(candidates: &[S], key: FieldKey) -> Option<usize> {
    let found = first_alias_match(candidates, key.normalized_aliases());
    if let Some(idx) = found {
        debug!(field = key.canonical(), header = candidates[idx].as_ref(), "resolved header");
    }
    found
}

/// The `(header, cell)` pair of `record` that feeds `key`, if any.
pub fn lookup_field(record: &Record, key: FieldKey) -> Option<&(String, Cell)> {
    resolve_field(&record.headers(), key).and_then(|idx| record.get(idx))
}

/// Numeric value `key` takes for `record` once mapped: the parsed cell, or
/// the catalog default when the header is missing or the cell unreadable.
pub fn mapped_number(record: &Record, key: FieldKey) -> f64 {
    lookup_field(record, key)
        .and_then(|(_, cell)| parse_number(cell))
        .unwrap_or_else(|| key.spec().default_number())
}

/// Whether a header maps to any catalog field.
pub fn is_known_header(header: &str) -> bool {
    let normalized = normalize_header(header);
    !normalized.is_empty()
        && NORMALIZED_ALIASES
            .values()
            .any(|aliases| aliases.iter().any(|a| *a == normalized))
}

// Shared scan behind `resolve_alias` and `resolve_field`; `aliases` are
// already normalized. Empty forms never match.
fn first_alias_match<S: AsRef<str>>(candidates: &[S], aliases: &[String]) -> Option<usize> {
    let normalized: Vec<String> = candidates.iter().map(|c| normalize_header(c.as_ref())).collect();
    aliases
        .iter()
        .filter(|alias| !alias.is_empty())
        .find_map(|alias| normalized.iter().position(|h| h == alias))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_covers_every_key() {
        for spec in FIELD_CATALOG {
            assert_eq!(spec.key.spec().canonical, spec.canonical);
            assert_eq!(normalize_header(spec.aliases[0]), normalize_header(spec.canonical));
        }
        assert_eq!(BY_KEY.len(), FIELD_CATALOG.len());
    }

    #[test]
    fn only_material_and_mode_are_text() {
        let text: Vec<FieldKey> = FIELD_CATALOG
            .iter()
            .filter(|spec| spec.kind == ValueKind::Text)
            .map(|spec| spec.key)
            .collect();
        assert_eq!(text, vec![FieldKey::MaterialType, FieldKey::TransportMode]);
        assert_eq!(FieldKey::MaterialType.spec().default, FieldDefault::Text("steel"));
        assert_eq!(FieldKey::MassKg.spec().default_number(), 100.0);
    }

    #[test]
    fn aliases_are_unique_across_fields() {
        let mut seen: HashMap<String, FieldKey> = HashMap::new();
        for spec in FIELD_CATALOG {
            for alias in spec.aliases {
                let n = normalize_header(alias);
                if let Some(other) = seen.insert(n.clone(), spec.key) {
                    assert_eq!(other, spec.key, "alias {} shared by two fields", n);
                }
            }
        }
    }

    #[test]
    fn resolve_alias_ignores_case_and_punctuation() {
        let headers = ["Material", "Mass (kg)", "EI_process"];
        assert_eq!(resolve_alias(&headers, &["mass_kg"]), Some(1));
        assert_eq!(resolve_alias(&headers, &["ei-process"]), Some(2));
        assert_eq!(resolve_alias(&headers, &["nothing"]), None);
    }

    #[test]
    fn resolve_alias_prefers_earlier_alias_over_leftmost_column() {
        let headers = ["quantity", "Mass_kg"];
        assert_eq!(resolve_alias(&headers, &["mass_kg", "quantity"]), Some(1));
        let dupes = ["mass", "MASS"];
        assert_eq!(resolve_alias(&dupes, &["mass"]), Some(0));
    }

    #[test]
    fn resolve_field_agrees_with_resolve_alias() {
        let headers = ["Notes", "Quantity", "MASS", "Transport-Distance"];
        for spec in FIELD_CATALOG {
            assert_eq!(resolve_field(&headers, spec.key), resolve_alias(&headers, spec.aliases));
        }
        assert_eq!(resolve_field(&headers, FieldKey::MassKg), Some(2));
        assert_eq!(resolve_field(&headers, FieldKey::DistanceKm), Some(3));
    }

    #[test]
    fn mapped_number_falls_back_to_catalog_default() {
        let row = Record::new().with("Mass_kg", "").with("EI_process", "0").with("Coal_pct", "x");
        assert_eq!(mapped_number(&row, FieldKey::MassKg), 100.0);
        assert_eq!(mapped_number(&row, FieldKey::VirginEnergyKwhPerKg), 0.0);
        assert_eq!(mapped_number(&row, FieldKey::CoalPercent), 30.0);
        assert_eq!(mapped_number(&row, FieldKey::TransportEmissionFactor), 0.0);
    }

    #[test]
    fn resolve_alias_never_matches_empty_headers() {
        let headers = ["", "  ", "(kg)"];
        assert_eq!(resolve_alias(&headers, &["", "---"]), None);
    }

    #[test]
    fn resolve_field_uses_catalog_aliases() {
        let headers = ["Other_pct", "Transport_distance_km"];
        assert_eq!(resolve_field(&headers, FieldKey::OtherRenewablePercent), Some(0));
        assert_eq!(resolve_field(&headers, FieldKey::DistanceKm), Some(1));
        assert_eq!(resolve_field(&headers, FieldKey::MassKg), None);
    }

    #[test]
    fn known_headers() {
        assert!(is_known_header("Secondary_content_existing"));
        assert!(!is_known_header("Notes"));
        assert!(!is_known_header(""));
    }
}
