use crate::extract::FieldResolution;
use crate::types::{AnalysisPayload, FieldReportRow, ScenarioRow, ScenarioSummary};
use crate::util::{average, format_number};

pub fn generate_field_report(trace: &[FieldResolution]) -> Vec<FieldReportRow> {
    trace
        .iter()
        .map(|t| FieldReportRow {
            field: t.field.to_string(),
            header: t.header.clone().unwrap_or_else(|| "-".to_string()),
            value: t.value.clone(),
            source: t.source.to_string(),
        })
        .collect()
}

pub fn generate_scenario_report(scenarios: &[AnalysisPayload]) -> Vec<ScenarioRow> {
    scenarios
        .iter()
        .enumerate()
        .map(|(idx, p)| ScenarioRow {
            scenario: idx + 1,
            material: p.material.material_type.clone(),
            mass_kg: format_number(p.material.mass_kg, 2),
            transport_mode: p.transport.transport_mode.to_string(),
            distance_km: format_number(p.transport.distance_km, 1),
            grid_total_pct: format_number(p.grid_composition.total(), 1),
            recycled_content_pct: format_number(p.recycling.recycled_content_percent, 1),
        })
        .collect()
}

pub fn generate_summary(scenarios: &[AnalysisPayload]) -> ScenarioSummary {
    let masses: Vec<f64> = scenarios.iter().map(|p| p.material.mass_kg).collect();

    let mut unique_materials: Vec<String> = Vec::new();
    let mut transport_modes = Vec::new();
    for p in scenarios {
        if !unique_materials.contains(&p.material.material_type) {
            unique_materials.push(p.material.material_type.clone());
        }
        if !transport_modes.contains(&p.transport.transport_mode) {
            transport_modes.push(p.transport.transport_mode);
        }
    }

    let (min_mass_kg, max_mass_kg) = if masses.is_empty() {
        (0.0, 0.0)
    } else {
        masses
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), m| (lo.min(*m), hi.max(*m)))
    };

    ScenarioSummary {
        total_scenarios: scenarios.len(),
        unique_materials,
        total_mass_kg: masses.iter().sum(),
        avg_mass_kg: average(&masses),
        min_mass_kg,
        max_mass_kg,
        transport_modes,
        avg_recycled_content_percent: average(
            &scenarios
                .iter()
                .map(|p| p.recycling.recycled_content_percent)
                .collect::<Vec<_>>(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractConfig;
    use crate::extract::{extract, extract_scenarios};
    use crate::types::{Record, SheetInput, TransportMode};

    fn scenarios() -> Vec<AnalysisPayload> {
        let row = |material: &str, mass: i32, distance: i32, recycled: i32| {
            Record::new()
                .with("Material", material)
                .with("Mass_kg", mass)
                .with("Distance", distance)
                .with("Recycled_content", recycled)
        };
        let rows = vec![
            row("Copper", 100, 2000, 20),
            row("Zinc", 300, 50, 60),
            row("Copper", 1200, 80, 40),
        ];
        extract_scenarios(&SheetInput::Records(rows), &ExtractConfig::default())
    }

    #[test]
    fn summary_aggregates_scenarios() {
        let summary = generate_summary(&scenarios());
        assert_eq!(summary.total_scenarios, 3);
        assert_eq!(summary.unique_materials, vec!["Copper".to_string(), "Zinc".to_string()]);
        assert_eq!(summary.total_mass_kg, 1600.0);
        assert_eq!(summary.min_mass_kg, 100.0);
        assert_eq!(summary.max_mass_kg, 1200.0);
        assert_eq!(summary.transport_modes, vec![TransportMode::Ship, TransportMode::Truck]);
        assert_eq!(summary.avg_recycled_content_percent, 40.0);
    }

    #[test]
    fn empty_summary_is_zeroed() {
        let summary = generate_summary(&[]);
        assert_eq!(summary.total_scenarios, 0);
        assert_eq!(summary.avg_mass_kg, 0.0);
        assert_eq!(summary.min_mass_kg, 0.0);
        assert!(summary.unique_materials.is_empty());
    }

    #[test]
    fn scenario_rows_are_numbered_and_formatted() {
        let rows = generate_scenario_report(&scenarios());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].scenario, 3);
        assert_eq!(rows[2].mass_kg, "1,200.00");
        assert_eq!(rows[0].transport_mode, "ship");
    }

    #[test]
    fn field_report_marks_missing_headers() {
        let extraction = extract(&SheetInput::Matrix(vec![]), &ExtractConfig::default());
        let rows = generate_field_report(&extraction.trace);
        assert_eq!(rows[0].field, "material_type");
        assert_eq!(rows[0].header, "-");
        assert_eq!(rows[0].source, "default");
    }
}
