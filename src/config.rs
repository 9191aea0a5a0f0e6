use crate::catalog::FieldKey;
use crate::error::IngestError;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Tunables for payload extraction. Every key is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Material type used when the sheet names none.
    pub default_material: String,
    /// Fields that, together with mass, must all be zero before the
    /// best-row fallback looks at another row.
    pub zero_row_indicators: Vec<FieldKey>,
    /// Above this distance an unspecified transport mode becomes `ship`.
    pub ship_distance_threshold_km: f64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            default_material: "steel".to_string(),
            zero_row_indicators: vec![
                FieldKey::VirginEnergyKwhPerKg,
                FieldKey::RecycledEnergyKwhPerKg,
                FieldKey::VirginDirectEmissions,
                FieldKey::RecycledDirectEmissions,
            ],
            ship_distance_threshold_km: 1200.0,
        }
    }
}

pub fn load(path: &Path) -> Result<ExtractConfig, IngestError> {
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: display.clone(),
        source,
    })?;
    let config: ExtractConfig = serde_json::from_str(&raw).map_err(|source| IngestError::Config {
        path: display.clone(),
        source,
    })?;
    info!(path = %path.display(), ?config, "loaded extraction config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_keys_take_defaults() {
        let config: ExtractConfig =
            serde_json::from_str(r#"{"default_material": "aluminum"}"#).unwrap();
        assert_eq!(config.default_material, "aluminum");
        assert_eq!(config.ship_distance_threshold_km, 1200.0);
        assert_eq!(config.zero_row_indicators.len(), 4);
    }

    #[test]
    fn indicators_use_snake_case_names() {
        let raw = r#"{"zero_row_indicators": ["virgin_energy_kwh_per_kg", "coal_percent"]}"#;
        let config: ExtractConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(
            config.zero_row_indicators,
            vec![FieldKey::VirginEnergyKwhPerKg, FieldKey::CoalPercent]
        );
    }

    #[test]
    fn load_reports_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = load(file.path()).unwrap_err();
        assert!(matches!(err, IngestError::Config { .. }));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"ship_distance_threshold_km": 800}}"#).unwrap();
        let config = load(file.path()).unwrap();
        assert_eq!(config.ship_distance_threshold_km, 800.0);
        assert_eq!(config.default_material, "steel");
    }
}
