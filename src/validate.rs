use crate::types::{AnalysisPayload, ValidationResult};

pub const MASS_ISSUE: &str = "mass_kg is 0 or missing";
pub const GRID_ISSUE: &str = "grid composition does not sum ~100%";

const GRID_SUM_MIN: f64 = 95.0;
const GRID_SUM_MAX: f64 = 105.0;

/// Advisory sanity checks. Never modifies the payload and never blocks;
/// callers show `issues` as warnings and may still send the payload.
pub fn validate(payload: &AnalysisPayload) -> ValidationResult {
    let mut issues = Vec::new();
    if payload.material.mass_kg == 0.0 || !payload.material.mass_kg.is_finite() {
        issues.push(MASS_ISSUE.to_string());
    }
    // An all-zero grid means "not provided" and is left alone.
    let grid_sum = payload.grid_composition.total();
    if grid_sum != 0.0 && !(GRID_SUM_MIN..=GRID_SUM_MAX).contains(&grid_sum) {
        issues.push(GRID_ISSUE.to_string());
    }
    ValidationResult { valid: issues.is_empty(), issues }
}
