// Utility helpers for coercing raw cells and formatting numbers.
//
// This module centralizes all the "dirty" spreadsheet handling so the
// rest of the code can assume clean, typed values.
use crate::types::Cell;
use num_format::{Locale, ToFormattedString};
use once_cell::sync::Lazy;
use regex::Regex;

// Signed decimal with optional exponent, e.g. `-1.5`, `.25`, `3e-4`.
static NUMBER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[-+]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][-+]?[0-9]+)?")
        .expect("number pattern compiles")
});

/// Pull a finite number out of a cell while being forgiving about the
/// formatting users type into spreadsheets (units, commas, stray text).
///
/// - Numeric cells are returned as-is when finite.
/// - Text has thousands separators like `","` stripped, then the first
///   number-looking substring is parsed (`"1,250 kg"` -> `1250`).
/// - Returns `None` for blanks, booleans and text without digits.
pub fn parse_number(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Text(s) => {
            let s = s.replace(',', "");
            let m = NUMBER_PATTERN.find(&s)?;
            m.as_str().parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}

/// Like [`parse_number`] but never fails: anything unparseable becomes
/// `default`.
pub fn to_number(cell: &Cell, default: f64) -> f64 {
    parse_number(cell).unwrap_or(default)
}

/// Trimmed text content of a cell, or `None` when it is blank.
pub fn first_non_empty_string(cell: &Cell) -> Option<String> {
    if cell.is_blank() {
        return None;
    }
    let s = cell.to_string();
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Lowercase and drop everything that is not a letter or digit, so
/// `"Mass (kg)"`, `"mass_kg"` and `"MassKg"` compare equal.
pub fn normalize_header(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

pub fn average(v: &[f64]) -> f64 {
    // Returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals with locale-aware thousands separators (`1,234.50`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let mut res = match int_part.parse::<i64>() {
        Ok(int_val) => int_val.to_formatted_string(&Locale::en),
        Err(_) => int_part.to_string(),
    };
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    } else if decimals > 0 {
        res.push('.');
        res.push_str(&"0".repeat(decimals));
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Used for counts in console messages (e.g., `1,204 rows loaded`).
    n.to_formatted_string(&Locale::en)
}
