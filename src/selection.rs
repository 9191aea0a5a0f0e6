//! Best-row selection for tabular sheets.
//!
//! A table may hold template rows, half-filled rows and the real data row.
//! Each row is scored by how much usable data it carries and the best one
//! feeds the payload.
use crate::catalog::{lookup_field, mapped_number, FieldKey, SCORED_FIELDS};
use crate::config::ExtractConfig;
use crate::types::Record;
use crate::util::{first_non_empty_string, parse_number};
use tracing::{debug, warn};

const MATERIAL_SCORE: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSelection {
    /// Index into the candidate rows (blank rows already removed).
    pub index: usize,
    pub score: u32,
    /// Set when the top scorer was all zeros and another row was used.
    pub fallback_used: bool,
}

/// Drop fully blank rows. Always returns at least one row so downstream
/// mapping has something to read defaults against.
pub fn candidate_rows(rows: &[Record]) -> Vec<Record> {
    let kept: Vec<Record> = rows.iter().filter(|r| !r.is_blank()).cloned().collect();
    if kept.is_empty() {
        vec![Record::new()]
    } else {
        kept
    }
}

pub fn score_row(row: &Record) -> u32 {
    let material = lookup_field(row, FieldKey::MaterialType)
        .and_then(|(_, cell)| first_non_empty_string(cell))
        .map_or(0, |_| MATERIAL_SCORE);
    let numeric = SCORED_FIELDS
        .iter()
        .filter(|key| {
            lookup_field(row, **key)
                .and_then(|(_, cell)| parse_number(cell))
                .is_some_and(|v| v != 0.0)
        })
        .count() as u32;
    material + numeric
}

/// True when the mapped mass and every configured indicator field come out
/// as zero. Blank or missing cells map to their defaults, so only explicit
/// zeros count.
pub fn is_zero_row(row: &Record, config: &ExtractConfig) -> bool {
    mapped_number(row, FieldKey::MassKg) == 0.0
        && config
            .zero_row_indicators
            .iter()
            .all(|key| mapped_number(row, *key) == 0.0)
}

/// Pick the row to map. Ties keep the first highest scorer.
pub fn select_best_row(candidates: &[Record], config: &ExtractConfig) -> RowSelection {
    let mut best = RowSelection { index: 0, score: 0, fallback_used: false };
    for (idx, row) in candidates.iter().enumerate() {
        let score = score_row(row);
        debug!(row = idx, score, "scored candidate row");
        if idx == 0 || score > best.score {
            best.index = idx;
            best.score = score;
        }
    }

    if candidates.len() > 1 && is_zero_row(&candidates[best.index], config) {
        let alternate = if best.index == 0 { 1 } else { 0 };
        if mapped_number(&candidates[alternate], FieldKey::MassKg) != 0.0 {
            warn!(
                selected = best.index,
                alternate, "selected row carries only zeros, using alternate row"
            );
            return RowSelection {
                index: alternate,
                score: score_row(&candidates[alternate]),
                fallback_used: true,
            };
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Record {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    // Example row with mass and the four energy/emission fields all at zero.
    fn template(extra: &[(&str, &str)]) -> Record {
        let mut r = row(&[
            ("Material", "Example"),
            ("Mass_kg", "0"),
            ("EI_process", "0"),
            ("EI_recycled", "0"),
            ("EF_direct", "0"),
            ("EF_direct_recycled", "0"),
        ]);
        for (k, v) in extra {
            r.push(*k, *v);
        }
        r
    }

    #[test]
    fn blank_rows_are_dropped() {
        let rows = vec![
            row(&[("Material", ""), ("Mass_kg", "  ")]),
            row(&[("Material", "Zinc"), ("Mass_kg", "")]),
        ];
        let kept = candidate_rows(&rows);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0], rows[1]);
    }

    #[test]
    fn all_blank_rows_synthesize_one_empty_row() {
        let rows = vec![row(&[("Material", "")]), Record::new()];
        assert_eq!(candidate_rows(&rows), vec![Record::new()]);
        assert_eq!(candidate_rows(&[]), vec![Record::new()]);
    }

    #[test]
    fn score_counts_material_and_nonzero_numbers() {
        let r = row(&[
            ("Material", "Copper"),
            ("Mass_kg", "150"),
            ("EI_process", "0"),
            ("Coal_pct", "40 %"),
            ("Virgin_EF", "n/a"),
            ("Notes", "12"),
        ]);
        assert_eq!(score_row(&r), 5 + 2);
        assert_eq!(score_row(&Record::new()), 0);
    }

    #[test]
    fn highest_score_wins_and_ties_keep_first() {
        let config = ExtractConfig::default();
        let rows = vec![
            row(&[("Mass_kg", "10")]),
            row(&[("Mass_kg", "20"), ("EI_process", "3")]),
            row(&[("Mass_kg", "30"), ("EI_process", "4")]),
        ];
        let pick = select_best_row(&rows, &config);
        assert_eq!(pick.index, 1);
        assert_eq!(pick.score, 2);
        assert!(!pick.fallback_used);
    }

    #[test]
    fn zero_template_row_falls_back_to_alternate() {
        let config = ExtractConfig::default();
        // The template row wins on score thanks to its material label.
        let rows = vec![
            template(&[("Coal_pct", "50")]),
            row(&[("Mass_kg", "120"), ("EI_process", "5")]),
        ];
        assert_eq!(score_row(&rows[0]), 6);
        assert_eq!(score_row(&rows[1]), 2);
        let pick = select_best_row(&rows, &config);
        assert_eq!(pick.index, 1);
        assert!(pick.fallback_used);
    }

    #[test]
    fn fallback_needs_nonzero_alternate_mass() {
        let config = ExtractConfig::default();
        let rows = vec![template(&[]), row(&[("Mass_kg", "0"), ("EI_process", "5")])];
        let pick = select_best_row(&rows, &config);
        assert_eq!(pick.index, 0);
        assert!(!pick.fallback_used);
    }

    #[test]
    fn blank_mass_is_not_a_zero_row() {
        let config = ExtractConfig::default();
        let rows = vec![
            row(&[("Material", "Copper"), ("Mass_kg", "")]),
            row(&[("Material", ""), ("Mass_kg", "50")]),
        ];
        assert!(!is_zero_row(&rows[0], &config));
        let pick = select_best_row(&rows, &config);
        assert_eq!(pick.index, 0);
        assert!(!pick.fallback_used);
    }

    #[test]
    fn alternate_with_blank_mass_maps_to_default_mass() {
        let config = ExtractConfig::default();
        let rows = vec![template(&[]), row(&[("Mass_kg", ""), ("EI_process", "9")])];
        assert!(is_zero_row(&rows[0], &config));
        let pick = select_best_row(&rows, &config);
        assert_eq!(pick.index, 1);
        assert!(pick.fallback_used);
    }

    #[test]
    fn indicator_list_is_configurable() {
        let r = row(&[("Mass_kg", "0"), ("EI_process", "4")]);
        assert!(!is_zero_row(&r, &ExtractConfig::default()));
        let config = ExtractConfig { zero_row_indicators: vec![], ..ExtractConfig::default() };
        assert!(is_zero_row(&r, &config));
    }
}
