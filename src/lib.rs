//! Spreadsheet-to-payload extraction for life cycle assessment inputs.
//!
//! Loosely structured sheets (key/value or tabular, current or legacy
//! headers, dirty cells) are turned into a fixed-shape
//! [`AnalysisPayload`](types::AnalysisPayload) for the remote analysis
//! service. The pipeline is pure and never fails on dirty data:
//! shape detection -> row selection -> field mapping -> validation.
pub mod catalog;
pub mod config;
pub mod error;
pub mod extract;
pub mod loader;
pub mod output;
pub mod quality;
pub mod reports;
pub mod selection;
pub mod shape;
pub mod types;
pub mod util;
pub mod validate;

pub use config::ExtractConfig;
pub use error::IngestError;
pub use extract::{extract, extract_analysis_payload, extract_scenarios, Extraction};
pub use types::{AnalysisPayload, Cell, Record, SheetInput, TransportMode, ValidationResult};
pub use validate::validate;
