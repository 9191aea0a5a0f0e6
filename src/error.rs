use thiserror::Error;

/// Failures at the I/O boundary. The extraction core itself never fails on
/// dirty data; these cover unreadable files and callers handing over
/// something that is not a sheet at all.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("failed to open workbook {path}: {source}")]
    Workbook {
        path: String,
        #[source]
        source: calamine::Error,
    },
    #[error("workbook {0} contains no worksheets")]
    NoWorksheet(String),
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported file type `.{0}` (expected csv, xlsx, xlsm, xlsb, xls, ods or json)")]
    UnsupportedExtension(String),
    #[error("unsupported sheet shape: {0}")]
    UnsupportedShape(String),
    #[error("invalid config {path}: {source}")]
    Config {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
