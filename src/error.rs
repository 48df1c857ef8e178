use thiserror::Error;

/// Failure to decode an uploaded file as its declared kind.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Unsupported file type: {0} (expected .csv, .xlsx or .xls)")]
    UnsupportedKind(String),

    #[error("Could not read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Could not read spreadsheet: {0}")]
    Excel(String),

    #[error("File has no header row")]
    Empty,
}

#[derive(Error, Debug)]
pub enum TableroError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Chart error: {0}")]
    Chart(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TableroError>;
