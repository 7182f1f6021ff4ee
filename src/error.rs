use thiserror::Error;

/// Errors surfaced by the data layer.
///
/// All of these are local and recoverable: callers degrade the affected
/// feature (search or matching) instead of aborting the process.
#[derive(Error, Debug)]
pub enum Error {
    #[error("unsupported sample file extension: .{0}")]
    UnsupportedExtension(String),
    #[error("reference table is missing required column '{0}'")]
    MissingReferenceColumn(&'static str),
    #[error("no chemical-shift column found (accepted headers: ppm, Shift, Chemical Shift)")]
    MissingShiftColumn,
    #[error("row {row}: '{value}' is not a number")]
    InvalidNumber { row: usize, value: String },
    #[error("column type {0} is not numeric")]
    NonNumericColumn(String),
    #[error("invalid sample JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),
    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),
}
