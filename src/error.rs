use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, summarising or exporting data.
#[derive(Error, Debug)]
pub enum StatError {
    #[error("Unsupported file format: .{0}")]
    UnsupportedFormat(String),

    #[error("Cannot open workbook {path:?}: {message}")]
    Workbook { path: PathBuf, message: String },

    #[error("Cannot read sheet '{sheet}': {message}")]
    Sheet { sheet: String, message: String },

    #[error("No {0} selected.")]
    NothingSelected(&'static str),

    #[error("Failed to render chart: {0}")]
    Chart(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Excel export error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Session format error: {0}")]
    Session(#[from] serde_json::Error),

    #[error("Clipboard error: {0}")]
    Clipboard(#[from] arboard::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StatError>;
