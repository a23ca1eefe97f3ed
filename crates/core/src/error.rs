//! Error types for office-to-pdf conversion.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the office-to-pdf library.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// Input file not found.
    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    /// Unsupported file format.
    #[error("Unsupported file format: {extension}. Supported: .xlsx, .xlsm, .docx, .doc, .pptx, .ppt, .pdf")]
    UnsupportedFormat { extension: String },

    /// The workbook could not be parsed.
    #[error("Failed to read spreadsheet '{path}': {message}")]
    SpreadsheetError { path: PathBuf, message: String },

    /// The requested worksheet does not exist.
    #[error("Worksheet not found: {0}")]
    SheetNotFound(String),

    /// The font file could not be loaded or registered.
    #[error("Failed to load font '{path}': {message}")]
    FontError { path: PathBuf, message: String },

    /// PDF generation failed.
    #[error("PDF generation failed: {0}")]
    PdfWriteError(String),

    /// Generic I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LibreOffice is not installed or not found in PATH.
    #[error("LibreOffice not found. Please install LibreOffice and ensure 'soffice' is in PATH")]
    LibreOfficeNotFound,

    /// LibreOffice process failed to start.
    #[error("Failed to start LibreOffice process: {0}")]
    ProcessStartFailed(String),

    /// LibreOffice conversion failed.
    #[error("LibreOffice conversion failed for '{path}': {message}")]
    ConversionFailed { path: PathBuf, message: String },

    /// LibreOffice process timed out.
    #[error("LibreOffice conversion timed out after {timeout_secs} seconds for '{path}'")]
    Timeout { path: PathBuf, timeout_secs: u64 },

    /// PDF rendering failed.
    #[error("PDF rendering failed: {0}")]
    PdfRenderError(String),

    /// Pdfium library error.
    #[error("Pdfium error: {0}")]
    PdfiumError(String),

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    PngEncodingError(String),

    /// Output directory creation failed.
    #[error("Failed to create output directory '{path}': {message}")]
    OutputDirError { path: PathBuf, message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigError(#[from] serde_json::Error),
}

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, ConversionError>;

impl From<printpdf::Error> for ConversionError {
    fn from(e: printpdf::Error) -> Self {
        ConversionError::PdfWriteError(e.to_string())
    }
}
