//! # office-to-pdf-core
//!
//! Office document to PDF conversion library.
//!
//! - **Spreadsheets** (`.xlsx`, `.xlsm`) are laid out by a small page layout
//!   engine: proportional column widths, character-budget text wrapping,
//!   merged cells, and page breaks. Output is written with printpdf.
//! - **Word and PowerPoint** documents are converted by headless LibreOffice.
//! - **PDFs** can be rasterized to one PNG per page with pdfium.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use office_to_pdf_core::{ConversionRequest, Converter, ConverterConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let converter = Converter::new(ConverterConfig::default())?;
//!
//!     // Writes ./output/report.pdf
//!     let request = ConversionRequest::new("report.xlsx", "./output");
//!     let result = converter.convert(request).await?;
//!
//!     println!("Wrote {} page(s)", result.page_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Inspecting a layout
//!
//! ```rust,no_run
//! use office_to_pdf_core::{Converter, ConverterConfig};
//! use std::path::Path;
//!
//! let converter = Converter::new(ConverterConfig::default()).unwrap();
//! let (summary, canvas) = converter.excel_layout(Path::new("report.xlsx")).unwrap();
//! println!("{} rows on {} pages", summary.rows_rendered, summary.page_count);
//! println!("{}", canvas.to_json().unwrap());
//! ```

pub mod canvas;
pub mod config;
pub mod converter;
pub mod error;
pub mod layout;
pub mod office;
pub mod pdf_canvas;
pub mod pdf_renderer;
pub mod sheet;
pub mod text_layout;
pub mod xlsx;

// Re-export main types for convenience
pub use canvas::{Canvas, DrawCommand, RecordingCanvas};
pub use config::{
    BatchResult, ConversionRequest, ConverterConfig, FailedFile, FileResult, LayoutConfig,
    OfficeConfig, PageGeometry, PngPage, RenderConfig, SheetSelection,
};
pub use converter::{Converter, ConverterBuilder};
pub use error::{ConversionError, Result};
pub use layout::{LayoutSummary, TabularPageLayoutEngine};
pub use office::OfficeConverter;
pub use pdf_canvas::PdfCanvas;
pub use pdf_renderer::{PageInfo, PageIterator, PdfInfo, PdfRenderer};
pub use sheet::{CellValue, MergeSpan, Sheet};

use std::path::Path;

/// Supported input file extensions.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "docx", "doc", "pptx", "ppt", "pdf"];

/// Check if a file extension is supported.
pub fn is_supported_extension(ext: &str) -> bool {
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|&e| e.eq_ignore_ascii_case(ext))
}

/// Input document families, detected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// `.xlsx`, `.xlsm`
    Spreadsheet,
    /// `.docx`, `.doc`
    Word,
    /// `.pptx`, `.ppt`
    Presentation,
    /// `.pdf`
    Pdf,
}

impl DocumentKind {
    /// Detect the kind from an extension, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "xlsx" | "xlsm" => Some(DocumentKind::Spreadsheet),
            "docx" | "doc" => Some(DocumentKind::Word),
            "pptx" | "ppt" => Some(DocumentKind::Presentation),
            "pdf" => Some(DocumentKind::Pdf),
            _ => None,
        }
    }

    /// Detect the kind of a file path.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = extension_of(path);
        Self::from_extension(&ext).ok_or(ConversionError::UnsupportedFormat { extension: ext })
    }

    /// LibreOffice PDF export filter, for kinds converted by LibreOffice.
    pub fn export_filter(&self) -> Option<&'static str> {
        match self {
            DocumentKind::Word => Some("writer_pdf_Export"),
            DocumentKind::Presentation => Some("impress_pdf_Export"),
            DocumentKind::Spreadsheet | DocumentKind::Pdf => None,
        }
    }
}

/// Extension of `path` without the dot, or an empty string.
pub(crate) fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_string()
}

/// Initialize the library's logging.
/// Call this once at application startup if you want to see logs.
pub fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();
}
