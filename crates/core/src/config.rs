//! Configuration types for office-to-pdf conversion.

use crate::error::{ConversionError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Landscape A4 width in PDF points.
pub const A4_LANDSCAPE_WIDTH: f64 = 841.889_763_779_527_6;

/// Landscape A4 height in PDF points.
pub const A4_LANDSCAPE_HEIGHT: f64 = 595.275_590_551_181_2;

/// Page size and margins in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    /// Page width.
    pub width: f64,
    /// Page height.
    pub height: f64,
    /// Left margin.
    pub left_margin: f64,
    /// Right margin.
    pub right_margin: f64,
    /// Top margin. Also used as the bottom limit for page breaks.
    pub top_margin: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: A4_LANDSCAPE_WIDTH,
            height: A4_LANDSCAPE_HEIGHT,
            left_margin: 50.0,
            right_margin: 50.0,
            top_margin: 40.0,
        }
    }
}

impl PageGeometry {
    /// Create a geometry with the default margins and the given page size.
    pub fn with_size(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Set left and right margins.
    pub fn horizontal_margins(mut self, left: f64, right: f64) -> Self {
        self.left_margin = left;
        self.right_margin = right;
        self
    }

    /// Set the top margin.
    pub fn top_margin(mut self, top: f64) -> Self {
        self.top_margin = top;
        self
    }

    /// Width available to columns.
    pub fn printable_width(&self) -> f64 {
        self.width - self.left_margin - self.right_margin
    }

    /// Cursor position at the top of a fresh page.
    pub fn top_cursor(&self) -> f64 {
        self.height - self.top_margin
    }

    /// Validate the geometry.
    pub fn validate(&self) -> Result<()> {
        if !(self.width > 0.0) || !(self.height > 0.0) {
            return Err(ConversionError::InvalidConfig(
                "page width and height must be positive".to_string(),
            ));
        }
        if self.left_margin < 0.0 || self.right_margin < 0.0 || self.top_margin < 0.0 {
            return Err(ConversionError::InvalidConfig(
                "margins must not be negative".to_string(),
            ));
        }
        if self.printable_width() <= 0.0 {
            return Err(ConversionError::InvalidConfig(
                "horizontal margins leave no printable width".to_string(),
            ));
        }
        if self.top_cursor() <= self.top_margin {
            return Err(ConversionError::InvalidConfig(
                "top margin leaves no printable height".to_string(),
            ));
        }
        Ok(())
    }
}

/// Which worksheet of a workbook to lay out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetSelection {
    /// The workbook's active sheet.
    #[default]
    Active,
    /// Sheet by 0-based position.
    Index(usize),
    /// Sheet by name. A name made of digits that matches no sheet is
    /// taken as a 0-based position.
    Name(String),
}

impl SheetSelection {
    /// Parse a CLI-style selector. Numeric selectors stay names so tabs
    /// such as "2024" remain reachable; resolution falls back to position.
    pub fn parse(selector: &str) -> Self {
        SheetSelection::Name(selector.to_string())
    }
}

/// Configuration for the spreadsheet page layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Page geometry.
    pub page: PageGeometry,

    /// Height of a single text line within a row.
    /// Default: 24.
    pub base_row_height: f64,

    /// Font size used for measuring and rendering text.
    /// Default: 12.
    pub font_size: f64,

    /// Smaller size used in dense tables when text exceeds the budget.
    /// Default: 10.
    pub fallback_font_size: f64,

    /// Vertical distance between wrapped lines.
    /// Default: 12.
    pub line_spacing: f64,

    /// Horizontal inset of text from the cell's left edge.
    /// Default: 2.
    pub text_inset: f64,

    /// Distance from the row top to the first baseline.
    /// Default: 15.
    pub baseline_offset: f64,

    /// Fraction of populated cells at which a sheet counts as a dense table.
    /// Default: 0.90.
    pub dense_threshold: f64,

    /// Multiplier in the character budget `width * factor / font_size`.
    /// Default: 1.03.
    pub width_factor: f64,

    /// Estimated glyph width as a fraction of the font size, used when
    /// spreading sparse text over neighbouring empty cells.
    /// Default: 0.5.
    pub glyph_width_ratio: f64,

    /// Character count of the widest sparse text block at 12pt.
    /// Default: 61.
    pub sparse_max_chars: u32,

    /// Excel width assumed for columns without a declared width.
    /// Default: 10.
    pub default_column_width: f64,

    /// TrueType font embedded into generated PDFs. None uses Helvetica.
    pub font_path: Option<PathBuf>,

    /// Worksheet to convert.
    pub sheet: SheetSelection,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page: PageGeometry::default(),
            base_row_height: 24.0,
            font_size: 12.0,
            fallback_font_size: 10.0,
            line_spacing: 12.0,
            text_inset: 2.0,
            baseline_offset: 15.0,
            dense_threshold: 0.90,
            width_factor: 1.03,
            glyph_width_ratio: 0.5,
            sparse_max_chars: 61,
            default_column_width: 10.0,
            font_path: None,
            sheet: SheetSelection::Active,
        }
    }
}

impl LayoutConfig {
    /// Create a layout config for the given page geometry.
    pub fn with_page(page: PageGeometry) -> Self {
        Self {
            page,
            ..Default::default()
        }
    }

    /// Set the font embedded into the PDF.
    pub fn font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_path = Some(path.into());
        self
    }

    /// Select the worksheet to convert.
    pub fn sheet(mut self, sheet: SheetSelection) -> Self {
        self.sheet = sheet;
        self
    }

    /// Set the density threshold.
    pub fn dense_threshold(mut self, threshold: f64) -> Self {
        self.dense_threshold = threshold;
        self
    }

    /// Widest sparse text block in points at the given font size.
    pub fn sparse_width_cap(&self, font_size: f64) -> f64 {
        f64::from(self.sparse_max_chars) * 12.0 * 12.0 / font_size
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.page.validate()?;
        if !(self.base_row_height > 0.0) {
            return Err(ConversionError::InvalidConfig(
                "base_row_height must be positive".to_string(),
            ));
        }
        if !(self.font_size > 0.0) || !(self.fallback_font_size > 0.0) {
            return Err(ConversionError::InvalidConfig(
                "font sizes must be positive".to_string(),
            ));
        }
        if !(self.dense_threshold > 0.0 && self.dense_threshold <= 1.0) {
            return Err(ConversionError::InvalidConfig(
                "dense_threshold must be in (0, 1]".to_string(),
            ));
        }
        if !(self.width_factor > 0.0) || !(self.glyph_width_ratio > 0.0) {
            return Err(ConversionError::InvalidConfig(
                "width_factor and glyph_width_ratio must be positive".to_string(),
            ));
        }
        if self.sparse_max_chars == 0 {
            return Err(ConversionError::InvalidConfig(
                "sparse_max_chars must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for PDF to PNG rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output DPI (dots per inch).
    /// Default: 144 (a zoom factor of 2).
    pub dpi: u32,

    /// Number of threads for parallel PNG encoding.
    /// Default: number of CPU cores.
    pub render_threads: usize,

    /// PNG compression level (0-9, higher = smaller file, slower).
    /// Default: 6.
    pub png_compression: u8,

    /// Whether to keep the alpha channel (transparency).
    /// Default: false.
    pub use_alpha: bool,

    /// Background color for pages (if not using alpha).
    /// Default: white (255, 255, 255).
    pub background_color: (u8, u8, u8),
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: 144,
            render_threads: num_cpus::get(),
            png_compression: 6,
            use_alpha: false,
            background_color: (255, 255, 255),
        }
    }
}

impl RenderConfig {
    /// Create a render config with specified DPI.
    pub fn with_dpi(dpi: u32) -> Self {
        Self {
            dpi,
            ..Default::default()
        }
    }

    /// Create a render config from a zoom factor relative to 72 DPI.
    pub fn with_zoom(zoom: f32) -> Self {
        Self::with_dpi((72.0 * zoom).round().max(0.0) as u32)
    }

    /// Set the number of render threads.
    pub fn render_threads(mut self, threads: usize) -> Self {
        self.render_threads = threads;
        self
    }

    /// Set PNG compression level.
    pub fn png_compression(mut self, level: u8) -> Self {
        self.png_compression = level.min(9);
        self
    }

    /// Enable alpha channel.
    pub fn use_alpha(mut self, enabled: bool) -> Self {
        self.use_alpha = enabled;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.dpi == 0 || self.dpi > 1200 {
            return Err(ConversionError::InvalidConfig(
                "dpi must be between 1 and 1200".to_string(),
            ));
        }
        if self.render_threads == 0 {
            return Err(ConversionError::InvalidConfig(
                "render_threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for LibreOffice-backed Word/PowerPoint conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OfficeConfig {
    /// Path to soffice binary. If None, searches known locations and PATH.
    pub soffice_path: Option<PathBuf>,

    /// Timeout for a single document conversion.
    /// Default: 120 seconds.
    pub conversion_timeout: Duration,

    /// Directory for temporary profiles and output.
    /// Default: system temp directory.
    pub temp_dir: Option<PathBuf>,
}

impl Default for OfficeConfig {
    fn default() -> Self {
        Self {
            soffice_path: None,
            conversion_timeout: Duration::from_secs(120),
            temp_dir: None,
        }
    }
}

impl OfficeConfig {
    /// Set the soffice binary path.
    pub fn soffice_path(mut self, path: PathBuf) -> Self {
        self.soffice_path = Some(path);
        self
    }

    /// Set the conversion timeout.
    pub fn conversion_timeout(mut self, timeout: Duration) -> Self {
        self.conversion_timeout = timeout;
        self
    }

    /// Set the temporary directory.
    pub fn temp_dir(mut self, dir: PathBuf) -> Self {
        self.temp_dir = Some(dir);
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.conversion_timeout.as_secs() == 0 {
            return Err(ConversionError::InvalidConfig(
                "conversion_timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Combined configuration for the converter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Spreadsheet layout configuration.
    pub layout: LayoutConfig,

    /// PDF rasterization configuration.
    pub render: RenderConfig,

    /// Word/PowerPoint conversion configuration.
    pub office: OfficeConfig,
}

impl ConverterConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration.
    pub fn validate(&self) -> Result<()> {
        self.layout.validate()?;
        self.render.validate()?;
        self.office.validate()?;
        Ok(())
    }
}

/// A single conversion request.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Path to the input document.
    pub input_path: PathBuf,

    /// Directory receiving the PDF (documents) or the page folder (PDFs).
    pub output_dir: PathBuf,
}

impl ConversionRequest {
    /// Create a new conversion request.
    pub fn new(input_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Input file name without extension.
    pub fn input_stem(&self) -> String {
        self.input_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output")
            .to_string()
    }

    /// Path of the PDF produced for a document input.
    pub fn pdf_output_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.pdf", self.input_stem()))
    }
}

/// Result of a batch conversion operation.
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Successfully converted files.
    pub successful: Vec<FileResult>,

    /// Failed conversions.
    pub failed: Vec<FailedFile>,

    /// Total processing time.
    pub total_duration: Duration,

    /// Total pages produced.
    pub total_pages: usize,
}

/// Result for a single successfully converted file.
#[derive(Debug, Clone)]
pub struct FileResult {
    /// Original input path.
    pub input_path: PathBuf,

    /// Produced files: one PDF, or one PNG per page.
    pub output_paths: Vec<PathBuf>,

    /// Number of pages.
    pub page_count: usize,

    /// Processing time for this file.
    pub duration: Duration,
}

/// Information about a failed conversion.
#[derive(Debug, Clone)]
pub struct FailedFile {
    /// Original input path.
    pub input_path: PathBuf,

    /// Error message.
    pub error: String,
}

/// A single rendered page.
#[derive(Debug, Clone)]
pub struct PngPage {
    /// Page number (1-indexed).
    pub page_number: usize,

    /// PNG image data.
    pub data: Vec<u8>,

    /// Image width in pixels.
    pub width: u32,

    /// Image height in pixels.
    pub height: u32,

    /// Path where the PNG was written (if saved to disk).
    pub output_path: Option<PathBuf>,
}
