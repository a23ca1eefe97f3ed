//! Main converter orchestrator tying the spreadsheet layout engine,
//! LibreOffice and the PDF renderer together.

use crate::canvas::RecordingCanvas;
use crate::config::{
    BatchResult, ConversionRequest, ConverterConfig, FailedFile, FileResult, PageGeometry,
    SheetSelection,
};
use crate::error::{ConversionError, Result};
use crate::layout::{LayoutSummary, TabularPageLayoutEngine};
use crate::office::OfficeConverter;
use crate::pdf_canvas::PdfCanvas;
use crate::pdf_renderer::PdfRenderer;
use crate::sheet::Sheet;
use crate::xlsx;
use crate::DocumentKind;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Converts office documents to PDF and PDFs to page images.
///
/// LibreOffice and pdfium are only located when a conversion needs them, so
/// spreadsheet conversion works on hosts that have neither.
pub struct Converter {
    config: ConverterConfig,
    engine: TabularPageLayoutEngine,
    office: OnceLock<OfficeConverter>,
    renderer: OnceLock<PdfRenderer>,
}

impl Converter {
    /// Create a new converter with the given configuration.
    pub fn new(config: ConverterConfig) -> Result<Self> {
        config.validate()?;
        let engine = TabularPageLayoutEngine::new(config.layout.clone())?;

        debug!(
            "Converter configured: sheet={:?}, font={:?}, dpi={}",
            config.layout.sheet, config.layout.font_path, config.render.dpi
        );

        Ok(Self {
            config,
            engine,
            office: OnceLock::new(),
            renderer: OnceLock::new(),
        })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    fn office(&self) -> Result<&OfficeConverter> {
        if let Some(office) = self.office.get() {
            return Ok(office);
        }
        let office = OfficeConverter::new(self.config.office.clone())?;
        Ok(self.office.get_or_init(|| office))
    }

    fn renderer(&self) -> Result<&PdfRenderer> {
        if let Some(renderer) = self.renderer.get() {
            return Ok(renderer);
        }
        let renderer = PdfRenderer::new(self.config.render.clone())?;
        Ok(self.renderer.get_or_init(|| renderer))
    }

    fn require_kind(input: &Path, accepted: &[DocumentKind]) -> Result<DocumentKind> {
        if !input.exists() {
            return Err(ConversionError::InputNotFound(input.to_path_buf()));
        }
        let kind = DocumentKind::from_path(input)?;
        if !accepted.contains(&kind) {
            return Err(ConversionError::UnsupportedFormat {
                extension: crate::extension_of(input),
            });
        }
        Ok(kind)
    }

    /// Lay out the configured worksheet of `input` and write it as a PDF.
    pub fn excel_to_pdf(&self, input: &Path, output: &Path) -> Result<LayoutSummary> {
        Self::require_kind(input, &[DocumentKind::Spreadsheet])?;

        let sheet = xlsx::load_sheet(input, &self.config.layout.sheet)?;
        self.write_sheet_pdf(&sheet, input, output)
    }

    /// Lay out the configured worksheet of `input` without writing a file.
    pub fn excel_layout(&self, input: &Path) -> Result<(LayoutSummary, RecordingCanvas)> {
        Self::require_kind(input, &[DocumentKind::Spreadsheet])?;

        let sheet = xlsx::load_sheet(input, &self.config.layout.sheet)?;
        self.record_layout(&sheet)
    }

    /// Write the PDF for `input` and return the recorded drawing commands of
    /// the same layout. The workbook is read once.
    pub fn excel_to_pdf_recorded(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<(LayoutSummary, RecordingCanvas)> {
        Self::require_kind(input, &[DocumentKind::Spreadsheet])?;

        let sheet = xlsx::load_sheet(input, &self.config.layout.sheet)?;
        let (_, recording) = self.record_layout(&sheet)?;
        let summary = self.write_sheet_pdf(&sheet, input, output)?;
        Ok((summary, recording))
    }

    fn record_layout(&self, sheet: &Sheet) -> Result<(LayoutSummary, RecordingCanvas)> {
        let mut canvas = RecordingCanvas::new();
        let summary = self.engine.render(sheet, &mut canvas)?;
        Ok((summary, canvas))
    }

    fn write_sheet_pdf(&self, sheet: &Sheet, input: &Path, output: &Path) -> Result<LayoutSummary> {
        let title = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Spreadsheet");
        let mut canvas = PdfCanvas::new(
            title,
            self.config.layout.page,
            self.config.layout.font_path.as_deref(),
        )?;

        let summary = self.engine.render(sheet, &mut canvas)?;
        canvas.save(output)?;

        info!("Conversion complete: {:?} to {:?}", input, output);
        Ok(summary)
    }

    /// Convert a Word or PowerPoint document to a PDF at `output`.
    pub async fn office_to_pdf(&self, input: &Path, output: &Path) -> Result<PathBuf> {
        Self::require_kind(input, &[DocumentKind::Word, DocumentKind::Presentation])?;

        let written = self.office()?.convert_to_pdf(input, output).await?;
        info!("Conversion complete: {:?} to {:?}", input, written);
        Ok(written)
    }

    /// Render every page of a PDF to `<output_base>/<stem>/page_<n>.png`.
    pub fn pdf_to_images(&self, input: &Path, output_base: &Path) -> Result<FileResult> {
        let start = Instant::now();
        if !input.exists() {
            return Err(ConversionError::InputNotFound(input.to_path_buf()));
        }

        let pages = self.renderer()?.render_to_folder(input, output_base)?;
        let output_paths: Vec<PathBuf> = pages
            .iter()
            .filter_map(|p| p.output_path.clone())
            .collect();

        info!(
            "Converted {:?} to {} image(s) in {:?}",
            input,
            pages.len(),
            start.elapsed()
        );

        Ok(FileResult {
            input_path: input.to_path_buf(),
            output_paths,
            page_count: pages.len(),
            duration: start.elapsed(),
        })
    }

    /// Convert a single input, choosing the pipeline from its extension.
    ///
    /// Documents become `<output_dir>/<stem>.pdf`; PDFs become page images
    /// under `output_dir`.
    pub async fn convert(&self, request: ConversionRequest) -> Result<FileResult> {
        let start = Instant::now();
        let input_path = request.input_path.clone();

        if !input_path.exists() {
            return Err(ConversionError::InputNotFound(input_path));
        }
        let kind = DocumentKind::from_path(&input_path)?;
        info!("Converting {:?} ({:?})", input_path, kind);

        let pdf_path = request.pdf_output_path();
        let page_count = match kind {
            DocumentKind::Spreadsheet => self.excel_to_pdf(&input_path, &pdf_path)?.page_count,
            DocumentKind::Word | DocumentKind::Presentation => {
                self.office_to_pdf(&input_path, &pdf_path).await?;
                self.count_pages(&pdf_path)
            }
            DocumentKind::Pdf => return self.pdf_to_images(&input_path, &request.output_dir),
        };

        Ok(FileResult {
            input_path,
            output_paths: vec![pdf_path],
            page_count,
            duration: start.elapsed(),
        })
    }

    /// Pages of a LibreOffice-produced PDF, or 0 when pdfium is unavailable.
    fn count_pages(&self, pdf_path: &Path) -> usize {
        match self.renderer().and_then(|r| r.page_count(pdf_path)) {
            Ok(count) => count,
            Err(e) => {
                debug!("Page count unavailable for {:?}: {}", pdf_path, e);
                0
            }
        }
    }

    /// Convert multiple inputs one after another. Failures are recorded
    /// and do not stop the batch.
    pub async fn convert_batch(&self, requests: Vec<ConversionRequest>) -> BatchResult {
        let start = Instant::now();
        let mut successful = Vec::new();
        let mut failed = Vec::new();
        let mut total_pages = 0;

        for request in requests {
            let input_path = request.input_path.clone();
            match self.convert(request).await {
                Ok(result) => {
                    total_pages += result.page_count;
                    successful.push(result);
                }
                Err(e) => {
                    error!("Failed to convert {:?}: {}", input_path, e);
                    failed.push(FailedFile {
                        input_path,
                        error: e.to_string(),
                    });
                }
            }
        }

        BatchResult {
            successful,
            failed,
            total_duration: start.elapsed(),
            total_pages,
        }
    }
}

impl Converter {
    /// Convert inputs with up to `concurrency` conversions in flight.
    ///
    /// Only LibreOffice conversions overlap; spreadsheet layout and PDF
    /// rendering run on the calling task. Results are in completion order.
    pub async fn convert_parallel(
        &self,
        requests: Vec<ConversionRequest>,
        concurrency: usize,
    ) -> BatchResult {
        let start = Instant::now();

        let results: Vec<(PathBuf, Result<FileResult>)> = stream::iter(requests)
            .map(|request| async move {
                let input_path = request.input_path.clone();
                (input_path, self.convert(request).await)
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        let mut successful = Vec::new();
        let mut failed = Vec::new();
        let mut total_pages = 0;

        for (input_path, result) in results {
            match result {
                Ok(file_result) => {
                    total_pages += file_result.page_count;
                    successful.push(file_result);
                }
                Err(e) => {
                    error!("Failed to convert {:?}: {}", input_path, e);
                    failed.push(FailedFile {
                        input_path,
                        error: e.to_string(),
                    });
                }
            }
        }

        BatchResult {
            successful,
            failed,
            total_duration: start.elapsed(),
            total_pages,
        }
    }
}

/// Builder for creating a Converter with custom settings.
pub struct ConverterBuilder {
    config: ConverterConfig,
}

impl ConverterBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ConverterConfig::default(),
        }
    }

    /// Start from an existing configuration.
    pub fn from_config(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Set the page geometry used for spreadsheets.
    pub fn page(mut self, page: PageGeometry) -> Self {
        self.config.layout.page = page;
        self
    }

    /// Set the TrueType font embedded into spreadsheet PDFs.
    pub fn font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.layout.font_path = Some(path.into());
        self
    }

    /// Select the worksheet to convert.
    pub fn sheet(mut self, sheet: SheetSelection) -> Self {
        self.config.layout.sheet = sheet;
        self
    }

    /// Set the DPI for rendering.
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.render.dpi = dpi;
        self
    }

    /// Set the number of render threads.
    pub fn render_threads(mut self, threads: usize) -> Self {
        self.config.render.render_threads = threads;
        self
    }

    /// Set the conversion timeout.
    pub fn conversion_timeout(mut self, timeout: Duration) -> Self {
        self.config.office.conversion_timeout = timeout;
        self
    }

    /// Set the path to soffice binary.
    pub fn soffice_path(mut self, path: PathBuf) -> Self {
        self.config.office.soffice_path = Some(path);
        self
    }

    /// Set the temporary directory.
    pub fn temp_dir(mut self, dir: PathBuf) -> Self {
        self.config.office.temp_dir = Some(dir);
        self
    }

    /// Build the converter.
    pub fn build(self) -> Result<Converter> {
        Converter::new(self.config)
    }
}

impl Default for ConverterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
