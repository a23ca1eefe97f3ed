use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Lays out a worksheet of an .xlsx/.xlsm workbook as a PDF
    Excel(ExcelArgs),
    /// Converts a .docx/.doc document to PDF with LibreOffice
    Word(OfficeArgs),
    /// Converts a .pptx/.ppt presentation to PDF with LibreOffice
    Ppt(OfficeArgs),
    /// Renders every page of a PDF to <output-dir>/<name>/page_<n>.png
    PdfToImages(PdfToImagesArgs),
    /// Converts any number of supported files, picking the pipeline by extension
    Convert(ConvertArgs),
}

#[derive(Args, Debug)]
pub struct ExcelArgs {
    /// Workbook to convert
    pub input: PathBuf,
    /// PDF file to write
    pub output: PathBuf,
    /// TrueType font to embed instead of Helvetica
    #[clap(long)]
    pub font: Option<PathBuf>,
    /// Worksheet to convert by name, or by 0-based index when no tab has that name (default: active sheet)
    #[clap(long)]
    pub sheet: Option<String>,
    /// JSON configuration file
    #[clap(long)]
    pub config: Option<PathBuf>,
    /// Also write the drawing commands of the layout as JSON
    #[clap(long, value_name = "FILE")]
    pub dump_layout: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct OfficeArgs {
    /// Document to convert
    pub input: PathBuf,
    /// PDF file to write
    pub output: PathBuf,
    /// Path to the soffice binary
    #[clap(long)]
    pub soffice: Option<PathBuf>,
    /// Conversion timeout in seconds
    #[clap(long, value_name = "SECS")]
    pub timeout: Option<u64>,
    /// JSON configuration file
    #[clap(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct PdfToImagesArgs {
    /// PDF to render
    pub input: PathBuf,
    /// Base directory; images go to a subfolder named after the PDF
    pub output_dir: PathBuf,
    /// Scale relative to 72 DPI
    #[clap(long, conflicts_with = "dpi")]
    pub zoom: Option<f32>,
    /// Output resolution
    #[clap(long)]
    pub dpi: Option<u32>,
    /// JSON configuration file
    #[clap(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Files to convert
    #[clap(required = true)]
    pub inputs: Vec<PathBuf>,
    /// Directory receiving PDFs and page folders
    #[clap(long)]
    pub out_dir: PathBuf,
    /// TrueType font to embed into spreadsheet PDFs
    #[clap(long)]
    pub font: Option<PathBuf>,
    /// Number of conversions to run at once
    #[clap(long, short = 'j', default_value_t = 1)]
    pub jobs: usize,
    /// JSON configuration file
    #[clap(long)]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[clap(author, version, about)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}
