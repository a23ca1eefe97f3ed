//! PDF to PNG rendering using pdfium (Google's PDF engine).
//!
//! Pages are rasterized sequentially since a pdfium document is not
//! thread-safe; PNG encoding then runs in parallel on a rayon pool.

use crate::config::{PngPage, RenderConfig};
use crate::error::{ConversionError, Result};
use image::RgbaImage;
use pdfium_render::prelude::*;
use rayon::prelude::*;
use std::ffi::OsString;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Environment variable naming the directory that holds the pdfium library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_DYNAMIC_LIB_PATH";

/// PDF to PNG renderer using pdfium.
pub struct PdfRenderer {
    config: RenderConfig,
    pdfium: Arc<Pdfium>,
    thread_pool: rayon::ThreadPool,
}

impl PdfRenderer {
    /// Create a new PDF renderer.
    pub fn new(config: RenderConfig) -> Result<Self> {
        config.validate()?;

        let bindings = bind_pdfium(std::env::var_os(PDFIUM_LIB_PATH_ENV)).map_err(|e| {
            ConversionError::PdfiumError(format!("Failed to load pdfium library: {}", e))
        })?;
        let pdfium = Pdfium::new(bindings);

        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.render_threads)
            .build()
            .map_err(|e| {
                ConversionError::InvalidConfig(format!("Failed to create thread pool: {}", e))
            })?;

        info!(
            "PDF renderer initialized with {} threads, {} DPI",
            config.render_threads, config.dpi
        );

        Ok(Self {
            config,
            pdfium: Arc::new(pdfium),
            thread_pool,
        })
    }

    /// Get the configured DPI.
    pub fn dpi(&self) -> u32 {
        self.config.dpi
    }

    /// Number of pages in a PDF.
    pub fn page_count(&self, pdf_path: &Path) -> Result<usize> {
        let document = self.load(pdf_path)?;
        Ok(document.pages().len() as usize)
    }

    fn load(&self, pdf_path: &Path) -> Result<PdfDocument<'_>> {
        if !pdf_path.exists() {
            return Err(ConversionError::InputNotFound(pdf_path.to_path_buf()));
        }
        self.pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| ConversionError::PdfRenderError(format!("Failed to load PDF: {}", e)))
    }

    /// Render all pages of a PDF to PNG images in memory.
    pub fn render_all_pages(&self, pdf_path: &Path) -> Result<Vec<PngPage>> {
        let start = Instant::now();
        let document = self.load(pdf_path)?;

        let page_count = document.pages().len() as usize;
        debug!("Rendering {} pages from {:?}", page_count, pdf_path);

        if page_count == 0 {
            return Ok(vec![]);
        }

        let scale = self.config.dpi as f32 / 72.0;
        let mut raw_images: Vec<(usize, RgbaImage)> = Vec::with_capacity(page_count);

        for page_idx in 0..page_count {
            let page = document.pages().get(page_idx as u16).map_err(|e| {
                ConversionError::PdfRenderError(format!(
                    "Failed to get page {}: {}",
                    page_idx + 1,
                    e
                ))
            })?;

            let width = (page.width().value * scale) as u32;
            let height = (page.height().value * scale) as u32;

            let render_config = PdfRenderConfig::new()
                .set_target_width(width as i32)
                .set_target_height(height as i32)
                .rotate_if_landscape(PdfPageRenderRotation::None, false);

            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                ConversionError::PdfRenderError(format!(
                    "Failed to render page {}: {}",
                    page_idx + 1,
                    e
                ))
            })?;

            let rgba_image: RgbaImage = bitmap.as_image().into_rgba8();
            let final_image = if self.config.use_alpha {
                rgba_image
            } else {
                apply_background(rgba_image, self.config.background_color)
            };

            raw_images.push((page_idx, final_image));
        }

        let compression = compression_level(self.config.png_compression);
        let encoded: Vec<Result<PngPage>> = self.thread_pool.install(|| {
            raw_images
                .into_par_iter()
                .map(|(page_idx, image)| {
                    let data = encode_png(&image, compression)?;
                    Ok(PngPage {
                        page_number: page_idx + 1,
                        data,
                        width: image.width(),
                        height: image.height(),
                        output_path: None,
                    })
                })
                .collect()
        });

        let mut pages = Vec::with_capacity(page_count);
        for result in encoded {
            match result {
                Ok(page) => pages.push(page),
                Err(e) => {
                    error!("Failed to encode page: {:?}", e);
                    return Err(e);
                }
            }
        }
        pages.sort_by_key(|p| p.page_number);

        debug!("Rendered {} pages in {:?}", page_count, start.elapsed());
        Ok(pages)
    }

    /// Render every page into `<base_dir>/<pdf stem>/page_<n>.png`.
    pub fn render_to_folder(&self, pdf_path: &Path, base_dir: &Path) -> Result<Vec<PngPage>> {
        if !pdf_path.exists() {
            return Err(ConversionError::InputNotFound(pdf_path.to_path_buf()));
        }
        let is_pdf = pdf_path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            return Err(ConversionError::UnsupportedFormat {
                extension: crate::extension_of(pdf_path),
            });
        }

        let output_dir = page_folder(pdf_path, base_dir);
        std::fs::create_dir_all(&output_dir).map_err(|e| ConversionError::OutputDirError {
            path: output_dir.clone(),
            message: e.to_string(),
        })?;

        let mut pages = self.render_all_pages(pdf_path)?;

        for page in &mut pages {
            let output_path = output_dir.join(page_file_name(page.page_number));
            std::fs::write(&output_path, &page.data).map_err(|e| {
                ConversionError::OutputDirError {
                    path: output_path.clone(),
                    message: e.to_string(),
                }
            })?;
            page.output_path = Some(output_path);
        }

        info!(
            "Saved {} page image(s) of {:?} to {:?}",
            pages.len(),
            pdf_path.file_name(),
            output_dir
        );

        Ok(pages)
    }
}

impl PdfRenderer {
    /// Render a single page to PNG.
    fn render_single_page(&self, document: &PdfDocument, page_idx: usize) -> Result<PngPage> {
        let page = document.pages().get(page_idx as u16).map_err(|e| {
            ConversionError::PdfRenderError(format!("Failed to get page {}: {}", page_idx + 1, e))
        })?;

        let scale = self.config.dpi as f32 / 72.0;
        let render_config = PdfRenderConfig::new()
            .set_target_width((page.width().value * scale) as i32)
            .set_target_height((page.height().value * scale) as i32)
            .rotate_if_landscape(PdfPageRenderRotation::None, false);

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            ConversionError::PdfRenderError(format!(
                "Failed to render page {}: {}",
                page_idx + 1,
                e
            ))
        })?;

        let rgba_image: RgbaImage = bitmap.as_image().into_rgba8();
        let image = if self.config.use_alpha {
            rgba_image
        } else {
            apply_background(rgba_image, self.config.background_color)
        };

        Ok(PngPage {
            page_number: page_idx + 1,
            data: encode_png(&image, compression_level(self.config.png_compression))?,
            width: image.width(),
            height: image.height(),
            output_path: None,
        })
    }

    /// Iterate over rendered pages one at a time.
    pub fn render_pages_iter<'a>(&'a self, pdf_path: &Path) -> Result<PageIterator<'a>> {
        let document = self.load(pdf_path)?;
        let total_pages = document.pages().len() as usize;

        Ok(PageIterator {
            renderer: self,
            document,
            current_page: 0,
            total_pages,
        })
    }

    /// Page sizes of a PDF without rendering it.
    pub fn pdf_info(&self, pdf_path: &Path) -> Result<PdfInfo> {
        let document = self.load(pdf_path)?;
        let page_count = document.pages().len() as usize;
        let mut pages = Vec::with_capacity(page_count);

        for i in 0..page_count {
            if let Ok(page) = document.pages().get(i as u16) {
                pages.push(PageInfo {
                    page_number: i + 1,
                    width_points: page.width().value,
                    height_points: page.height().value,
                });
            }
        }

        Ok(PdfInfo { page_count, pages })
    }
}

/// Iterator over PDF pages for streaming rendering.
pub struct PageIterator<'a> {
    renderer: &'a PdfRenderer,
    document: PdfDocument<'a>,
    current_page: usize,
    total_pages: usize,
}

impl Iterator for PageIterator<'_> {
    type Item = Result<PngPage>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_page >= self.total_pages {
            return None;
        }

        let result = self
            .renderer
            .render_single_page(&self.document, self.current_page);
        self.current_page += 1;
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total_pages - self.current_page;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PageIterator<'_> {}

/// Page sizes of a PDF document.
#[derive(Debug, Clone)]
pub struct PdfInfo {
    pub page_count: usize,
    pub pages: Vec<PageInfo>,
}

/// Size of a single PDF page.
#[derive(Debug, Clone)]
pub struct PageInfo {
    /// Page number (1-indexed).
    pub page_number: usize,
    /// Width in PDF points (1/72 inch).
    pub width_points: f32,
    /// Height in PDF points (1/72 inch).
    pub height_points: f32,
}

impl PageInfo {
    /// Width in pixels at a given DPI.
    pub fn width_pixels(&self, dpi: u32) -> u32 {
        ((self.width_points * dpi as f32) / 72.0) as u32
    }

    /// Height in pixels at a given DPI.
    pub fn height_pixels(&self, dpi: u32) -> u32 {
        ((self.height_points * dpi as f32) / 72.0) as u32
    }
}

/// Directories searched for pdfium: `env_dir` first, then next to the
/// executable, then the usual system locations.
fn library_search_dirs(env_dir: Option<OsString>) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = env_dir
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .into_iter()
        .collect();
    dirs.extend(["./", "/usr/lib", "/usr/local/lib"].map(PathBuf::from));
    dirs
}

fn bind_pdfium(
    env_dir: Option<OsString>,
) -> std::result::Result<Box<dyn PdfiumLibraryBindings>, PdfiumError> {
    for dir in library_search_dirs(env_dir) {
        match Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir)) {
            Ok(bindings) => {
                debug!("Bound pdfium from {:?}", dir);
                return Ok(bindings);
            }
            Err(e) => debug!("pdfium not loadable from {:?}: {}", dir, e),
        }
    }
    Pdfium::bind_to_system_library()
}

/// Folder receiving the page images of `pdf_path`.
pub fn page_folder(pdf_path: &Path, base_dir: &Path) -> PathBuf {
    let stem = pdf_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    base_dir.join(stem)
}

/// File name of a 1-indexed page image.
pub fn page_file_name(page_number: usize) -> String {
    format!("page_{}.png", page_number)
}

/// Blend transparent pixels onto an opaque background color.
fn apply_background(mut image: RgbaImage, background: (u8, u8, u8)) -> RgbaImage {
    let (r, g, b) = background;

    for pixel in image.pixels_mut() {
        let alpha = pixel[3] as f32 / 255.0;
        if alpha < 1.0 {
            let inv_alpha = 1.0 - alpha;
            pixel[0] = ((pixel[0] as f32 * alpha) + (r as f32 * inv_alpha)) as u8;
            pixel[1] = ((pixel[1] as f32 * alpha) + (g as f32 * inv_alpha)) as u8;
            pixel[2] = ((pixel[2] as f32 * alpha) + (b as f32 * inv_alpha)) as u8;
            pixel[3] = 255;
        }
    }

    image
}

fn compression_level(level: u8) -> png::Compression {
    match level {
        0..=3 => png::Compression::Fast,
        4..=6 => png::Compression::Default,
        _ => png::Compression::Best,
    }
}

/// Encode an RGBA image to PNG bytes. Free function so rayon workers can
/// call it without borrowing the renderer.
fn encode_png(image: &RgbaImage, compression: png::Compression) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());

    let mut encoder = png::Encoder::new(&mut buffer, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(compression);

    let mut writer = encoder.write_header().map_err(|e| {
        ConversionError::PngEncodingError(format!("Failed to write PNG header: {}", e))
    })?;

    writer.write_image_data(image.as_raw()).map_err(|e| {
        ConversionError::PngEncodingError(format!("Failed to write PNG data: {}", e))
    })?;

    drop(writer);

    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    // ========== Library lookup ==========

    #[test]
    fn test_library_dir_from_environment_is_tried_first() {
        let dirs = library_search_dirs(Some(OsString::from("/opt/pdfium/lib")));
        assert_eq!(dirs[0], PathBuf::from("/opt/pdfium/lib"));
        assert_eq!(dirs.len(), 4);
        assert!(dirs.contains(&PathBuf::from("/usr/local/lib")));
    }

    #[test]
    fn test_library_dirs_without_environment() {
        assert_eq!(
            library_search_dirs(None),
            vec![
                PathBuf::from("./"),
                PathBuf::from("/usr/lib"),
                PathBuf::from("/usr/local/lib"),
            ]
        );
        assert_eq!(library_search_dirs(Some(OsString::new())).len(), 3);
    }

    // ========== Output naming ==========

    #[test]
    fn test_page_folder_uses_pdf_stem() {
        assert_eq!(
            page_folder(Path::new("/docs/annual report.pdf"), Path::new("/out")),
            PathBuf::from("/out/annual report")
        );
    }

    #[test]
    fn test_page_file_name_is_one_indexed() {
        assert_eq!(page_file_name(1), "page_1.png");
        assert_eq!(page_file_name(12), "page_12.png");
    }

    #[test]
    fn test_page_info_landscape_a4_pixels() {
        let info = PageInfo {
            page_number: 1,
            width_points: 841.89,
            height_points: 595.28,
        };
        assert_eq!(info.width_pixels(72), 841);
        assert_eq!(info.height_pixels(72), 595);
        assert_eq!(info.width_pixels(144), 1683);
        assert_eq!(info.height_pixels(144), 1190);
    }

    // ========== Background blending ==========

    #[test]
    fn test_apply_background_fills_transparent_pixels() {
        let image = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0]));
        let blended = apply_background(image, (255, 255, 255));
        assert!(blended.pixels().all(|p| *p == Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn test_apply_background_keeps_opaque_pixels() {
        let image = RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 255]));
        let blended = apply_background(image, (255, 255, 255));
        assert_eq!(blended.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
    }

    // ========== PNG encoding ==========

    #[test]
    fn test_encode_png_small_image() {
        let image = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let png_data = encode_png(&image, png::Compression::Fast).unwrap();
        assert!(png_data.len() > 8);
        assert_eq!(&png_data[0..8], &PNG_MAGIC);
    }

    #[test]
    fn test_encode_png_roundtrip_dimensions() {
        let mut image = RgbaImage::new(256, 3);
        for x in 0..256 {
            image.put_pixel(x, 1, Rgba([x as u8, x as u8, x as u8, 255]));
        }

        let png_data = encode_png(&image, png::Compression::Best).unwrap();
        let decoded = image::load_from_memory(&png_data).unwrap();
        assert_eq!(decoded.width(), 256);
        assert_eq!(decoded.height(), 3);
    }

    #[test]
    fn test_compression_level_mapping() {
        assert!(matches!(compression_level(0), png::Compression::Fast));
        assert!(matches!(compression_level(6), png::Compression::Default));
        assert!(matches!(compression_level(9), png::Compression::Best));
    }

    // ========== PdfRenderer (requires pdfium) ==========

    #[test]
    fn test_renderer_creation_with_invalid_config() {
        let mut config = RenderConfig::default();
        config.dpi = 0;
        assert!(PdfRenderer::new(config).is_err());
    }

    #[test]
    fn test_renderer_rejects_non_pdf_input() {
        let renderer = match PdfRenderer::new(RenderConfig::with_dpi(72)) {
            Ok(renderer) => renderer,
            Err(ConversionError::PdfiumError(_)) => return,
            Err(e) => panic!("Unexpected error: {:?}", e),
        };

        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("notes.txt");
        std::fs::write(&input, b"text").unwrap();

        let result = renderer.render_to_folder(&input, dir.path());
        assert!(matches!(
            result,
            Err(ConversionError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_renderer_dpi_accessor() {
        match PdfRenderer::new(RenderConfig::with_dpi(200)) {
            Ok(renderer) => assert_eq!(renderer.dpi(), 200),
            Err(ConversionError::PdfiumError(_)) => {
                // pdfium not installed, skip test
            }
            Err(e) => panic!("Unexpected error: {:?}", e),
        }
    }
}
