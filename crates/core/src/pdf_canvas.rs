//! [`Canvas`] implementation producing PDF files with printpdf.

use crate::canvas::Canvas;
use crate::config::PageGeometry;
use crate::error::{ConversionError, Result};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Pt, Rgb,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

const LAYER_NAME: &str = "Layer 1";

fn mm(points: f64) -> Mm {
    Mm::from(Pt(points as f32))
}

/// PDF drawing surface with a single font.
pub struct PdfCanvas {
    document: PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    page: PageGeometry,
    page_count: usize,
}

impl PdfCanvas {
    /// Start a document on its first blank page.
    ///
    /// The TrueType font at `font_path` is embedded when given; otherwise the
    /// built-in Helvetica is used.
    pub fn new(title: &str, page: PageGeometry, font_path: Option<&Path>) -> Result<Self> {
        let (document, page_index, layer_index) =
            PdfDocument::new(title, mm(page.width), mm(page.height), LAYER_NAME);

        let font = match font_path {
            Some(path) => {
                let file = File::open(path).map_err(|e| ConversionError::FontError {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                document
                    .add_external_font(file)
                    .map_err(|e| ConversionError::FontError {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?
            }
            None => document.add_builtin_font(BuiltinFont::Helvetica)?,
        };

        let layer = document.get_page(page_index).get_layer(layer_index);
        Self::prepare_layer(&layer);

        Ok(Self {
            document,
            layer,
            font,
            page,
            page_count: 1,
        })
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    fn prepare_layer(layer: &PdfLayerReference) {
        layer.set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        layer.set_outline_thickness(1.0);
    }

    /// Write the document to `path`, creating parent directories.
    pub fn save(self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConversionError::OutputDirError {
                path: parent.to_path_buf(),
                message: e.to_string(),
            })?;
        }

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.document.save(&mut writer)?;

        debug!("Wrote {} page(s) to {:?}", self.page_count, path);
        Ok(())
    }
}

impl Canvas for PdfCanvas {
    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<()> {
        let corners = [
            (x, y),
            (x + width, y),
            (x + width, y + height),
            (x, y + height),
        ];
        self.layer.add_line(Line {
            points: corners
                .iter()
                .map(|&(px, py)| (Point::new(mm(px), mm(py)), false))
                .collect(),
            is_closed: true,
        });
        Ok(())
    }

    fn draw_text(&mut self, text: &str, x: f64, y: f64, font_size: f64) -> Result<()> {
        self.layer
            .use_text(text, font_size as f32, mm(x), mm(y), &self.font);
        Ok(())
    }

    fn show_page(&mut self) -> Result<()> {
        let (page_index, layer_index) =
            self.document
                .add_page(mm(self.page.width), mm(self.page.height), LAYER_NAME);
        self.layer = self.document.get_page(page_index).get_layer(layer_index);
        Self::prepare_layer(&self.layer);
        self.page_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_pdf_canvas_writes_pdf() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.pdf");

        let mut canvas = PdfCanvas::new("test", PageGeometry::default(), None).unwrap();
        canvas.stroke_rect(50.0, 500.0, 100.0, 24.0).unwrap();
        canvas.draw_text("hello", 52.0, 540.0, 12.0).unwrap();
        canvas.show_page().unwrap();
        canvas.draw_text("second", 52.0, 540.0, 10.0).unwrap();
        assert_eq!(canvas.page_count(), 2);

        canvas.save(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_pdf_canvas_missing_font() {
        let result = PdfCanvas::new(
            "test",
            PageGeometry::default(),
            Some(Path::new("/nonexistent/font.ttf")),
        );
        assert!(matches!(result, Err(ConversionError::FontError { .. })));
    }
}
