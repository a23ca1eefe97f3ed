//! Drawing surface abstraction used by the layout engine.
//!
//! Coordinates are PDF points with the origin at the bottom-left corner of
//! the page.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Drawing surface receiving layout output.
pub trait Canvas {
    /// Stroke an axis-aligned rectangle whose bottom-left corner is `(x, y)`.
    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<()>;

    /// Draw a single line of text with its baseline starting at `(x, y)`.
    fn draw_text(&mut self, text: &str, x: f64, y: f64, font_size: f64) -> Result<()>;

    /// Finish the current page and start a new one.
    fn show_page(&mut self) -> Result<()>;
}

/// A recorded drawing call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    /// Stroked rectangle.
    StrokeRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },

    /// Text line.
    DrawText {
        text: String,
        x: f64,
        y: f64,
        font_size: f64,
    },
}

/// Drawing calls of one page.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedPage {
    pub commands: Vec<DrawCommand>,
}

impl RecordedPage {
    pub fn rects(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::StrokeRect { .. }))
    }

    pub fn texts(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::DrawText { .. }))
    }
}

/// Canvas that keeps every call in memory instead of producing a file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordingCanvas {
    pages: Vec<RecordedPage>,
}

impl Default for RecordingCanvas {
    fn default() -> Self {
        Self {
            pages: vec![RecordedPage::default()],
        }
    }
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages(&self) -> &[RecordedPage] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All commands across pages, in drawing order.
    pub fn commands(&self) -> impl Iterator<Item = &DrawCommand> {
        self.pages.iter().flat_map(|p| p.commands.iter())
    }

    /// Serialize the recorded pages as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn current(&mut self) -> &mut RecordedPage {
        if self.pages.is_empty() {
            self.pages.push(RecordedPage::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }
}

impl Canvas for RecordingCanvas {
    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<()> {
        self.current().commands.push(DrawCommand::StrokeRect {
            x,
            y,
            width,
            height,
        });
        Ok(())
    }

    fn draw_text(&mut self, text: &str, x: f64, y: f64, font_size: f64) -> Result<()> {
        self.current().commands.push(DrawCommand::DrawText {
            text: text.to_string(),
            x,
            y,
            font_size,
        });
        Ok(())
    }

    fn show_page(&mut self) -> Result<()> {
        self.pages.push(RecordedPage::default());
        Ok(())
    }
}
