//! Page layout engine for spreadsheets.
//!
//! Lays a [`Sheet`] out on fixed-size pages without a general layout engine:
//! columns are sized proportionally to their declared Excel widths, cell text
//! is wrapped with a character budget, row heights follow the tallest cell,
//! and a row that no longer fits starts a new page.
//!
//! Two rendering policies exist. A sheet where at least `dense_threshold` of
//! the cells are populated is drawn as a bordered table; any other sheet is
//! drawn as borderless text that may spill into empty cells to its right.

use crate::canvas::Canvas;
use crate::config::{LayoutConfig, PageGeometry};
use crate::error::Result;
use crate::sheet::{MergeIndex, Sheet};
use crate::text_layout::{char_budget, char_len, required_width, wrap_chunks, wrap_words};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Whether a sheet should be drawn as a bordered table.
///
/// Sheets without rows or columns are never dense.
pub fn is_dense_table(sheet: &Sheet, threshold: f64) -> bool {
    let total = sheet.row_count() as usize * sheet.col_count() as usize;
    if total == 0 {
        return false;
    }
    sheet.populated_count() as f64 / total as f64 >= threshold
}

/// Split the printable page width between columns in proportion to their
/// declared widths.
///
/// Unset or zero widths count as `default_width`. When the declared widths do
/// not add up to a positive total the width is shared equally.
pub fn allocate_column_widths(
    declared: &[Option<f64>],
    default_width: f64,
    page: &PageGeometry,
) -> Vec<f64> {
    if declared.is_empty() {
        return Vec::new();
    }

    let available = page.printable_width();
    let widths: Vec<f64> = declared
        .iter()
        .map(|w| match w {
            Some(w) if *w != 0.0 && w.is_finite() => *w,
            _ => default_width,
        })
        .collect();
    let total: f64 = widths.iter().sum();

    if total <= 0.0 || !total.is_finite() {
        let uniform = available / widths.len() as f64;
        return vec![uniform; widths.len()];
    }

    widths.iter().map(|w| available * (w / total)).collect()
}

/// Effective width of the cell at `(row, col)`: the combined width of every
/// column its merge span covers, or its own column width.
pub fn merge_width(row: u32, col: u32, column_widths: &[f64], merges: &MergeIndex) -> f64 {
    match merges.span_at(row, col) {
        Some(span) => {
            let end = (span.max_col as usize).min(column_widths.len());
            let start = (span.min_col as usize).saturating_sub(1).min(end);
            column_widths[start..end].iter().sum()
        }
        None => column_widths
            .get((col as usize).wrapping_sub(1))
            .copied()
            .unwrap_or(0.0),
    }
}

/// Mutable state of one layout run.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayoutState {
    /// Vertical write position; decreases down the page.
    pub cursor_y: f64,
    /// Current page, 1-indexed.
    pub page_number: usize,
    /// Column widths in points.
    pub column_widths: Vec<f64>,
    column_offsets: Vec<f64>,
    top_cursor: f64,
    bottom_limit: f64,
}

impl PageLayoutState {
    pub fn new(page: &PageGeometry, column_widths: Vec<f64>) -> Self {
        let mut column_offsets = Vec::with_capacity(column_widths.len());
        let mut x = page.left_margin;
        for width in &column_widths {
            column_offsets.push(x);
            x += width;
        }

        Self {
            cursor_y: page.top_cursor(),
            page_number: 1,
            column_widths,
            column_offsets,
            top_cursor: page.top_cursor(),
            bottom_limit: page.top_margin,
        }
    }

    /// Whether a row of `row_height` would cross the bottom limit.
    pub fn needs_page_break(&self, row_height: f64) -> bool {
        self.cursor_y - row_height < self.bottom_limit
    }

    /// Move the cursor back to the top of a fresh page.
    pub fn start_new_page(&mut self) {
        self.page_number += 1;
        self.cursor_y = self.top_cursor;
    }

    /// Move the cursor below a rendered row.
    pub fn advance(&mut self, row_height: f64) {
        self.cursor_y -= row_height;
    }

    /// Left edge of a 1-indexed column.
    pub fn column_x(&self, col: u32) -> f64 {
        self.column_offsets
            .get((col as usize).wrapping_sub(1))
            .copied()
            .unwrap_or(0.0)
    }

    /// Height of a page body between the top cursor and the bottom limit.
    pub fn body_height(&self) -> f64 {
        self.top_cursor - self.bottom_limit
    }
}

/// One populated cell of a measured row.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedCell {
    /// 1-indexed column.
    pub col: u32,
    /// Formatted value.
    pub text: String,
    /// Width after merge resolution.
    pub width: f64,
    /// Lines at the measuring font size.
    pub lines: Vec<String>,
}

/// A measured row, ready for the page-break decision.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRow {
    /// 1-indexed row.
    pub row: u32,
    pub cells: Vec<RenderedCell>,
    pub height: f64,
}

/// Outcome of laying out one sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSummary {
    pub sheet_name: String,
    /// Whether the bordered-table policy was used.
    pub dense: bool,
    pub page_count: usize,
    pub rows_rendered: usize,
    /// Rows without any populated cell.
    pub rows_skipped: usize,
    pub cells_rendered: usize,
    /// Rows taller than a page body.
    pub overflowing_rows: usize,
    pub column_widths: Vec<f64>,
}

/// Lays sheets out onto a [`Canvas`].
#[derive(Debug, Clone)]
pub struct TabularPageLayoutEngine {
    config: LayoutConfig,
}

impl TabularPageLayoutEngine {
    /// Create an engine after validating its configuration.
    pub fn new(config: LayoutConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Column widths in points for a sheet.
    pub fn column_widths(&self, sheet: &Sheet) -> Vec<f64> {
        allocate_column_widths(
            sheet.column_widths(),
            self.config.default_column_width,
            &self.config.page,
        )
    }

    fn budget(&self, width: f64, font_size: f64) -> usize {
        char_budget(width, font_size, self.config.width_factor)
    }

    /// Wrap every populated cell of `row` and compute the row height.
    /// Returns `None` for rows without populated cells.
    pub fn measure_row(
        &self,
        sheet: &Sheet,
        row: u32,
        column_widths: &[f64],
        merges: &MergeIndex,
    ) -> Option<RenderedRow> {
        let font_size = self.config.font_size;
        let mut cells = Vec::new();

        for (idx, value) in sheet.row(row).iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let col = idx as u32 + 1;
            let width = merge_width(row, col, column_widths, merges);
            let text = value.formatted();
            let lines = wrap_words(&text, self.budget(width, font_size));
            cells.push(RenderedCell {
                col,
                text,
                width,
                lines,
            });
        }

        if cells.is_empty() {
            return None;
        }

        let max_lines = cells
            .iter()
            .map(|c| c.lines.len().max(1))
            .max()
            .unwrap_or(1);

        Some(RenderedRow {
            row,
            cells,
            height: self.config.base_row_height * max_lines as f64,
        })
    }

    /// Lay the whole sheet out onto `canvas`.
    ///
    /// The canvas is expected to be positioned on a blank first page; the
    /// caller finalizes it afterwards.
    pub fn render<C: Canvas>(&self, sheet: &Sheet, canvas: &mut C) -> Result<LayoutSummary> {
        let dense = is_dense_table(sheet, self.config.dense_threshold);
        let merges = MergeIndex::build(sheet);
        let mut state = PageLayoutState::new(&self.config.page, self.column_widths(sheet));

        debug!(
            "Laying out sheet '{}' ({}x{}, {} merged cells) as {}",
            sheet.name(),
            sheet.row_count(),
            sheet.col_count(),
            merges.len(),
            if dense { "dense table" } else { "sparse sheet" }
        );

        let mut summary = LayoutSummary {
            sheet_name: sheet.name().to_string(),
            dense,
            page_count: 1,
            rows_rendered: 0,
            rows_skipped: 0,
            cells_rendered: 0,
            overflowing_rows: 0,
            column_widths: state.column_widths.clone(),
        };

        for row in 1..=sheet.row_count() {
            let Some(measured) = self.measure_row(sheet, row, &state.column_widths, &merges) else {
                summary.rows_skipped += 1;
                continue;
            };

            if measured.height > state.body_height() {
                warn!(
                    "Row {} of '{}' is {:.1}pt tall and overflows the page",
                    row,
                    sheet.name(),
                    measured.height
                );
                summary.overflowing_rows += 1;
            }

            if state.needs_page_break(measured.height) {
                canvas.show_page()?;
                state.start_new_page();
                debug!("Row {} starts page {}", row, state.page_number);
            }

            if dense {
                self.render_dense_row(canvas, &state, &measured)?;
            } else {
                self.render_sparse_row(canvas, sheet, &state, &measured)?;
            }

            summary.rows_rendered += 1;
            summary.cells_rendered += measured.cells.len();
            state.advance(measured.height);
        }

        summary.page_count = state.page_number;

        info!(
            "Laid out '{}': {} rows on {} page(s)",
            sheet.name(),
            summary.rows_rendered,
            summary.page_count
        );

        Ok(summary)
    }

    /// Bordered cells; text shrinks to the fallback size when it exceeds
    /// the budget at the regular size.
    fn render_dense_row<C: Canvas>(
        &self,
        canvas: &mut C,
        state: &PageLayoutState,
        row: &RenderedRow,
    ) -> Result<()> {
        let top = state.cursor_y;

        for cell in &row.cells {
            let x = state.column_x(cell.col);
            canvas.stroke_rect(x, top - row.height, cell.width, row.height)?;

            let mut font_size = self.config.font_size;
            if char_len(&cell.text) > self.budget(cell.width, font_size) {
                font_size = self.config.fallback_font_size;
            }

            let lines = wrap_words(&cell.text, self.budget(cell.width, font_size));
            self.draw_lines(canvas, &lines, x, top, font_size)?;
        }

        Ok(())
    }

    /// Borderless text that may extend over empty cells to its right, up to
    /// a fixed maximum width.
    fn render_sparse_row<C: Canvas>(
        &self,
        canvas: &mut C,
        sheet: &Sheet,
        state: &PageLayoutState,
        row: &RenderedRow,
    ) -> Result<()> {
        let top = state.cursor_y;
        let font_size = self.config.font_size;

        for cell in &row.cells {
            let mut width = cell.width;

            if char_len(&cell.text) > self.budget(width, font_size) {
                let needed = required_width(&cell.text, font_size, self.config.glyph_width_ratio);
                let mut spread = width;

                for next in cell.col + 1..=sheet.col_count() {
                    if sheet.is_populated(row.row, next) {
                        break;
                    }
                    spread += state.column_widths[next as usize - 1];
                    if spread >= needed {
                        break;
                    }
                }

                if spread >= needed {
                    width = spread;
                }
            }

            width = width.min(self.config.sparse_width_cap(font_size));

            let lines = wrap_chunks(&cell.text, self.budget(width, font_size));
            self.draw_lines(canvas, &lines, state.column_x(cell.col), top, font_size)?;
        }

        Ok(())
    }

    fn draw_lines<C: Canvas>(
        &self,
        canvas: &mut C,
        lines: &[String],
        x: f64,
        top: f64,
        font_size: f64,
    ) -> Result<()> {
        let baseline = top - self.config.baseline_offset;
        for (k, line) in lines.iter().enumerate() {
            canvas.draw_text(
                line,
                x + self.config.text_inset,
                baseline - self.config.line_spacing * k as f64,
                font_size,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DrawCommand, RecordingCanvas};
    use crate::sheet::{CellValue, MergeSpan};

    const EPS: f64 = 1e-9;

    fn page_700() -> PageGeometry {
        PageGeometry::with_size(700.0, 500.0).horizontal_margins(50.0, 50.0)
    }

    fn engine_700() -> TabularPageLayoutEngine {
        TabularPageLayoutEngine::new(LayoutConfig::with_page(page_700())).unwrap()
    }

    fn grid(rows: u32, cols: u32, populated: usize) -> Sheet {
        let mut sheet = Sheet::new("Grid", rows, cols);
        let mut n = 0;
        'outer: for r in 1..=rows {
            for c in 1..=cols {
                if n == populated {
                    break 'outer;
                }
                sheet.set_value(r, c, format!("r{}c{}", r, c));
                n += 1;
            }
        }
        sheet
    }

    // ========== Density classifier ==========

    #[test]
    fn test_density_at_threshold_is_dense() {
        assert!(is_dense_table(&grid(2, 5, 9), 0.90));
    }

    #[test]
    fn test_density_below_threshold_is_sparse() {
        assert!(!is_dense_table(&grid(2, 5, 8), 0.90));
    }

    #[test]
    fn test_density_full_sheet_is_dense() {
        assert!(is_dense_table(&grid(3, 3, 9), 0.90));
    }

    #[test]
    fn test_density_degenerate_sheets_are_sparse() {
        assert!(!is_dense_table(&Sheet::new("Empty", 0, 0), 0.90));
        assert!(!is_dense_table(&Sheet::new("NoCols", 5, 0), 0.90));
        assert!(!is_dense_table(&Sheet::new("NoRows", 0, 5), 0.90));
    }

    #[test]
    fn test_density_ignores_empty_strings() {
        let sheet = Sheet::from_rows("Blanks", vec![vec!["a", ""], vec!["", "d"]]);
        assert!(!is_dense_table(&sheet, 0.90));
    }

    // ========== Column width allocator ==========

    #[test]
    fn test_column_widths_uniform() {
        let widths = allocate_column_widths(&[Some(10.0); 3], 10.0, &page_700());
        assert_eq!(widths.len(), 3);
        for w in &widths {
            assert!((w - 200.0).abs() < EPS);
        }
    }

    #[test]
    fn test_column_widths_sum_to_printable_width() {
        let page = PageGeometry::default();
        let declared = [Some(5.0), None, Some(0.0), Some(20.5), Some(13.25)];
        let widths = allocate_column_widths(&declared, 10.0, &page);
        let sum: f64 = widths.iter().sum();
        assert!((sum - page.printable_width()).abs() < 1e-6);
    }

    #[test]
    fn test_column_widths_proportional() {
        let widths = allocate_column_widths(&[Some(10.0), Some(30.0)], 10.0, &page_700());
        assert!((widths[0] - 150.0).abs() < EPS);
        assert!((widths[1] - 450.0).abs() < EPS);
    }

    #[test]
    fn test_column_widths_unset_defaults_to_ten() {
        let widths = allocate_column_widths(&[None, Some(0.0), Some(20.0)], 10.0, &page_700());
        assert!((widths[0] - 150.0).abs() < EPS);
        assert!((widths[1] - 150.0).abs() < EPS);
        assert!((widths[2] - 300.0).abs() < EPS);
    }

    #[test]
    fn test_column_widths_non_positive_total_is_uniform() {
        let widths = allocate_column_widths(&[Some(-5.0), Some(5.0)], 10.0, &page_700());
        assert!((widths[0] - 300.0).abs() < EPS);
        assert!((widths[1] - 300.0).abs() < EPS);
    }

    #[test]
    fn test_column_widths_overflowing_total_is_uniform() {
        let widths = allocate_column_widths(&[Some(f64::MAX), Some(f64::MAX)], 10.0, &page_700());
        assert!((widths[0] - 300.0).abs() < EPS);
        assert!((widths[1] - 300.0).abs() < EPS);
    }

    #[test]
    fn test_column_widths_no_columns() {
        assert!(allocate_column_widths(&[], 10.0, &page_700()).is_empty());
    }

    // ========== Merge width resolver ==========

    #[test]
    fn test_merge_width_two_by_two_region() {
        let mut sheet = Sheet::new("Merged", 3, 3);
        sheet.add_merge(MergeSpan::new(1, 1, 2, 2));
        let merges = MergeIndex::build(&sheet);
        let widths = [100.0, 200.0, 300.0];

        assert!((merge_width(1, 1, &widths, &merges) - 300.0).abs() < EPS);
        assert!((merge_width(2, 2, &widths, &merges) - 300.0).abs() < EPS);
        assert!((merge_width(1, 3, &widths, &merges) - 300.0).abs() < EPS);
        assert!((merge_width(3, 1, &widths, &merges) - 100.0).abs() < EPS);
    }

    #[test]
    fn test_merge_width_span_past_last_column() {
        let mut sheet = Sheet::new("Wide", 1, 2);
        sheet.add_merge(MergeSpan::new(1, 2, 1, 9));
        let merges = MergeIndex::build(&sheet);
        assert!((merge_width(1, 2, &[100.0, 200.0], &merges) - 200.0).abs() < EPS);
    }

    // ========== Row height ==========

    #[test]
    fn test_row_height_follows_tallest_cell() {
        let engine = engine_700();
        let mut sheet = Sheet::new("Heights", 1, 3);
        // Budget at 200pt/12pt is 17 characters, so each word takes a line.
        sheet.set_value(1, 1, "aaaaaaaaaaaaaaaa bbbbbbbbbbbbbbbb cccccccccccccccc");
        sheet.set_value(1, 2, "x");
        sheet.set_value(1, 3, "y");
        let widths = engine.column_widths(&sheet);
        let merges = MergeIndex::build(&sheet);

        let row = engine.measure_row(&sheet, 1, &widths, &merges).unwrap();
        assert_eq!(row.cells[0].lines.len(), 3);
        assert_eq!(row.cells[1].lines.len(), 1);
        assert_eq!(row.height, 3.0 * 24.0);
    }

    #[test]
    fn test_row_height_single_line_minimum() {
        let engine = engine_700();
        let sheet = Sheet::from_rows("One", vec![vec!["a", "b"]]);
        let widths = engine.column_widths(&sheet);
        let row = engine
            .measure_row(&sheet, 1, &widths, &MergeIndex::build(&sheet))
            .unwrap();
        assert_eq!(row.height, 24.0);
    }

    #[test]
    fn test_whitespace_only_cell_counts_as_one_line() {
        let engine = engine_700();
        let sheet = Sheet::from_rows("Space", vec![vec!["   "]]);
        let widths = engine.column_widths(&sheet);
        let row = engine
            .measure_row(&sheet, 1, &widths, &MergeIndex::build(&sheet))
            .unwrap();
        assert!(row.cells[0].lines.is_empty());
        assert_eq!(row.height, 24.0);
    }

    #[test]
    fn test_empty_row_is_skipped() {
        let engine = engine_700();
        let mut sheet = Sheet::new("Gaps", 3, 2);
        sheet.set_value(1, 1, "top");
        sheet.set_value(3, 2, "bottom");
        let widths = engine.column_widths(&sheet);
        assert!(engine
            .measure_row(&sheet, 2, &widths, &MergeIndex::build(&sheet))
            .is_none());

        let mut canvas = RecordingCanvas::new();
        let summary = engine.render(&sheet, &mut canvas).unwrap();
        assert_eq!(summary.rows_rendered, 2);
        assert_eq!(summary.rows_skipped, 1);

        // The skipped row consumes no vertical space.
        let ys: Vec<f64> = canvas
            .commands()
            .filter_map(|c| match c {
                DrawCommand::DrawText { y, .. } => Some(*y),
                _ => None,
            })
            .collect();
        assert_eq!(ys, vec![460.0 - 15.0, 460.0 - 24.0 - 15.0]);
    }

    #[test]
    fn test_numeric_values_are_formatted() {
        let engine = engine_700();
        let mut sheet = Sheet::new("Numbers", 1, 1);
        sheet.set_value(1, 1, CellValue::Number(1234.5678));
        let mut canvas = RecordingCanvas::new();
        engine.render(&sheet, &mut canvas).unwrap();

        let texts: Vec<&str> = canvas
            .commands()
            .filter_map(|c| match c {
                DrawCommand::DrawText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["1234.57"]);
    }

    // ========== Page break ==========

    #[test]
    fn test_page_break_when_row_crosses_top_margin() {
        let page = page_700();
        let mut state = PageLayoutState::new(&page, vec![200.0; 3]);
        state.cursor_y = page.top_margin + 5.0;

        assert!(state.needs_page_break(10.0));
        state.start_new_page();
        assert_eq!(state.cursor_y, page.height - page.top_margin);
        assert_eq!(state.page_number, 2);
    }

    #[test]
    fn test_no_page_break_when_row_fits_exactly() {
        let page = page_700();
        let mut state = PageLayoutState::new(&page, vec![200.0; 3]);
        state.cursor_y = page.top_margin + 24.0;
        assert!(!state.needs_page_break(24.0));
    }

    #[test]
    fn test_rows_paginate() {
        // Body is 160 - 40 = 120pt: five 24pt rows per page.
        let page = PageGeometry::with_size(700.0, 200.0);
        let engine = TabularPageLayoutEngine::new(LayoutConfig::with_page(page)).unwrap();
        let rows: Vec<Vec<String>> = (1..=7).map(|i| vec![format!("row {}", i)]).collect();
        let sheet = Sheet::from_rows("Long", rows);

        let mut canvas = RecordingCanvas::new();
        let summary = engine.render(&sheet, &mut canvas).unwrap();

        assert_eq!(summary.page_count, 2);
        assert_eq!(canvas.page_count(), 2);
        assert_eq!(canvas.pages()[0].rects().count(), 5);
        assert_eq!(canvas.pages()[1].rects().count(), 2);
    }

    #[test]
    fn test_overflowing_row_is_counted_not_fatal() {
        let page = PageGeometry::with_size(700.0, 200.0);
        let engine = TabularPageLayoutEngine::new(LayoutConfig::with_page(page)).unwrap();
        let words = vec!["wordwordwordword"; 40].join(" ");
        let sheet = Sheet::from_rows("Tall", vec![vec![words]]);

        let mut canvas = RecordingCanvas::new();
        let summary = engine.render(&sheet, &mut canvas).unwrap();
        assert_eq!(summary.overflowing_rows, 1);
        assert_eq!(summary.rows_rendered, 1);
    }

    // ========== Dense renderer ==========

    #[test]
    fn test_dense_three_by_three_sheet() {
        let engine = engine_700();
        let sheet = grid(3, 3, 9);
        let mut canvas = RecordingCanvas::new();
        let summary = engine.render(&sheet, &mut canvas).unwrap();

        assert!(summary.dense);
        assert_eq!(summary.column_widths.len(), 3);
        for w in &summary.column_widths {
            assert!((w - 200.0).abs() < EPS);
        }

        let rects: Vec<&DrawCommand> = canvas.pages()[0].rects().collect();
        assert_eq!(rects.len(), 9);
        for (i, rect) in rects.iter().enumerate() {
            let DrawCommand::StrokeRect { x, y, width, height } = rect else {
                panic!("expected rect");
            };
            let row = (i / 3) as f64;
            let col = (i % 3) as f64;
            assert!((width - 200.0).abs() < EPS);
            assert_eq!(*height, 24.0);
            assert!((x - (50.0 + 200.0 * col)).abs() < EPS);
            assert_eq!(*y, 460.0 - 24.0 * (row + 1.0));
        }
        assert_eq!(canvas.pages()[0].texts().count(), 9);
    }

    #[test]
    fn test_dense_text_position() {
        let engine = engine_700();
        let sheet = grid(1, 1, 1);
        let mut canvas = RecordingCanvas::new();
        engine.render(&sheet, &mut canvas).unwrap();

        let text = canvas.pages()[0].texts().next().unwrap();
        assert_eq!(
            text,
            &DrawCommand::DrawText {
                text: "r1c1".to_string(),
                x: 52.0,
                y: 445.0,
                font_size: 12.0,
            }
        );
    }

    #[test]
    fn test_dense_long_text_drops_to_fallback_font() {
        let engine = engine_700();
        // 18 characters exceed the 17-character budget at 12pt but fit the
        // 20-character budget at 10pt.
        let sheet = Sheet::from_rows("Shrink", vec![vec!["abcdefghijklmnopqr", "b", "c"]]);
        let mut canvas = RecordingCanvas::new();
        engine.render(&sheet, &mut canvas).unwrap();

        let texts: Vec<&DrawCommand> = canvas.pages()[0].texts().collect();
        assert_eq!(texts.len(), 3);
        let DrawCommand::DrawText { font_size, text, .. } = texts[0] else {
            panic!("expected text");
        };
        assert_eq!(*font_size, 10.0);
        assert_eq!(text, "abcdefghijklmnopqr");
    }

    #[test]
    fn test_dense_wrapped_lines_are_spaced() {
        let engine = engine_700();
        let sheet = Sheet::from_rows(
            "Wrap",
            vec![vec!["alpha beta gamma delta epsilon zeta", "b", "c"]],
        );
        let mut canvas = RecordingCanvas::new();
        engine.render(&sheet, &mut canvas).unwrap();

        // At 10pt the budget is 20 characters: two lines for the first cell.
        let lines: Vec<(String, f64)> = canvas.pages()[0]
            .texts()
            .filter_map(|c| match c {
                DrawCommand::DrawText { text, y, .. } => Some((text.clone(), *y)),
                _ => None,
            })
            .take(2)
            .collect();
        assert_eq!(lines[0].0, "alpha beta gamma");
        assert_eq!(lines[1].0, "delta epsilon zeta");
        assert_eq!(lines[0].1 - lines[1].1, 12.0);
    }

    #[test]
    fn test_dense_merged_cell_border_spans_columns() {
        let engine = engine_700();
        let mut sheet = grid(2, 3, 6);
        sheet.set_value(1, 2, "");
        sheet.add_merge(MergeSpan::new(1, 1, 1, 2));
        let engine_config = engine.config().clone().dense_threshold(0.8);
        let engine = TabularPageLayoutEngine::new(engine_config).unwrap();

        let mut canvas = RecordingCanvas::new();
        engine.render(&sheet, &mut canvas).unwrap();

        let first = canvas.pages()[0].rects().next().unwrap();
        let DrawCommand::StrokeRect { width, .. } = first else {
            panic!("expected rect");
        };
        assert!((width - 400.0).abs() < EPS);
        assert_eq!(canvas.pages()[0].rects().count(), 5);
    }

    // ========== Sparse renderer ==========

    fn sparse_sheet(text: &str) -> Sheet {
        let mut sheet = Sheet::new("Sparse", 2, 3);
        sheet.set_value(1, 1, text);
        sheet.set_value(2, 1, "note");
        sheet
    }

    fn texts_of(canvas: &RecordingCanvas) -> Vec<String> {
        canvas
            .commands()
            .filter_map(|c| match c {
                DrawCommand::DrawText { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_sparse_text_spreads_over_empty_columns() {
        let engine = engine_700();
        // 80 characters need 480pt; columns 1-3 together offer 600pt.
        let sheet = sparse_sheet(&"x".repeat(80));
        let mut canvas = RecordingCanvas::new();
        let summary = engine.render(&sheet, &mut canvas).unwrap();

        assert!(!summary.dense);
        assert_eq!(canvas.pages()[0].rects().count(), 0);

        // 600 * 1.03 / 12 = 51 characters per line.
        let texts = texts_of(&canvas);
        assert_eq!(texts[0].len(), 51);
        assert_eq!(texts[1].len(), 29);
        assert_eq!(texts[2], "note");
    }

    #[test]
    fn test_sparse_text_without_enough_room_keeps_cell_width() {
        let engine = engine_700();
        // 110 characters need 660pt, more than the 600pt available.
        let sheet = sparse_sheet(&"y".repeat(110));
        let mut canvas = RecordingCanvas::new();
        engine.render(&sheet, &mut canvas).unwrap();

        let texts = texts_of(&canvas);
        // 200 * 1.03 / 12 = 17 characters per line: 6 full lines and 8 left.
        assert_eq!(texts.len(), 7 + 1);
        assert_eq!(texts[0].len(), 17);
        assert_eq!(texts[6].len(), 8);
    }

    #[test]
    fn test_sparse_spread_stops_at_populated_cell() {
        let engine = engine_700();
        let mut sheet = sparse_sheet(&"z".repeat(60));
        sheet.set_value(1, 3, "blocker");
        let mut canvas = RecordingCanvas::new();
        engine.render(&sheet, &mut canvas).unwrap();

        // 60 characters need 360pt; columns 1-2 give 400pt.
        let texts = texts_of(&canvas);
        assert_eq!(texts[0].len(), 34);
        assert_eq!(texts[1].len(), 26);
        assert_eq!(texts[2], "blocker");
    }

    #[test]
    fn test_sparse_width_is_capped() {
        let page = PageGeometry::with_size(1100.0, 500.0);
        let engine = TabularPageLayoutEngine::new(LayoutConfig::with_page(page)).unwrap();
        // One 1000pt column: the cap limits lines to 732 * 1.03 / 12 = 62.
        let mut sheet = Sheet::new("Cap", 2, 1);
        sheet.set_value(1, 1, "w".repeat(100));
        let mut canvas = RecordingCanvas::new();
        engine.render(&sheet, &mut canvas).unwrap();

        let texts = texts_of(&canvas);
        assert_eq!(texts[0].len(), 62);
        assert_eq!(texts[1].len(), 38);
    }

    #[test]
    fn test_sparse_lines_anchor_at_cell_left_edge() {
        let engine = engine_700();
        let mut sheet = Sheet::new("Edge", 3, 3);
        sheet.set_value(2, 2, "middle");
        let mut canvas = RecordingCanvas::new();
        engine.render(&sheet, &mut canvas).unwrap();

        let first = canvas.commands().next().unwrap();
        let DrawCommand::DrawText { x, y, .. } = first else {
            panic!("expected text");
        };
        assert!((x - 252.0).abs() < EPS);
        assert_eq!(*y, 445.0);
    }

    #[test]
    fn test_empty_sheet_renders_single_blank_page() {
        let engine = engine_700();
        let sheet = Sheet::new("Blank", 0, 0);
        let mut canvas = RecordingCanvas::new();
        let summary = engine.render(&sheet, &mut canvas).unwrap();
        assert_eq!(summary.page_count, 1);
        assert_eq!(summary.rows_rendered, 0);
        assert_eq!(canvas.commands().count(), 0);
    }
}
