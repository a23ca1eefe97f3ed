//! In-memory worksheet model consumed by the layout engine.
//!
//! Coordinates are 1-indexed `(row, col)` pairs, matching spreadsheet
//! conventions. A [`Sheet`] is immutable once loaded; the layout engine only
//! reads from it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Value held by a single cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// No value. Absent cells take no part in layout or rendering.
    #[default]
    Empty,
    /// Text value.
    Text(String),
    /// Numeric value.
    Number(f64),
}

impl CellValue {
    /// Whether the cell carries no renderable content.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// Text rendered for this value.
    ///
    /// Fractional numbers keep two decimals, integral numbers print without
    /// a fractional part.
    pub fn formatted(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(text) => text.clone(),
            CellValue::Number(n) => format_number(*n),
        }
    }
}

impl From<&str> for CellValue {
    fn from(text: &str) -> Self {
        CellValue::Text(text.to_string())
    }
}

impl From<String> for CellValue {
    fn from(text: String) -> Self {
        CellValue::Text(text)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else if n.is_finite() {
        format!("{:.2}", n)
    } else {
        n.to_string()
    }
}

/// A rectangular merged range, inclusive on all bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MergeSpan {
    pub min_row: u32,
    pub max_row: u32,
    pub min_col: u32,
    pub max_col: u32,
}

impl MergeSpan {
    pub fn new(min_row: u32, min_col: u32, max_row: u32, max_col: u32) -> Self {
        Self {
            min_row: min_row.min(max_row),
            max_row: min_row.max(max_row),
            min_col: min_col.min(max_col),
            max_col: min_col.max(max_col),
        }
    }

    /// Parse an A1-style range such as `"B2:D4"`. A single reference
    /// (`"C3"`) yields a one-cell span.
    pub fn parse(range: &str) -> Option<Self> {
        let mut parts = range.split(':');
        let (start_row, start_col) = parse_cell_ref(parts.next()?)?;
        let (end_row, end_col) = match parts.next() {
            Some(end) => parse_cell_ref(end)?,
            None => (start_row, start_col),
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(start_row, start_col, end_row, end_col))
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.min_row..=self.max_row).contains(&row) && (self.min_col..=self.max_col).contains(&col)
    }
}

/// Parse an A1-style cell reference into 1-indexed `(row, col)`.
/// `$` anchors are ignored.
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    let cell_ref = cell_ref.trim();
    let mut col = 0u32;
    let mut row_str = String::new();

    for c in cell_ref.chars() {
        if c == '$' {
            continue;
        }
        if c.is_ascii_alphabetic() {
            if !row_str.is_empty() {
                return None;
            }
            col = col
                .checked_mul(26)?
                .checked_add(c.to_ascii_uppercase() as u32 - 'A' as u32 + 1)?;
        } else if c.is_ascii_digit() {
            row_str.push(c);
        } else {
            return None;
        }
    }

    let row: u32 = row_str.parse().ok()?;
    if row == 0 || col == 0 {
        return None;
    }
    Some((row, col))
}

/// Spreadsheet column letters for a 1-indexed column (`1 -> "A"`, `27 -> "AA"`).
pub fn column_letter(col: u32) -> String {
    let mut result = String::new();
    let mut n = col;
    while n > 0 {
        let rem = (n - 1) % 26;
        result.insert(0, (b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    result
}

/// Rectangular grid of cells with merge spans and declared column widths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sheet {
    name: String,
    row_count: u32,
    col_count: u32,
    /// Row-major values, `row_count * col_count` entries.
    cells: Vec<CellValue>,
    merges: Vec<MergeSpan>,
    /// Declared Excel width per column, `None` when unset.
    column_widths: Vec<Option<f64>>,
}

impl Sheet {
    /// Create an empty sheet of the given size.
    pub fn new(name: impl Into<String>, row_count: u32, col_count: u32) -> Self {
        let len = row_count as usize * col_count as usize;
        Self {
            name: name.into(),
            row_count,
            col_count,
            cells: vec![CellValue::Empty; len],
            merges: Vec::new(),
            column_widths: vec![None; col_count as usize],
        }
    }

    /// Build a sheet from row-major text rows. Empty strings become absent
    /// cells; the column count is the longest row.
    pub fn from_rows<R, S>(name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<CellValue>,
    {
        let rows: Vec<Vec<CellValue>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        let col_count = rows.iter().map(Vec::len).max().unwrap_or(0) as u32;
        let mut sheet = Sheet::new(name, rows.len() as u32, col_count);
        for (r, row) in rows.into_iter().enumerate() {
            for (c, value) in row.into_iter().enumerate() {
                sheet.set_value(r as u32 + 1, c as u32 + 1, value);
            }
        }
        sheet
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_count(&self) -> u32 {
        self.row_count
    }

    pub fn col_count(&self) -> u32 {
        self.col_count
    }

    pub fn merges(&self) -> &[MergeSpan] {
        &self.merges
    }

    /// Declared widths, one per column.
    pub fn column_widths(&self) -> &[Option<f64>] {
        &self.column_widths
    }

    fn index(&self, row: u32, col: u32) -> Option<usize> {
        if row == 0 || col == 0 || row > self.row_count || col > self.col_count {
            return None;
        }
        Some((row as usize - 1) * self.col_count as usize + (col as usize - 1))
    }

    /// Value at a 1-indexed position. Out-of-range positions are empty.
    pub fn value(&self, row: u32, col: u32) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.index(row, col)
            .and_then(|i| self.cells.get(i))
            .unwrap_or(&EMPTY)
    }

    /// Whether the cell at a position carries content.
    pub fn is_populated(&self, row: u32, col: u32) -> bool {
        !self.value(row, col).is_empty()
    }

    /// Values of one row, left to right.
    pub fn row(&self, row: u32) -> &[CellValue] {
        if row == 0 || row > self.row_count {
            return &[];
        }
        let start = (row as usize - 1) * self.col_count as usize;
        &self.cells[start..start + self.col_count as usize]
    }

    /// Set a value, growing the grid when the position lies outside it.
    pub fn set_value(&mut self, row: u32, col: u32, value: impl Into<CellValue>) {
        if row == 0 || col == 0 {
            return;
        }
        if row > self.row_count || col > self.col_count {
            self.resize(row.max(self.row_count), col.max(self.col_count));
        }
        if let Some(i) = self.index(row, col) {
            self.cells[i] = value.into();
        }
    }

    /// Declare an Excel width for a 1-indexed column.
    pub fn set_column_width(&mut self, col: u32, width: f64) {
        if col == 0 {
            return;
        }
        if col > self.col_count {
            self.resize(self.row_count, col);
        }
        self.column_widths[col as usize - 1] = Some(width);
    }

    pub fn add_merge(&mut self, span: MergeSpan) {
        self.merges.push(span);
    }

    /// Number of populated cells.
    pub fn populated_count(&self) -> usize {
        self.cells.iter().filter(|v| !v.is_empty()).count()
    }

    fn resize(&mut self, row_count: u32, col_count: u32) {
        let mut cells = vec![CellValue::Empty; row_count as usize * col_count as usize];
        for r in 0..self.row_count as usize {
            for c in 0..self.col_count as usize {
                let old = r * self.col_count as usize + c;
                cells[r * col_count as usize + c] = std::mem::take(&mut self.cells[old]);
            }
        }
        self.cells = cells;
        self.column_widths.resize(col_count as usize, None);
        self.row_count = row_count;
        self.col_count = col_count;
    }
}

/// Coordinate to merge-span lookup, built once per sheet.
#[derive(Debug, Clone, Default)]
pub struct MergeIndex {
    owners: HashMap<(u32, u32), MergeSpan>,
}

impl MergeIndex {
    /// Index every coordinate covered by a span. On overlap the first span
    /// in sheet order keeps the coordinate.
    pub fn build(sheet: &Sheet) -> Self {
        let mut owners = HashMap::new();
        for span in sheet.merges() {
            // Only coordinates inside the grid can be looked up.
            let max_row = span.max_row.min(sheet.row_count());
            let max_col = span.max_col.min(sheet.col_count());
            for row in span.min_row..=max_row {
                for col in span.min_col..=max_col {
                    owners.entry((row, col)).or_insert(*span);
                }
            }
        }
        Self { owners }
    }

    pub fn span_at(&self, row: u32, col: u32) -> Option<&MergeSpan> {
        self.owners.get(&(row, col))
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
