//! Workbook loading via umya-spreadsheet.
//!
//! Reads one worksheet of an `.xlsx`/`.xlsm` workbook into a [`Sheet`]:
//! values, merged ranges and declared column widths. Styling is ignored.

use crate::config::SheetSelection;
use crate::error::{ConversionError, Result};
use crate::sheet::{CellValue, MergeSpan, Sheet};
use std::path::Path;
use tracing::{debug, warn};
use umya_spreadsheet::{Spreadsheet, Worksheet};

/// An opened workbook.
pub struct Workbook {
    spreadsheet: Spreadsheet,
    sheet_names: Vec<String>,
}

impl Workbook {
    /// Open a workbook from disk.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConversionError::InputNotFound(path.to_path_buf()));
        }

        let spreadsheet =
            umya_spreadsheet::reader::xlsx::read(path).map_err(|e| ConversionError::SpreadsheetError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let sheet_names: Vec<String> = spreadsheet
            .get_sheet_collection()
            .iter()
            .map(|sheet| sheet.get_name().to_string())
            .collect();

        debug!("Opened {:?} with sheets {:?}", path, sheet_names);

        Ok(Self {
            spreadsheet,
            sheet_names,
        })
    }

    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    /// Position of the sheet marked active in the workbook view.
    pub fn active_index(&self) -> usize {
        let active = *self.spreadsheet.get_workbook_view().get_active_tab() as usize;
        if active < self.sheet_names.len() {
            active
        } else {
            0
        }
    }

    /// Resolve a selection to a sheet position.
    pub fn resolve(&self, selection: &SheetSelection) -> Result<usize> {
        let index = match selection {
            SheetSelection::Active => self.active_index(),
            SheetSelection::Index(index) => *index,
            SheetSelection::Name(name) => match self.sheet_names.iter().position(|n| n == name) {
                Some(index) => index,
                None => name
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| ConversionError::SheetNotFound(name.clone()))?,
            },
        };

        if index >= self.sheet_names.len() {
            return Err(ConversionError::SheetNotFound(format!("#{}", index)));
        }
        Ok(index)
    }

    /// Load the selected worksheet.
    pub fn load_sheet(&self, selection: &SheetSelection) -> Result<Sheet> {
        let index = self.resolve(selection)?;
        let worksheet = self
            .spreadsheet
            .get_sheet_collection()
            .get(index)
            .ok_or_else(|| ConversionError::SheetNotFound(format!("#{}", index)))?;
        Ok(read_worksheet(worksheet))
    }
}

/// Open `path` and load the selected worksheet.
pub fn load_sheet(path: &Path, selection: &SheetSelection) -> Result<Sheet> {
    Workbook::open(path)?.load_sheet(selection)
}

fn read_worksheet(worksheet: &Worksheet) -> Sheet {
    let max_col = worksheet.get_highest_column();
    let max_row = worksheet.get_highest_row();
    let mut sheet = Sheet::new(worksheet.get_name(), max_row, max_col);

    for row in 1..=max_row {
        for col in 1..=max_col {
            let Some(cell) = worksheet.get_cell((col, row)) else {
                continue;
            };
            let value = match cell.get_value_number() {
                Some(n) => CellValue::Number(n),
                None => CellValue::Text(cell.get_value().to_string()),
            };
            if !value.is_empty() {
                sheet.set_value(row, col, value);
            }
        }
    }

    for col in 1..=max_col {
        if let Some(dimension) = worksheet.get_column_dimension_by_number(&col) {
            sheet.set_column_width(col, *dimension.get_width());
        }
    }

    for merge in worksheet.get_merge_cells() {
        let range = merge.get_range();
        match MergeSpan::parse(&range) {
            Some(span) => sheet.add_merge(span),
            None => warn!("Ignoring unreadable merge range '{}'", range),
        }
    }

    debug!(
        "Loaded sheet '{}': {} rows, {} columns, {} merges",
        sheet.name(),
        sheet.row_count(),
        sheet.col_count(),
        sheet.merges().len()
    );

    sheet
}
