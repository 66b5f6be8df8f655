//! Excel writer implementation - template file + filled cells → .xlsx
//!
//! The output is the template file itself, reopened with umya-spreadsheet.
//! Only cells whose value differs from what the template holds are written,
//! so styles, column widths, merges, data validations and formulas stay as
//! the template defined them.

use crate::error::{DgwError, DgwResult};
use crate::types::{CellValue, Workbook};
use chrono::{NaiveDate, NaiveDateTime};
use std::path::Path;
use umya_spreadsheet::{Spreadsheet, Worksheet};

const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Persists a filled copy of a template workbook
pub struct TemplateWriter<'a> {
    /// Template values as read, the baseline for change detection
    template: &'a Workbook,
    /// Template values with the transformed rows applied
    output: &'a Workbook,
}

impl<'a> TemplateWriter<'a> {
    pub fn new(template: &'a Workbook, output: &'a Workbook) -> Self {
        Self { template, output }
    }

    /// Copy `template_path` to `output_path` with every changed cell applied,
    /// replacing any existing file. Returns the number of cells written.
    pub fn save(&self, template_path: &Path, output_path: &Path) -> DgwResult<usize> {
        let mut book = umya_spreadsheet::reader::xlsx::read(template_path).map_err(|e| {
            DgwError::WorkbookRead(format!(
                "Failed to open template {}: {}",
                template_path.display(),
                e
            ))
        })?;

        let written = self.apply(&mut book)?;

        umya_spreadsheet::writer::xlsx::write(&book, output_path).map_err(|e| {
            DgwError::WorkbookWrite(format!(
                "Failed to save {}: {}",
                output_path.display(),
                e
            ))
        })?;

        Ok(written)
    }

    fn apply(&self, book: &mut Spreadsheet) -> DgwResult<usize> {
        let mut written = 0;

        for sheet in self.output.sheets() {
            let baseline = self.template.sheet(&sheet.name).map(|s| &s.grid);
            let worksheet = book.get_sheet_by_name_mut(&sheet.name).ok_or_else(|| {
                DgwError::WorkbookWrite(format!("Template has no sheet '{}'", sheet.name))
            })?;

            for (row, cells) in sheet.grid.rows().iter().enumerate() {
                for (col, cell) in cells.iter().enumerate() {
                    let before = baseline.map_or(&CellValue::Empty, |grid| grid.get(row, col));
                    if before == cell {
                        continue;
                    }
                    write_cell(worksheet, row, col, cell)?;
                    written += 1;
                }
            }
        }

        Ok(written)
    }
}

/// Overwrite one cell's value, keeping its style apart from date formats
fn write_cell(worksheet: &mut Worksheet, row: usize, col: usize, value: &CellValue) -> DgwResult<()> {
    // umya addresses cells as 1-based (column, row)
    let target = worksheet.get_cell_mut((coordinate(col)?, coordinate(row)?));
    match value {
        CellValue::Empty => {
            target.set_blank();
        }
        CellValue::Text(s) => {
            target.set_value_string(s.clone());
        }
        CellValue::Number(n) => {
            target.set_value_number(*n);
        }
        CellValue::Bool(b) => {
            target.set_value_bool(*b);
        }
        CellValue::DateTime(dt) => {
            target.set_value_number(excel_serial(dt));
            target
                .get_style_mut()
                .get_number_format_mut()
                .set_format_code(DATETIME_FORMAT);
        }
    }
    Ok(())
}

fn coordinate(index: usize) -> DgwResult<u32> {
    u32::try_from(index + 1)
        .map_err(|_| DgwError::WorkbookWrite(format!("Cell index {} exceeds the sheet limit", index)))
}

/// Excel 1900-system serial for a date-time (1899-12-30 is day 0)
pub fn excel_serial(dt: &NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    (*dt - epoch).num_milliseconds() as f64 / 86_400_000.0
}
