//! Excel reader implementation - .xlsx → in-memory sheets

use crate::error::{DgwError, DgwResult};
use crate::layout::LayoutConvention;
use crate::types::{CellValue, SheetGrid, Table, Workbook};
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use chrono::{NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Workbook reader scoped to one file; dropped (and closed) after use
pub struct WorkbookReader {
    path: PathBuf,
    workbook: Xlsx<BufReader<File>>,
}

impl WorkbookReader {
    /// Open an .xlsx workbook
    pub fn open<P: AsRef<Path>>(path: P) -> DgwResult<Self> {
        let path = path.as_ref().to_path_buf();
        let workbook: Xlsx<_> = open_workbook(&path).map_err(|e| {
            DgwError::WorkbookRead(format!("Failed to open {}: {}", path.display(), e))
        })?;
        Ok(Self { path, workbook })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    /// Data sheets in workbook order (sentinel sheets excluded)
    pub fn valid_sheets(&self, layout: &LayoutConvention) -> Vec<String> {
        layout.valid_sheets(&self.sheet_names())
    }

    /// Read one sheet into an absolute-coordinate grid
    pub fn read_grid(&mut self, sheet_name: &str) -> DgwResult<SheetGrid> {
        let range = self.workbook.worksheet_range(sheet_name).map_err(|e| {
            DgwError::WorkbookRead(format!(
                "Failed to read sheet '{}' of {}: {}",
                sheet_name,
                self.path.display(),
                e
            ))
        })?;
        Ok(Self::range_to_grid(&range))
    }

    /// Read one sheet as a table with labels on `header_index` (0-based)
    pub fn read_table(&mut self, sheet_name: &str, header_index: usize) -> DgwResult<Table> {
        Ok(self.read_grid(sheet_name)?.table_at(header_index))
    }

    /// Read every sheet, sentinel sheets included
    pub fn read_workbook(&mut self) -> DgwResult<Workbook> {
        let mut workbook = Workbook::new();
        for sheet_name in self.sheet_names() {
            let grid = self.read_grid(&sheet_name)?;
            workbook.add_sheet(sheet_name, grid);
        }
        Ok(workbook)
    }

    /// calamine ranges start at the first used cell; re-anchor at A1
    fn range_to_grid(range: &Range<Data>) -> SheetGrid {
        let mut grid = SheetGrid::new();
        let Some((start_row, start_col)) = range.start() else {
            return grid;
        };

        for (row, col, cell) in range.cells() {
            let value = convert_cell(cell);
            if value.is_empty() {
                continue;
            }
            grid.set(start_row as usize + row, start_col as usize + col, value);
        }
        grid
    }
}

/// Sheet Selector over a workbook on disk
pub fn list_valid_sheets<P: AsRef<Path>>(
    path: P,
    layout: &LayoutConvention,
) -> DgwResult<Vec<String>> {
    Ok(WorkbookReader::open(path)?.valid_sheets(layout))
}

/// Convert a calamine cell to a [`CellValue`]
fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => CellValue::DateTime(value),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(format!("#{:?}", e)),
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_cell_scalars() {
        assert_eq!(convert_cell(&Data::Empty), CellValue::Empty);
        assert_eq!(
            convert_cell(&Data::String("E001".to_string())),
            CellValue::Text("E001".to_string())
        );
        assert_eq!(convert_cell(&Data::Int(42)), CellValue::Number(42.0));
        assert_eq!(convert_cell(&Data::Float(1.5)), CellValue::Number(1.5));
        assert_eq!(convert_cell(&Data::Bool(false)), CellValue::Bool(false));
    }

    #[test]
    fn test_convert_iso_datetime() {
        let cell = convert_cell(&Data::DateTimeIso("2024-01-05T00:00:00".to_string()));
        assert_eq!(cell.render(), "2024-01-05 00:00:00");

        let date_only = convert_cell(&Data::DateTimeIso("2024-03-09".to_string()));
        assert_eq!(date_only.render(), "2024-03-09 00:00:00");

        let garbage = convert_cell(&Data::DateTimeIso("not a date".to_string()));
        assert_eq!(garbage, CellValue::Text("not a date".to_string()));
    }

    #[test]
    fn test_open_missing_file_is_read_error() {
        let result = WorkbookReader::open("definitely/not/here.xlsx");
        assert!(matches!(result, Err(DgwError::WorkbookRead(_))));
    }
}
