//! Shared fixtures: real .xlsx files written with rust_xlsxwriter and read
//! back with calamine.

#![allow(dead_code)]

use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// One fixture cell
#[derive(Clone, Copy)]
pub enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    /// yyyy, mm, dd written as a real Excel date
    Date(u16, u8, u8),
    Blank,
}

pub use Cell::{Blank, Date, Number, Text};

/// Rows of text cells; "" is a blank cell
pub fn text_rows<'a>(rows: &[&[&'a str]]) -> Vec<Vec<Cell<'a>>> {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|v| if v.is_empty() { Blank } else { Text(v) })
                .collect()
        })
        .collect()
}

/// Write a workbook; sheets are (name, rows starting at spreadsheet row 1)
pub fn write_xlsx(path: &Path, sheets: &[(&str, Vec<Vec<Cell>>)]) {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let (r, c) = (r as u32, c as u16);
                match *cell {
                    Text(s) => {
                        worksheet.write_string(r, c, s).unwrap();
                    }
                    Number(n) => {
                        worksheet.write_number(r, c, n).unwrap();
                    }
                    Date(y, m, d) => {
                        let date = ExcelDateTime::from_ymd(y, m, d).unwrap();
                        worksheet
                            .write_datetime_with_format(r, c, &date, &date_format)
                            .unwrap();
                    }
                    Blank => {}
                }
            }
        }
    }

    workbook.save(path).unwrap();
}

/// Legacy workbook: title on row 1, labels on row 2, data from row 3
pub fn write_legacy(path: &Path, sheet: &str, header: &[&str], data: Vec<Vec<Cell>>) {
    let mut rows = text_rows(&[&["Legacy export"], header]);
    rows.extend(data);
    write_xlsx(path, &[(">Instructions", text_rows(&[&["Read me"]])), (sheet, rows)]);
}

/// DGW template: one title row, labels on row 6, no data
pub fn write_template(path: &Path, sheets: &[(&str, &[&str])]) {
    let fixtures: Vec<(&str, Vec<Vec<Cell>>)> = sheets
        .iter()
        .map(|(name, header)| (*name, template_rows(header, Vec::new())))
        .collect();
    write_xlsx(path, &fixtures);
}

/// Rows of a DGW sheet: labels on row 6, `data` from row 7
pub fn template_rows<'a>(header: &[&'a str], data: Vec<Vec<Cell<'a>>>) -> Vec<Vec<Cell<'a>>> {
    let mut rows = text_rows(&[&["DGW template"]]);
    rows.resize(5, Vec::new());
    rows.extend(text_rows(&[header]));
    rows.extend(data);
    rows
}

/// Absolute (0-based) cell of a sheet on disk
pub fn read_cell(path: &Path, sheet: &str, row: u32, col: u32) -> Data {
    let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
    let range = workbook.worksheet_range(sheet).unwrap();
    range.get_value((row, col)).cloned().unwrap_or(Data::Empty)
}

pub fn sheet_names(path: &Path) -> Vec<String> {
    let workbook: Xlsx<_> = open_workbook(path).unwrap();
    workbook.sheet_names()
}

/// Folder layout of one pipeline run
pub struct Project {
    pub dir: TempDir,
    pub incoming: PathBuf,
    pub templates: PathBuf,
    pub curated: PathBuf,
    pub outputs: PathBuf,
    pub config: PathBuf,
}

impl Project {
    /// Default folder names, all created empty
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        let project = Self {
            incoming: root.join("data/incoming"),
            templates: root.join("data/templates_dgw"),
            curated: root.join("data/curated"),
            outputs: root.join("outputs"),
            config: root.join("config"),
            dir,
        };
        for folder in [
            &project.incoming,
            &project.templates,
            &project.config.join("mappings"),
        ] {
            fs::create_dir_all(folder).unwrap();
        }
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_mapping(&self, kind: &str, yaml: &str) {
        fs::write(
            self.config.join("mappings").join(format!("mapping_{}.yaml", kind)),
            yaml,
        )
        .unwrap();
    }

    pub fn write_rules(&self, yaml: &str) {
        fs::write(self.config.join("rules_global.yaml"), yaml).unwrap();
    }

    pub fn write_aliases(&self, yaml: &str) {
        fs::write(self.config.join("field_mappings.yaml"), yaml).unwrap();
    }

    pub fn write_settings(&self, yaml: &str) -> PathBuf {
        let path = self.root().join("dgw.yaml");
        fs::write(&path, yaml).unwrap();
        path
    }
}
