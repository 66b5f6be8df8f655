use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::fmt;

static EMPTY_CELL: CellValue = CellValue::Empty;

//==============================================================================
// Cells
//==============================================================================

/// A single spreadsheet cell, carried between workbooks without coercion
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// True for absent cells and zero-length text
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Text rendering used for header labels, rule checks and reports.
    ///
    /// Integral numbers drop their fractional part (`12345.0` → `12345`) and
    /// date-times render as `YYYY-MM-DD HH:MM:SS`.
    pub fn render(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Bool(b) => {
                if *b {
                    "True".to_string()
                } else {
                    "False".to_string()
                }
            }
            CellValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

//==============================================================================
// Sheet grid (absolute, 0-based coordinates)
//==============================================================================

/// Rectangular cell grid addressed by absolute 0-based (row, column)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetGrid {
    rows: Vec<Vec<CellValue>>,
}

impl SheetGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a grid from row vectors (row 0 is spreadsheet row 1)
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    /// Number of rows up to and including the last populated one
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Widest row length
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.iter().all(CellValue::is_empty))
    }

    pub fn get(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    /// Set a cell, growing the grid as needed
    pub fn set(&mut self, row: usize, col: usize, value: CellValue) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, CellValue::Empty);
        }
        cells[col] = value;
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// The first `count` rows, for header scanning and previews
    pub fn preview(&self, count: usize) -> &[Vec<CellValue>] {
        &self.rows[..count.min(self.rows.len())]
    }

    /// Header label → every column position carrying that label.
    ///
    /// Labels are trimmed; blank labels are not targets. Templates repeat
    /// some labels (one "Country Code" per nested block), so each label maps
    /// to all of its positions in left-to-right order.
    pub fn header_positions(&self, header_row: usize) -> HashMap<String, Vec<usize>> {
        let mut positions: HashMap<String, Vec<usize>> = HashMap::new();
        if let Some(cells) = self.rows.get(header_row) {
            for (col, cell) in cells.iter().enumerate() {
                let label = cell.render().trim().to_string();
                if label.is_empty() {
                    continue;
                }
                positions.entry(label).or_default().push(col);
            }
        }
        positions
    }

    /// Read the grid as a table whose column labels sit on `header_row`
    pub fn table_at(&self, header_row: usize) -> Table {
        let width = self.width();
        let raw_labels: Vec<String> = (0..width)
            .map(|col| self.get(header_row, col).render().trim().to_string())
            .collect();
        let columns = unique_labels(&raw_labels);

        let rows = self
            .rows
            .iter()
            .skip(header_row + 1)
            .map(|cells| {
                let mut row = cells.clone();
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();

        Table { columns, rows }
    }
}

/// Blank labels become `Unnamed: <index>`; repeats get `.1`, `.2` suffixes
fn unique_labels(raw: &[String]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.iter()
        .enumerate()
        .map(|(idx, label)| {
            let base = if label.is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                label.clone()
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}

//==============================================================================
// Table (header + data rows)
//==============================================================================

/// Header-labelled rows read from a sheet. Column names are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    /// Cells of one column in row order
    pub fn column_values(&self, name: &str) -> Option<Vec<&CellValue>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    pub fn is_row_empty(&self, row: usize) -> bool {
        self.rows
            .get(row)
            .map(|cells| cells.iter().all(CellValue::is_empty))
            .unwrap_or(true)
    }
}

//==============================================================================
// Workbook
//==============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub grid: SheetGrid,
}

/// Ordered collection of named sheets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sheet(&mut self, name: impl Into<String>, grid: SheetGrid) {
        self.sheets.push(Sheet {
            name: name.into(),
            grid,
        });
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }
}
