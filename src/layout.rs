//! Fixed row conventions shared by the transform and validation stages
//!
//! Rows here are 1-based spreadsheet rows. The `*_index` helpers return the
//! 0-based positions used by [`crate::types::SheetGrid`].

use crate::error::{DgwError, DgwResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConvention {
    /// Header row of legacy source sheets
    pub source_header_row: usize,
    /// Header row of DGW templates and transformed outputs
    pub template_header_row: usize,
    /// First data row of DGW templates and transformed outputs
    pub data_start_row: usize,
    /// Sheets whose trimmed name starts with this are not data sheets
    pub sentinel: char,
}

impl Default for LayoutConvention {
    fn default() -> Self {
        Self {
            source_header_row: 2,
            template_header_row: 6,
            data_start_row: 7,
            sentinel: '>',
        }
    }
}

impl LayoutConvention {
    pub fn validate(&self) -> DgwResult<()> {
        if self.source_header_row == 0 || self.template_header_row == 0 {
            return Err(DgwError::InvalidConfiguration(
                "layout rows are 1-based and must be at least 1".to_string(),
            ));
        }
        if self.data_start_row <= self.template_header_row {
            return Err(DgwError::InvalidConfiguration(format!(
                "data_start_row ({}) must come after template_header_row ({})",
                self.data_start_row, self.template_header_row
            )));
        }
        Ok(())
    }

    pub fn source_header_index(&self) -> usize {
        self.source_header_row - 1
    }

    pub fn template_header_index(&self) -> usize {
        self.template_header_row - 1
    }

    pub fn data_start_index(&self) -> usize {
        self.data_start_row - 1
    }

    /// Spreadsheet row of the `offset`-th data row (offset 0 → `data_start_row`)
    pub fn spreadsheet_row(&self, offset: usize) -> usize {
        self.data_start_row + offset
    }

    pub fn is_sentinel_sheet(&self, name: &str) -> bool {
        name.trim().starts_with(self.sentinel)
    }

    /// Sheet Selector: data sheets in declared order
    pub fn valid_sheets<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        names
            .iter()
            .map(|c| c.as_ref())
            .filter(|name| !self.is_sentinel_sheet(name))
            .map(str::to_string)
            .collect()
    }
}
