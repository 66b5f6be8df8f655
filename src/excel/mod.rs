//! Excel workbook access
//!
//! - Reader: .xlsx → in-memory sheets (calamine), including the Sheet Selector
//! - Writer: template file + filled cells → .xlsx (umya-spreadsheet)

mod reader;
mod writer;

pub use reader::{list_valid_sheets, WorkbookReader};
pub use writer::{excel_serial, TemplateWriter};
