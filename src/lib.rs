//! DGW pipeline - legacy HR spreadsheets to DGW templates, then validation
//!
//! Two stages share one row layout ([`layout::LayoutConvention`]) and one
//! alias table:
//!
//! - **Transform**: legacy workbooks are mapped column by column into a DGW
//!   template ([`core::TransformEngine`]).
//! - **Validate**: transformed workbooks are checked against declarative and
//!   record-type rules ([`core::RuleEngine`]), one result per sheet.
//!
//! Both stages capture per-file failures as result records and keep going.
//!
//! # Example
//!
//! ```no_run
//! use dgw_pipeline::config::{load_alias_table, load_rule_registry, Settings};
//! use dgw_pipeline::core::RuleEngine;
//!
//! let settings = Settings::load(None)?;
//! let rules = load_rule_registry(&settings.rules_file())?;
//! let aliases = load_alias_table(&settings.aliases_file())?;
//!
//! let engine = RuleEngine::new(settings.layout.clone(), rules, aliases);
//! for result in engine.validate_directory(&settings.curated_dir())? {
//!     println!("{} / {}: {}%", result.file, result.sheet, result.success_pct);
//! }
//! # Ok::<(), dgw_pipeline::error::DgwError>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod excel;
pub mod layout;
pub mod mapping;
pub mod report;
pub mod types;

// Re-export commonly used types
pub use error::{DgwError, DgwResult};
pub use layout::LayoutConvention;
pub use types::{CellValue, SheetGrid, Table, Workbook};
