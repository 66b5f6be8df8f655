//! Field mapping: which legacy column feeds which DGW column
//!
//! - `alias`: logical field → physical column resolution shared by both stages
//! - `definition`: per-category mapping definitions and the mapping selector
//! - `template`: legacy filename → DGW template selection

mod alias;
mod definition;
mod template;

pub use alias::{resolve_column, AliasTable};
pub use definition::{select_mapping, MappingDefinition, MappingEntry, MappingKind, MappingRegistry};
pub use template::select_template;
