//! Pipeline stages: header location, transform, rules and validation

pub mod batch;
pub mod header;
pub mod rules;
pub mod transform;
pub mod validation;

pub use batch::{collect_workbooks, run_batch};
pub use header::{detect_header_row, HeaderDetection, HeaderMethod, HeaderMode};
pub use rules::{RecordCategory, Rule, RuleRegistry};
pub use transform::{TransformEngine, TransformOutcome, TransformStatus};
pub use validation::{FailureRecord, RuleEngine, ValidationResult, NO_VALID_SHEETS};
