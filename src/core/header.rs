//! Header Locator for legacy sheets
//!
//! DGW-style exports often carry a "Required"/"Optional" row directly above
//! the real column labels. When no such row exists, the first reasonably
//! wide row containing a field-like label is taken instead.

use crate::types::CellValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Default number of rows scanned
pub const DEFAULT_MAX_SCAN: usize = 15;

const OBLIGATION_MARKERS: [&str; 2] = ["required", "optional"];
const FIELD_NAME_HINTS: [&str; 5] = ["id", "date", "reason", "type", "code"];

/// How the source-side header row is found during transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderMode {
    /// Use the layout convention's fixed source header row
    #[default]
    Fixed,
    /// Use [`detect_header_row`]
    Detect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMethod {
    /// Row after a "required"/"optional" marker row
    ObligationMarker,
    /// Row with field-like labels
    FieldNamePattern,
    /// Nothing matched; row 0 assumed
    Default,
}

impl fmt::Display for HeaderMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HeaderMethod::ObligationMarker => "obligation marker row",
            HeaderMethod::FieldNamePattern => "field-name pattern",
            HeaderMethod::Default => "default (no header found)",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderDetection {
    /// 0-based row index of the column labels
    pub row: usize,
    pub method: HeaderMethod,
}

/// Find the 0-based row where column labels begin
pub fn detect_header_row(preview_rows: &[Vec<CellValue>], max_scan: usize) -> HeaderDetection {
    let scanned = &preview_rows[..max_scan.min(preview_rows.len())];

    for (idx, row) in scanned.iter().enumerate() {
        let joined = non_empty_labels(row).join(" ").to_lowercase();
        if has_obligation_marker(&joined) {
            debug!(marker_row = idx + 1, "obligation marker row found");
            return HeaderDetection {
                row: idx + 1,
                method: HeaderMethod::ObligationMarker,
            };
        }
    }

    for (idx, row) in scanned.iter().enumerate() {
        let labels = non_empty_labels(row);
        if labels.len() >= 3 && labels.iter().any(|label| looks_like_field_name(label)) {
            debug!(header_row = idx, "header found by field-name pattern");
            return HeaderDetection {
                row: idx,
                method: HeaderMethod::FieldNamePattern,
            };
        }
    }

    warn!("no header row detected in the first {} rows, assuming row 0", scanned.len());
    HeaderDetection {
        row: 0,
        method: HeaderMethod::Default,
    }
}

fn non_empty_labels(row: &[CellValue]) -> Vec<String> {
    row.iter()
        .filter(|cell| !cell.is_empty())
        .map(|cell| cell.render().trim().to_string())
        .collect()
}

/// Whole-word match of "required" or "optional"
fn has_obligation_marker(text: &str) -> bool {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .any(|word| OBLIGATION_MARKERS.contains(&word))
}

fn looks_like_field_name(label: &str) -> bool {
    let lower = label.to_lowercase();
    FIELD_NAME_HINTS.iter().any(|hint| lower.contains(hint))
}
