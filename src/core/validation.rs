//! Rule Engine - validates transformed DGW workbooks
//!
//! Each sheet moves through `Loaded → RulesApplied → Aggregated → Reported`
//! and ends as exactly one [`ValidationResult`]. Read failures and rule
//! evaluation failures end the sheet early with an error result instead of
//! aborting the file.

use crate::core::batch::{collect_workbooks, file_label, run_batch};
use crate::core::rules::{RecordCategory, Rule, RuleRegistry};
use crate::error::{DgwError, DgwResult};
use crate::excel::WorkbookReader;
use crate::layout::LayoutConvention;
use crate::mapping::{resolve_column, AliasTable};
use crate::report::PreviewSink;
use crate::types::{CellValue, Table};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

const NULL_TOKENS: [&str; 3] = ["nan", "None", "NaT"];
const MIDNIGHT_SUFFIX: &str = "00:00:00";

/// Error of the single result recorded for a workbook with only excluded sheets
pub const NO_VALID_SHEETS: &str = "no valid sheets";

//==============================================================================
// Results
//==============================================================================

/// One offending cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    #[serde(rename = "Column")]
    pub column: String,
    /// Spreadsheet row (1-based)
    #[serde(rename = "Row")]
    pub row: usize,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "Rule")]
    pub rule: String,
}

/// Outcome for one (file, sheet)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    #[serde(rename = "File")]
    pub file: String,
    #[serde(rename = "Sheet")]
    pub sheet: String,
    #[serde(rename = "Type")]
    pub record_type: String,
    #[serde(rename = "Total Checks")]
    pub total_checks: usize,
    #[serde(rename = "Failed")]
    pub failed: usize,
    #[serde(rename = "Success %")]
    pub success_pct: f64,
    #[serde(rename = "Error")]
    pub error: Option<String>,
    #[serde(rename = "Failures")]
    pub failures: Vec<FailureRecord>,
}

impl ValidationResult {
    /// Zero-count result for a sheet that could not be evaluated
    pub fn sheet_error(file: &str, sheet: &str, category: RecordCategory, message: String) -> Self {
        Self {
            file: file.to_string(),
            sheet: sheet.to_string(),
            record_type: category.to_string(),
            total_checks: 0,
            failed: 0,
            success_pct: 0.0,
            error: Some(message),
            failures: Vec::new(),
        }
    }

    /// Zero-count result for a workbook that could not be opened at all
    pub fn file_error(file: &str, message: String) -> Self {
        Self {
            file: file.to_string(),
            sheet: String::new(),
            record_type: "Error".to_string(),
            total_checks: 0,
            failed: 0,
            success_pct: 0.0,
            error: Some(message),
            failures: Vec::new(),
        }
    }

    pub fn is_passing(&self) -> bool {
        self.error.is_none() && self.failed == 0
    }
}

//==============================================================================
// Sheet state machine
//==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SheetStage {
    Loaded,
    RulesApplied,
    Aggregated,
    Reported,
}

impl fmt::Display for SheetStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SheetStage::Loaded => "LOADED",
            SheetStage::RulesApplied => "RULES_APPLIED",
            SheetStage::Aggregated => "AGGREGATED",
            SheetStage::Reported => "REPORTED",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
struct Violation {
    row_index: usize,
    value: String,
    rule: &'static str,
}

/// One (column, rule) evaluation
#[derive(Debug, Clone)]
struct Evaluation {
    column: String,
    violations: Vec<Violation>,
}

impl Evaluation {
    fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Aggregate {
    total: usize,
    failed: usize,
    success_pct: f64,
}

//==============================================================================
// Engine
//==============================================================================

pub struct RuleEngine {
    layout: LayoutConvention,
    rules: RuleRegistry,
    aliases: AliasTable,
    previews: Option<PreviewSink>,
}

impl RuleEngine {
    pub fn new(layout: LayoutConvention, rules: RuleRegistry, aliases: AliasTable) -> Self {
        Self {
            layout,
            rules,
            aliases,
            previews: None,
        }
    }

    /// Write a CSV preview of every loaded sheet
    pub fn with_previews(mut self, sink: PreviewSink) -> Self {
        self.previews = Some(sink);
        self
    }

    pub fn layout(&self) -> &LayoutConvention {
        &self.layout
    }

    /// Validate every .xlsx workbook in `dir`, one result per sheet
    pub fn validate_directory(&self, dir: &Path) -> DgwResult<Vec<ValidationResult>> {
        let files = collect_workbooks(dir)?;
        if files.is_empty() {
            warn!(dir = %dir.display(), "no .xlsx files to validate");
            return Ok(Vec::new());
        }

        run_batch(
            &files,
            |path| self.validate_workbook(path),
            |path, err| ValidationResult::file_error(&file_label(path), err.to_string()),
        )
    }

    /// Validate every data sheet of one workbook. A workbook without data
    /// sheets still yields one result, so every input file is accounted for.
    pub fn validate_workbook(&self, path: &Path) -> DgwResult<Vec<ValidationResult>> {
        let file = file_label(path);
        let category = RecordCategory::detect(&file);
        let rules = self.rules.with_category(category);
        info!(file = %file, record_type = %category, "validating");

        let mut reader = WorkbookReader::open(path)?;
        let sheets = reader.valid_sheets(&self.layout);
        if sheets.is_empty() {
            warn!(file = %file, "no valid sheets found");
            return Ok(vec![ValidationResult::sheet_error(
                &file,
                "",
                category,
                NO_VALID_SHEETS.to_string(),
            )]);
        }

        let results = sheets
            .iter()
            .map(|sheet| self.validate_sheet(&mut reader, &file, sheet, category, &rules))
            .collect();
        Ok(results)
    }

    fn validate_sheet(
        &self,
        reader: &mut WorkbookReader,
        file: &str,
        sheet: &str,
        category: RecordCategory,
        rules: &RuleRegistry,
    ) -> ValidationResult {
        let table = match reader.read_table(sheet, self.layout.template_header_index()) {
            Ok(table) => table,
            Err(e) => {
                warn!(file, sheet, error = %e, "sheet could not be read");
                return ValidationResult::sheet_error(file, sheet, category, e.to_string());
            }
        };
        debug!(file, sheet, stage = %SheetStage::Loaded, columns = ?table.columns());

        if let Some(sink) = &self.previews {
            if let Err(e) = sink.write(file, sheet, &table) {
                warn!(file, sheet, error = %e, "preview not written");
            }
        }

        self.validate_table(file, sheet, category, &table, rules)
    }

    /// Apply `rules` to an already loaded table
    pub fn validate_table(
        &self,
        file: &str,
        sheet: &str,
        category: RecordCategory,
        table: &Table,
        rules: &RuleRegistry,
    ) -> ValidationResult {
        let evaluations = match self.apply_rules(table, rules) {
            Ok(evaluations) => evaluations,
            Err(e) => {
                warn!(file, sheet, error = %e, "rule evaluation failed");
                return ValidationResult::sheet_error(file, sheet, category, e.to_string());
            }
        };
        debug!(file, sheet, stage = %SheetStage::RulesApplied, evaluations = evaluations.len());

        let aggregate = aggregate(&evaluations);
        debug!(
            file,
            sheet,
            stage = %SheetStage::Aggregated,
            total = aggregate.total,
            failed = aggregate.failed
        );

        let failures = self.report(&evaluations);
        info!(
            file,
            sheet,
            stage = %SheetStage::Reported,
            total_checks = aggregate.total,
            failed = aggregate.failed,
            success_pct = aggregate.success_pct,
            "sheet validated"
        );

        ValidationResult {
            file: file.to_string(),
            sheet: sheet.to_string(),
            record_type: category.to_string(),
            total_checks: aggregate.total,
            failed: aggregate.failed,
            success_pct: aggregate.success_pct,
            error: None,
            failures,
        }
    }

    /// RULES_APPLIED: one evaluation per (resolved column, rule).
    ///
    /// Two logical fields resolving to the same column with the same rule
    /// are evaluated once.
    fn apply_rules(&self, table: &Table, rules: &RuleRegistry) -> DgwResult<Vec<Evaluation>> {
        let mut evaluations = Vec::new();
        let mut applied: Vec<(&str, &Rule)> = Vec::new();

        for field in rules.fields() {
            let Some(column) = resolve_column(table.columns(), &field.field, &self.aliases) else {
                continue;
            };
            let values = table.column_values(column).unwrap_or_default();
            debug!(field = %field.field, column, "column resolved");

            for rule in &field.rules {
                if applied.contains(&(column, rule)) {
                    continue;
                }
                applied.push((column, rule));
                let violations = evaluate_rule(rule, &values)?;
                debug!(column, rule = %rule, violations = violations.len());
                evaluations.push(Evaluation {
                    column: column.to_string(),
                    violations,
                });
            }
        }

        Ok(evaluations)
    }

    /// REPORTED: one record per offending cell of every failed expectation
    fn report(&self, evaluations: &[Evaluation]) -> Vec<FailureRecord> {
        evaluations
            .iter()
            .flat_map(|evaluation| {
                evaluation.violations.iter().map(|v| FailureRecord {
                    column: evaluation.column.clone(),
                    row: self.layout.spreadsheet_row(v.row_index),
                    value: v.value.clone(),
                    rule: v.rule.to_string(),
                })
            })
            .collect()
    }
}

/// AGGREGATED: pass/fail counted per expectation, not per cell
fn aggregate(evaluations: &[Evaluation]) -> Aggregate {
    let total = evaluations.len();
    let failed = evaluations.iter().filter(|e| !e.passed()).count();
    let success_pct = if total == 0 {
        100.0
    } else {
        let pct = 100.0 * (1.0 - failed as f64 / total as f64);
        (pct * 100.0).round() / 100.0
    };
    Aggregate {
        total,
        failed,
        success_pct,
    }
}

fn evaluate_rule(rule: &Rule, values: &[&CellValue]) -> DgwResult<Vec<Violation>> {
    let mut violations = Vec::new();

    match rule {
        Rule::NotNull => {
            for (row_index, cell) in values.iter().enumerate() {
                if normalize_value(cell).is_none() {
                    violations.push(Violation {
                        row_index,
                        value: cell.render(),
                        rule: rule.identifier(),
                    });
                }
            }
        }
        Rule::Regex { pattern } => {
            let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
                DgwError::RuleEvaluation(format!("invalid pattern '{}': {}", pattern, e))
            })?;
            for (row_index, cell) in values.iter().enumerate() {
                match normalize_value(cell) {
                    None => violations.push(Violation {
                        row_index,
                        value: String::new(),
                        rule: Rule::NotNull.identifier(),
                    }),
                    Some(value) if !regex.is_match(&value) => violations.push(Violation {
                        row_index,
                        value,
                        rule: rule.identifier(),
                    }),
                    Some(_) => {}
                }
            }
        }
        Rule::AllowedSet { values: allowed } => {
            for (row_index, cell) in values.iter().enumerate() {
                if normalize_value(cell).is_none() {
                    continue;
                }
                let value = cell.render();
                if !allowed.contains(&value) {
                    violations.push(Violation {
                        row_index,
                        value,
                        rule: rule.identifier(),
                    });
                }
            }
        }
    }

    Ok(violations)
}

/// Text form of a cell with a trailing midnight time stripped; `None` for
/// blanks and textual null markers (`nan`, `None`, `NaT`)
pub fn normalize_value(cell: &CellValue) -> Option<String> {
    let rendered = cell.render();
    let stripped = match rendered.find(MIDNIGHT_SUFFIX) {
        Some(pos) => rendered[..pos].trim_end(),
        None => rendered.as_str(),
    };

    if stripped.trim().is_empty() || NULL_TOKENS.contains(&stripped) {
        None
    } else {
        Some(stripped.to_string())
    }
}
