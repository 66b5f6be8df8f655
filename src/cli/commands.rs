use crate::config::{self, Settings};
use crate::core::header::{detect_header_row, HeaderDetection};
use crate::core::transform::{TransformEngine, TransformOutcome, TransformStatus};
use crate::core::validation::{RuleEngine, ValidationResult};
use crate::error::{DgwError, DgwResult};
use crate::excel::WorkbookReader;
use crate::layout::LayoutConvention;
use crate::report::{
    clean_outputs, write_failure_files, write_json_summary, PreviewSink, TRANSFORM_SUMMARY,
    VALIDATION_SUMMARY,
};
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Directories one run works on, after command-line overrides
#[derive(Debug, Clone, PartialEq)]
pub struct RunPaths {
    pub incoming: PathBuf,
    pub templates: PathBuf,
    pub curated: PathBuf,
    pub outputs: PathBuf,
}

impl RunPaths {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            incoming: settings.incoming_dir(),
            templates: settings.templates_dir(),
            curated: settings.curated_dir(),
            outputs: settings.outputs_dir(),
        }
    }
}

/// Execute the transform command
pub fn transform(settings: &Settings, paths: &RunPaths) -> DgwResult<Vec<TransformOutcome>> {
    println!("{}", "🔄 DGW - Transforming legacy files".bold().green());
    println!("   Input:     {}", paths.incoming.display());
    println!("   Templates: {}", paths.templates.display());
    println!("   Output:    {}\n", paths.curated.display());

    let registry = config::load_mapping_registry(&settings.mappings_dir())?;
    let aliases = config::load_alias_table(&settings.aliases_file())?;
    let engine = TransformEngine::new(settings.layout.clone(), aliases)
        .with_header_mode(settings.source_header, settings.header_scan_rows);

    let outcomes =
        engine.transform_directory(&paths.incoming, &paths.templates, &paths.curated, &registry)?;

    if outcomes.is_empty() {
        println!("{}", "⚠️  Nothing to transform".yellow());
        return Ok(outcomes);
    }

    for outcome in &outcomes {
        print_transform_outcome(outcome);
    }

    if settings.reports.summary_json {
        write_json_summary(&paths.outputs.join(TRANSFORM_SUMMARY), &outcomes)?;
    }

    let converted = outcomes
        .iter()
        .filter(|o| o.status == TransformStatus::Converted)
        .count();
    println!();
    println!(
        "{}",
        format!("✅ Transform complete: {}/{} files converted", converted, outcomes.len())
            .bold()
            .green()
    );

    Ok(outcomes)
}

fn print_transform_outcome(outcome: &TransformOutcome) {
    match outcome.status {
        TransformStatus::Converted => {
            println!("   {} {}", "✔".green(), outcome.file.bright_blue().bold());
            if let (Some(mapping), Some(template)) = (&outcome.mapping, &outcome.template) {
                println!("      Mapping:  {}", mapping.cyan());
                println!("      Template: {}", template.cyan());
            }
            for sheet in &outcome.sheets {
                match &sheet.note {
                    Some(note) => {
                        println!("      {} {} ({})", "-".dimmed(), sheet.sheet, note.dimmed())
                    }
                    None => println!(
                        "      {} {}: {} rows",
                        "+".green(),
                        sheet.sheet,
                        sheet.rows_written
                    ),
                }
            }
        }
        TransformStatus::Skipped => {
            println!(
                "   {} {} skipped: {}",
                "⚠️ ".yellow(),
                outcome.file.bright_blue(),
                outcome.error.as_deref().unwrap_or_default().yellow()
            );
        }
        TransformStatus::Failed => {
            println!(
                "   {} {} failed: {}",
                "❌".red(),
                outcome.file.bright_blue(),
                outcome.error.as_deref().unwrap_or_default().red()
            );
        }
    }
}

/// Execute the validate command
pub fn validate(
    settings: &Settings,
    paths: &RunPaths,
    fail_on_errors: bool,
) -> DgwResult<Vec<ValidationResult>> {
    println!("{}", "🔍 DGW - Validating transformed files".bold().green());
    println!("   Input:   {}", paths.curated.display());
    println!("   Reports: {}\n", paths.outputs.display());

    let rules = config::load_rule_registry(&settings.rules_file())?;
    let aliases = config::load_alias_table(&settings.aliases_file())?;
    let mut engine = RuleEngine::new(settings.layout.clone(), rules, aliases);
    if settings.reports.previews {
        engine = engine.with_previews(PreviewSink::new(
            &paths.outputs,
            settings.reports.preview_rows,
        )?);
    }

    let results = engine.validate_directory(&paths.curated)?;
    if results.is_empty() {
        println!("{}", "⚠️  Nothing to validate".yellow());
        return Ok(results);
    }

    if settings.reports.failures_csv {
        let written = write_failure_files(&paths.outputs, &results)?;
        if !written.is_empty() {
            println!("   {} failure file(s) written\n", written.len());
        }
    }
    if settings.reports.summary_json {
        write_json_summary(&paths.outputs.join(VALIDATION_SUMMARY), &results)?;
    }

    print_validation_summary(&results);

    let not_passing = results.iter().filter(|r| !r.is_passing()).count();
    println!();
    if not_passing == 0 {
        println!("{}", "✅ All sheets passed!".bold().green());
    } else {
        println!(
            "{}",
            format!("❌ {} of {} sheets did not pass", not_passing, results.len())
                .bold()
                .red()
        );
        if fail_on_errors {
            return Err(DgwError::ValidationFailed(format!(
                "{} of {} sheets did not pass",
                not_passing,
                results.len()
            )));
        }
    }

    Ok(results)
}

fn print_validation_summary(results: &[ValidationResult]) {
    println!(
        "   {:<36} {:<20} {:<20} {:>7} {:>7} {:>9}",
        "File".bold(),
        "Sheet".bold(),
        "Type".bold(),
        "Checks".bold(),
        "Failed".bold(),
        "Success".bold()
    );

    for result in results {
        let pct = format!("{:.2}%", result.success_pct);
        let pct = if result.error.is_some() {
            pct.yellow()
        } else if result.failed == 0 {
            pct.green()
        } else {
            pct.red()
        };
        println!(
            "   {:<36} {:<20} {:<20} {:>7} {:>7} {:>9}",
            result.file, result.sheet, result.record_type, result.total_checks, result.failed, pct
        );
        if let Some(error) = &result.error {
            println!("      {} {}", "❌".red(), error.red());
        }
    }
}

/// Execute the full pipeline: transform, then validate
pub fn run(settings: &Settings, paths: &RunPaths, fail_on_errors: bool) -> DgwResult<()> {
    transform(settings, paths)?;
    println!();
    validate(settings, paths, fail_on_errors)?;
    Ok(())
}

/// Execute the clean command
pub fn clean(paths: &RunPaths) -> DgwResult<()> {
    println!("{}", "🧹 DGW - Cleaning report folders".bold().green());
    println!("   Outputs: {}\n", paths.outputs.display());

    let removed = clean_outputs(&paths.outputs)?;
    println!("{}", format!("✅ Removed {} file(s)", removed).bold().green());
    Ok(())
}

/// Execute the detect-header command
pub fn detect_header(
    file: &Path,
    sheet: Option<String>,
    max_scan: usize,
    layout: &LayoutConvention,
) -> DgwResult<HeaderDetection> {
    println!("{}", "🔎 DGW - Header detection".bold().green());
    println!("   File: {}", file.display());

    let mut reader = WorkbookReader::open(file)?;
    let sheet = match sheet {
        Some(sheet) => sheet,
        None => reader.valid_sheets(layout).into_iter().next().ok_or_else(|| {
            DgwError::WorkbookRead(format!("{} has no data sheets", file.display()))
        })?,
    };
    println!("   Sheet: {}\n", sheet.bright_blue().bold());

    let grid = reader.read_grid(&sheet)?;
    let detection = detect_header_row(grid.preview(max_scan), max_scan);

    println!(
        "   Header row: {} (spreadsheet row {})",
        detection.row.to_string().bold(),
        detection.row + 1
    );
    println!("   Method:     {}", detection.method.to_string().cyan());

    let labels: Vec<String> = grid
        .preview(detection.row + 1)
        .get(detection.row)
        .map(|cells| {
            cells
                .iter()
                .filter(|cell| !cell.is_empty())
                .map(|cell| cell.render())
                .collect()
        })
        .unwrap_or_default();
    if !labels.is_empty() {
        println!("   Labels:     {}", labels.join(", "));
    }

    let fixed = layout.source_header_index();
    if detection.row != fixed {
        println!(
            "{}",
            format!(
                "⚠️  Differs from the fixed source header row (spreadsheet row {})",
                fixed + 1
            )
            .yellow()
        );
    }

    Ok(detection)
}

/// Execute the sheets command
pub fn sheets(file: &Path, layout: &LayoutConvention) -> DgwResult<Vec<String>> {
    println!("{}", "📄 DGW - Workbook sheets".bold().green());
    println!("   File: {}\n", file.display());

    let reader = WorkbookReader::open(file)?;
    let valid = reader.valid_sheets(layout);
    for name in reader.sheet_names() {
        if valid.contains(&name) {
            println!("   {} {}", "✔".green(), name.bright_blue());
        } else {
            println!("   {} {} (excluded)", "-".dimmed(), name.dimmed());
        }
    }
    println!("\n   {} data sheet(s)", valid.len());

    Ok(valid)
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
