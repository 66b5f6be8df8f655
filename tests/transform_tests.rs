//! Transform Engine against real workbooks on disk

mod common;

use calamine::Data;
use common::*;
use dgw_pipeline::config::{load_alias_table, load_mapping_registry};
use dgw_pipeline::core::{HeaderMode, TransformEngine, TransformStatus};
use dgw_pipeline::{DgwError, LayoutConvention};
use pretty_assertions::assert_eq;
use rust_xlsxwriter::{Color, Format, Workbook};
use std::fs;
use std::path::Path;

const HIRE_MAPPING: &str = r#"
mappings:
  Employee ID: EmpID
  Country Code: [Country, Ctry]
  Annual Salary: Salary
"#;

fn engine(project: &Project) -> TransformEngine {
    let aliases = load_alias_table(&project.config.join("field_mappings.yaml")).unwrap();
    TransformEngine::new(LayoutConvention::default(), aliases)
}

fn run(project: &Project) -> Vec<dgw_pipeline::core::TransformOutcome> {
    let registry = load_mapping_registry(&project.config.join("mappings")).unwrap();
    engine(project)
        .transform_directory(
            &project.incoming,
            &project.templates,
            &project.curated,
            &registry,
        )
        .unwrap()
}

fn hire_project() -> Project {
    let project = Project::new();
    project.write_mapping("hire", HIRE_MAPPING);
    write_template(
        &project.templates.join("DGW_HireStack.xlsx"),
        &[
            (">Instructions", &["Read me"]),
            ("Hire", &["Employee ID", "Country Code", "Annual Salary", "Country Code"]),
            ("Dependents", &["Dependent Name"]),
        ],
    );
    write_template(
        &project.templates.join("DGW_Absence.xlsx"),
        &[("Absence", &["Employee ID", "Leave Type"])],
    );
    project
}

// ═══════════════════════════════════════════════════════════════════════════
// CONVERSION
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_hire_file_lands_in_hirestack_template() {
    let project = hire_project();
    write_legacy(
        &project.incoming.join("Hire_Batch1.xlsx"),
        "Hire",
        &["EmpID", "Ctry", "Salary"],
        vec![
            vec![Text("E001"), Text("BR"), Number(85000.0)],
            vec![Text("E002"), Text("US"), Number(91000.5)],
        ],
    );

    let outcomes = run(&project);
    assert_eq!(outcomes.len(), 1);
    let outcome = &outcomes[0];
    assert_eq!(outcome.status, TransformStatus::Converted);
    assert_eq!(outcome.template.as_deref(), Some("DGW_HireStack.xlsx"));
    assert_eq!(outcome.mapping.as_deref(), Some("mapping_hire.yaml"));

    let output = project.curated.join("Hire_Batch1_DGW_ready.xlsx");
    assert_eq!(outcome.output.as_deref(), Some(output.as_path()));
    assert_eq!(
        sheet_names(&output),
        vec![">Instructions", "Hire", "Dependents"]
    );

    // header stays on row 6, data starts on row 7
    assert_eq!(read_cell(&output, "Hire", 5, 0), Data::String("Employee ID".into()));
    assert_eq!(read_cell(&output, "Hire", 6, 0), Data::String("E001".into()));
    assert_eq!(read_cell(&output, "Hire", 7, 0), Data::String("E002".into()));
    assert_eq!(read_cell(&output, "Hire", 6, 2), Data::Float(85000.0));
    assert_eq!(read_cell(&output, "Hire", 7, 2), Data::Float(91000.5));
}

#[test]
fn test_duplicate_target_header_receives_every_value() {
    let project = hire_project();
    write_legacy(
        &project.incoming.join("Hire_Batch1.xlsx"),
        "Hire",
        &["EmpID", "Country"],
        vec![vec![Text("E001"), Text("BR")]],
    );

    run(&project);
    let output = project.curated.join("Hire_Batch1_DGW_ready.xlsx");
    assert_eq!(read_cell(&output, "Hire", 6, 1), Data::String("BR".into()));
    assert_eq!(read_cell(&output, "Hire", 6, 3), Data::String("BR".into()));
}

#[test]
fn test_blank_rows_do_not_consume_destination_rows() {
    let project = hire_project();
    write_legacy(
        &project.incoming.join("Hire_Batch1.xlsx"),
        "Hire",
        &["EmpID", "Country"],
        vec![
            vec![Text("E001"), Text("BR")],
            vec![Blank, Blank],
            vec![Text("E003"), Blank],
        ],
    );

    let outcomes = run(&project);
    let output = project.curated.join("Hire_Batch1_DGW_ready.xlsx");
    assert_eq!(read_cell(&output, "Hire", 6, 0), Data::String("E001".into()));
    assert_eq!(read_cell(&output, "Hire", 7, 0), Data::String("E003".into()));
    assert_eq!(read_cell(&output, "Hire", 8, 0), Data::Empty);
    assert_eq!(outcomes[0].rows_written(), 2);
}

#[test]
fn test_template_sheet_without_source_is_left_as_is() {
    let project = hire_project();
    write_legacy(
        &project.incoming.join("Hire_Batch1.xlsx"),
        "Hire",
        &["EmpID"],
        vec![vec![Text("E001")]],
    );

    let outcomes = run(&project);
    let dependents = outcomes[0]
        .sheets
        .iter()
        .find(|s| s.sheet == "Dependents")
        .unwrap();
    assert_eq!(dependents.rows_written, 0);
    assert!(dependents.note.is_some());

    let output = project.curated.join("Hire_Batch1_DGW_ready.xlsx");
    assert_eq!(
        read_cell(&output, "Dependents", 5, 0),
        Data::String("Dependent Name".into())
    );
    assert_eq!(read_cell(&output, "Dependents", 6, 0), Data::Empty);
}

/// Hire template with a bold yellow header, a wide column A and a formula
fn write_styled_template(path: &Path) {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold().set_background_color(Color::Yellow);
    let sheet = workbook.add_worksheet().set_name("Hire").unwrap();
    sheet.write_string(0, 0, "DGW template").unwrap();
    sheet.write_formula(0, 3, "=1+1").unwrap();
    sheet
        .write_string_with_format(5, 0, "Employee ID", &header)
        .unwrap();
    sheet.set_column_width(0, 40).unwrap();
    workbook.save(path).unwrap();
}

#[test]
fn test_template_formatting_and_formulas_survive() {
    let project = Project::new();
    project.write_mapping("hire", HIRE_MAPPING);
    write_styled_template(&project.templates.join("DGW_HireStack.xlsx"));
    write_legacy(
        &project.incoming.join("Hire_Batch1.xlsx"),
        "Hire",
        &["EmpID"],
        vec![vec![Text("E001")]],
    );

    let outcomes = run(&project);
    assert_eq!(outcomes[0].status, TransformStatus::Converted);

    let output = project.curated.join("Hire_Batch1_DGW_ready.xlsx");
    assert_eq!(read_cell(&output, "Hire", 6, 0), Data::String("E001".into()));

    let book = umya_spreadsheet::reader::xlsx::read(&output).unwrap();
    let sheet = book.get_sheet_by_name("Hire").unwrap();

    let formula = sheet.get_cell("D1").map(|cell| cell.get_formula().to_string());
    assert_eq!(formula.as_deref(), Some("1+1"));

    let bold = sheet
        .get_style("A6")
        .get_font()
        .map(|font| font.get_bold().to_owned());
    assert_eq!(bold, Some(true));

    let width = sheet
        .get_column_dimension("A")
        .map(|column| column.get_width().to_owned())
        .unwrap_or_default();
    assert!(width > 39.0, "column A width was {}", width);
}

#[test]
fn test_rerun_overwrites_previous_output() {
    let project = hire_project();
    let source = project.incoming.join("Hire_Batch1.xlsx");
    write_legacy(
        &source,
        "Hire",
        &["EmpID"],
        vec![vec![Text("E001")], vec![Text("E002")]],
    );
    run(&project);

    write_legacy(&source, "Hire", &["EmpID"], vec![vec![Text("E009")]]);
    run(&project);

    let output = project.curated.join("Hire_Batch1_DGW_ready.xlsx");
    assert_eq!(read_cell(&output, "Hire", 6, 0), Data::String("E009".into()));
    assert_eq!(read_cell(&output, "Hire", 7, 0), Data::Empty);
    assert_eq!(fs::read_dir(&project.curated).unwrap().count(), 1);
}

#[test]
fn test_detect_mode_reads_labels_below_marker_row() {
    let project = hire_project();
    let source = project.incoming.join("Hire_Batch1.xlsx");
    write_xlsx(
        &source,
        &[(
            "Hire",
            text_rows(&[
                &["Hire export"],
                &["generated 2024-01-31"],
                &["Required", "Optional"],
                &["EmpID", "Country"],
                &["E001", "BR"],
            ]),
        )],
    );

    let registry = load_mapping_registry(&project.config.join("mappings")).unwrap();
    engine(&project)
        .with_header_mode(HeaderMode::Detect, 15)
        .transform_directory(
            &project.incoming,
            &project.templates,
            &project.curated,
            &registry,
        )
        .unwrap();

    let output = project.curated.join("Hire_Batch1_DGW_ready.xlsx");
    assert_eq!(read_cell(&output, "Hire", 6, 0), Data::String("E001".into()));
    assert_eq!(read_cell(&output, "Hire", 6, 1), Data::String("BR".into()));
}

// ═══════════════════════════════════════════════════════════════════════════
// PARTIAL FAILURE
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_batch_continues_past_skipped_and_broken_files() {
    let project = hire_project();
    // sorted order: Broken_hire, Hire_Batch1, Payroll
    fs::write(project.incoming.join("Broken_hire.xlsx"), b"not a zip").unwrap();
    write_legacy(
        &project.incoming.join("Hire_Batch1.xlsx"),
        "Hire",
        &["EmpID"],
        vec![vec![Text("E001")]],
    );
    project.write_mapping("generic", "mappings:\n  Employee ID: EmpID\n");
    write_legacy(
        &project.incoming.join("Payroll.xlsx"),
        "Pay",
        &["EmpID"],
        vec![vec![Text("E001")]],
    );

    let outcomes = run(&project);
    let statuses: Vec<(&str, TransformStatus)> = outcomes
        .iter()
        .map(|o| (o.file.as_str(), o.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("Broken_hire.xlsx", TransformStatus::Failed),
            ("Hire_Batch1.xlsx", TransformStatus::Converted),
            ("Payroll.xlsx", TransformStatus::Skipped),
        ]
    );
    assert!(outcomes[2]
        .error
        .as_ref()
        .unwrap()
        .starts_with("Template not found"));
}

#[test]
fn test_missing_mapping_file_skips_input() {
    let project = hire_project();
    write_legacy(
        &project.incoming.join("Absence_2024.xlsx"),
        "Absence",
        &["EmpID"],
        vec![vec![Text("E001")]],
    );

    let outcomes = run(&project);
    assert_eq!(outcomes[0].status, TransformStatus::Skipped);
    assert_eq!(
        outcomes[0].error.as_deref(),
        Some("Configuration missing: mapping_absence.yaml")
    );
    assert!(!project.curated.join("Absence_2024_DGW_ready.xlsx").exists());
}

#[test]
fn test_unusable_output_directory_stops_run() {
    let project = hire_project();
    write_legacy(
        &project.incoming.join("Hire_Batch1.xlsx"),
        "Hire",
        &["EmpID"],
        vec![vec![Text("E001")]],
    );
    let blocker = project.root().join("blocker");
    fs::write(&blocker, "file, not a folder").unwrap();

    let registry = load_mapping_registry(&project.config.join("mappings")).unwrap();
    let result = engine(&project).transform_directory(
        &project.incoming,
        &project.templates,
        &blocker.join("curated"),
        &registry,
    );
    assert!(matches!(result, Err(DgwError::OutputDirectory(_))));
}

#[test]
fn test_empty_incoming_folder() {
    let project = hire_project();
    assert!(run(&project).is_empty());
}
