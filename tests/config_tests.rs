//! Settings files driving whole runs

mod common;

use calamine::Data;
use common::*;
use dgw_pipeline::cli::{self, RunPaths};
use dgw_pipeline::config::{load_mapping_registry, load_rule_registry, Settings};
use dgw_pipeline::core::{HeaderMode, TransformStatus};
use dgw_pipeline::error::DgwError;
use dgw_pipeline::mapping::MappingKind;
use pretty_assertions::assert_eq;
use std::fs;

#[test]
fn test_relative_paths_resolve_against_settings_file() {
    let project = Project::new();
    let path = project.write_settings(
        r#"
paths:
  incoming: legacy
  outputs: /var/tmp/dgw-reports
config:
  rules_file: rules/checks.yaml
"#,
    );

    let settings = Settings::load(Some(&path)).unwrap();
    let root = project.root();
    assert_eq!(settings.incoming_dir(), root.join("legacy"));
    assert_eq!(settings.templates_dir(), root.join("data/templates_dgw"));
    assert_eq!(settings.outputs_dir(), std::path::PathBuf::from("/var/tmp/dgw-reports"));
    assert_eq!(settings.rules_file(), root.join("rules/checks.yaml"));
    assert_eq!(settings.mappings_dir(), root.join("config/mappings"));
    assert_eq!(settings.source_header, HeaderMode::Fixed);
}

#[test]
fn test_invalid_layout_is_rejected_on_load() {
    let project = Project::new();
    let path = project.write_settings("layout:\n  template_header_row: 6\n  data_start_row: 6\n");
    let err = Settings::load(Some(&path)).unwrap_err();
    assert!(matches!(err, DgwError::InvalidConfiguration(_)));
}

#[test]
fn test_unknown_header_mode_is_a_yaml_error() {
    let project = Project::new();
    let path = project.write_settings("source_header: guess\n");
    assert!(matches!(
        Settings::load(Some(&path)),
        Err(DgwError::Yaml(_))
    ));
}

#[test]
fn test_mapping_directory_loads_every_kind_present() {
    let project = Project::new();
    project.write_mapping("hire", "mappings:\n  Employee ID: EmpID\n");
    project.write_mapping("contact", "Email Address: [Email, E-mail]\n");
    project.write_mapping("generic", "");

    let registry = load_mapping_registry(&project.config.join("mappings")).unwrap();
    assert_eq!(registry.len(), 3);
    assert_eq!(
        registry.get(MappingKind::Contact).unwrap().entries[0].sources,
        vec!["Email", "E-mail"]
    );
    assert!(registry.get(MappingKind::Generic).unwrap().is_empty());
    assert!(matches!(
        registry.get(MappingKind::Absence),
        Err(DgwError::ConfigurationMissing(_))
    ));
}

#[test]
fn test_broken_mapping_file_names_the_file() {
    let project = Project::new();
    project.write_mapping("hire", "mappings:\n  Employee ID: {nested: true}\n");
    let err = load_mapping_registry(&project.config.join("mappings")).unwrap_err();
    assert!(err.to_string().contains("mapping_hire.yaml"));
}

#[test]
fn test_unknown_expectation_in_rule_file() {
    let project = Project::new();
    project.write_rules("employee_id:\n  expectations: [not_null, be_awesome]\n");
    let err = load_rule_registry(&project.config.join("rules_global.yaml")).unwrap_err();
    assert!(err.to_string().contains("be_awesome"));
}

/// A project whose templates put labels on row 3 and data from row 4
#[test]
fn test_custom_layout_drives_transform_and_validate() {
    let project = Project::new();
    project.write_mapping("worker", "mappings:\n  Employee ID: EmpID\n  Name: Name\n");
    project.write_rules("Employee ID:\n  expectations: [not_null]\n");
    let path = project.write_settings(
        r#"
layout:
  source_header_row: 1
  template_header_row: 3
  data_start_row: 4
reports:
  summary_json: false
"#,
    );

    write_xlsx(
        &project.templates.join("DGW_Worker.xlsx"),
        &[("Worker", text_rows(&[&["DGW"], &[], &["Employee ID", "Name"]]))],
    );
    write_xlsx(
        &project.incoming.join("Worker_2024.xlsx"),
        &[(
            "Worker",
            text_rows(&[&["EmpID", "Name"], &["W1", "Ana"], &["", "Bia"]]),
        )],
    );

    let settings = Settings::load(Some(&path)).unwrap();
    let paths = RunPaths::from_settings(&settings);

    let outcomes = cli::transform(&settings, &paths).unwrap();
    assert_eq!(outcomes[0].status, TransformStatus::Converted);
    let output = project.curated.join("Worker_2024_DGW_ready.xlsx");
    assert_eq!(read_cell(&output, "Worker", 3, 0), Data::String("W1".into()));

    let results = cli::validate(&settings, &paths, false).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].failures.len(), 1);
    assert_eq!(results[0].failures[0].row, 5);
    assert!(!project.outputs.join("validation_summary.json").exists());
    assert!(fs::read_dir(project.outputs.join("failures")).unwrap().count() == 1);
}
