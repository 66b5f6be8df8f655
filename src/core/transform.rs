//! Transform Engine - legacy workbooks → DGW template layout
//!
//! The output of one legacy file is a copy of its selected template file with
//! data rows written from the template's data start row downward. Template
//! sheets with no matching source sheet are left as the template defined them.

use crate::core::batch::{collect_workbooks, file_label, run_batch};
use crate::core::header::{detect_header_row, HeaderMethod, HeaderMode, DEFAULT_MAX_SCAN};
use crate::error::{DgwError, DgwResult};
use crate::excel::{TemplateWriter, WorkbookReader};
use crate::layout::LayoutConvention;
use crate::mapping::{
    select_mapping, select_template, AliasTable, MappingDefinition, MappingRegistry,
};
use crate::report::ensure_dir;
use crate::types::{SheetGrid, Workbook};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Suffix appended to the input stem for output workbooks
pub const OUTPUT_SUFFIX: &str = "_DGW_ready";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetOutcome {
    pub sheet: String,
    pub rows_written: usize,
    /// Why nothing was written, for skipped sheets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformStatus {
    Converted,
    /// No mapping or template applies to the file
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformOutcome {
    pub file: String,
    pub status: TransformStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    pub sheets: Vec<SheetOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransformOutcome {
    pub fn from_error(file: &str, err: &DgwError) -> Self {
        let status = match err {
            DgwError::ConfigurationMissing(_) | DgwError::TemplateNotFound(_) => {
                TransformStatus::Skipped
            }
            _ => TransformStatus::Failed,
        };
        Self {
            file: file.to_string(),
            status,
            mapping: None,
            template: None,
            output: None,
            sheets: Vec::new(),
            error: Some(err.to_string()),
        }
    }

    pub fn rows_written(&self) -> usize {
        self.sheets.iter().map(|s| s.rows_written).sum()
    }
}

/// Output file name for a legacy input: `<stem>_DGW_ready.xlsx`
pub fn output_file_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}{}.xlsx", stem, OUTPUT_SUFFIX)
}

pub struct TransformEngine {
    layout: LayoutConvention,
    aliases: AliasTable,
    header_mode: HeaderMode,
    scan_rows: usize,
}

impl TransformEngine {
    pub fn new(layout: LayoutConvention, aliases: AliasTable) -> Self {
        Self {
            layout,
            aliases,
            header_mode: HeaderMode::Fixed,
            scan_rows: DEFAULT_MAX_SCAN,
        }
    }

    pub fn with_header_mode(mut self, mode: HeaderMode, scan_rows: usize) -> Self {
        self.header_mode = mode;
        self.scan_rows = scan_rows;
        self
    }

    pub fn layout(&self) -> &LayoutConvention {
        &self.layout
    }

    /// Transform every legacy workbook in `incoming` into `output_dir`.
    ///
    /// Files without a mapping or template are recorded as skipped, broken
    /// files as failed; neither stops the batch. An unusable output
    /// directory does.
    pub fn transform_directory(
        &self,
        incoming: &Path,
        templates_dir: &Path,
        output_dir: &Path,
        registry: &MappingRegistry,
    ) -> DgwResult<Vec<TransformOutcome>> {
        let files = collect_workbooks(incoming)?;
        if files.is_empty() {
            warn!(dir = %incoming.display(), "no .xlsx files to transform");
            return Ok(Vec::new());
        }

        let templates: Vec<String> = collect_workbooks(templates_dir)?
            .iter()
            .map(|path| file_label(path))
            .collect();
        if templates.is_empty() {
            warn!(dir = %templates_dir.display(), "no DGW templates found");
            return Ok(Vec::new());
        }

        ensure_dir(output_dir)?;

        run_batch(
            &files,
            |path| {
                self.transform_file(path, templates_dir, &templates, registry, output_dir)
                    .map(|outcome| vec![outcome])
            },
            |path, err| TransformOutcome::from_error(&file_label(path), err),
        )
    }

    /// Transform one legacy workbook and save it under `output_dir`
    pub fn transform_file(
        &self,
        source_path: &Path,
        templates_dir: &Path,
        templates: &[String],
        registry: &MappingRegistry,
        output_dir: &Path,
    ) -> DgwResult<TransformOutcome> {
        let file = file_label(source_path);
        let kind = select_mapping(&file);
        let mapping = registry.get(kind)?;
        let template = select_template(&file, templates)
            .ok_or_else(|| DgwError::TemplateNotFound(file.clone()))?;
        info!(file = %file, mapping = %kind, template, "transforming");

        let source = WorkbookReader::open(source_path)?.read_workbook()?;
        let template_path = templates_dir.join(template);
        let template_book = WorkbookReader::open(&template_path)?.read_workbook()?;

        let (output, sheets) = self.transform(&source, &template_book, mapping);

        let output_path = output_dir.join(output_file_name(source_path));
        let cells = TemplateWriter::new(&template_book, &output).save(&template_path, &output_path)?;
        info!(output = %output_path.display(), cells, "saved");

        Ok(TransformOutcome {
            file,
            status: TransformStatus::Converted,
            mapping: Some(kind.file_name()),
            template: Some(template.to_string()),
            output: Some(output_path),
            sheets,
            error: None,
        })
    }

    /// Fill a copy of `template` with the rows of `source`
    pub fn transform(
        &self,
        source: &Workbook,
        template: &Workbook,
        mapping: &MappingDefinition,
    ) -> (Workbook, Vec<SheetOutcome>) {
        let mut output = template.clone();
        let source_sheets = self.layout.valid_sheets(&source.sheet_names());
        let mut outcomes = Vec::new();

        for name in template.sheet_names() {
            let source_sheet = source
                .sheet(&name)
                .filter(|_| source_sheets.contains(&name));
            let (Some(source_sheet), Some(target)) = (source_sheet, output.sheet_mut(&name))
            else {
                debug!(sheet = %name, "no source sheet, left as template");
                outcomes.push(SheetOutcome {
                    sheet: name,
                    rows_written: 0,
                    note: Some("no matching source sheet".to_string()),
                });
                continue;
            };

            let rows_written = self.fill_sheet(&name, &source_sheet.grid, &mut target.grid, mapping);
            outcomes.push(SheetOutcome {
                sheet: name,
                rows_written,
                note: None,
            });
        }

        (output, outcomes)
    }

    /// Write mapped values into `target`; returns the number of rows written
    fn fill_sheet(
        &self,
        sheet: &str,
        source: &SheetGrid,
        target: &mut SheetGrid,
        mapping: &MappingDefinition,
    ) -> usize {
        let table = source.table_at(self.source_header_index(sheet, source));
        let positions = target.header_positions(self.layout.template_header_index());

        // (source column index, every target position of the label)
        let mut resolved: Vec<(usize, &[usize])> = Vec::new();
        for entry in &mapping.entries {
            let Some(target_cols) = positions.get(entry.target.trim()) else {
                debug!(sheet, target = %entry.target, "target header absent from template");
                continue;
            };
            let Some(column) = entry.resolve_source(table.columns(), &self.aliases) else {
                debug!(sheet, target = %entry.target, "no source column");
                continue;
            };
            if let Some(idx) = table.column_index(column) {
                debug!(sheet, target = %entry.target, source = column, positions = ?target_cols);
                resolved.push((idx, target_cols.as_slice()));
            }
        }

        let start = self.layout.data_start_index();
        let mut offset = 0;
        for (row_idx, row) in table.rows().iter().enumerate() {
            if table.is_row_empty(row_idx) {
                continue;
            }
            for (src_col, target_cols) in &resolved {
                for col in target_cols.iter() {
                    target.set(start + offset, *col, row[*src_col].clone());
                }
            }
            offset += 1;
        }

        info!(sheet, rows = offset, mapped_fields = resolved.len(), "sheet filled");
        offset
    }

    /// Header row of a legacy sheet under the configured [`HeaderMode`]
    fn source_header_index(&self, sheet: &str, grid: &SheetGrid) -> usize {
        let fixed = self.layout.source_header_index();
        let detection = detect_header_row(grid.preview(self.scan_rows), self.scan_rows);

        match self.header_mode {
            HeaderMode::Fixed => {
                if detection.method != HeaderMethod::Default && detection.row != fixed {
                    warn!(
                        sheet,
                        fixed_row = fixed + 1,
                        detected_row = detection.row + 1,
                        method = %detection.method,
                        "detected header row differs from the fixed source header row"
                    );
                }
                fixed
            }
            HeaderMode::Detect => {
                debug!(sheet, row = detection.row + 1, method = %detection.method, "header detected");
                detection.row
            }
        }
    }
}
