//! Files written next to a run: failure CSVs, sheet previews, JSON summaries

use crate::core::validation::ValidationResult;
use crate::error::{DgwError, DgwResult};
use crate::types::Table;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const FAILURES_DIR: &str = "failures";
pub const PREVIEWS_DIR: &str = "previews";
pub const VALIDATION_SUMMARY: &str = "validation_summary.json";
pub const TRANSFORM_SUMMARY: &str = "transform_summary.json";

/// Spreadsheet tools detect UTF-8 CSV by this marker
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Create `dir` (and parents); failure here stops the run
pub fn ensure_dir(dir: &Path) -> DgwResult<()> {
    fs::create_dir_all(dir).map_err(|e| {
        DgwError::OutputDirectory(format!("Cannot create {}: {}", dir.display(), e))
    })
}

/// `<file>_<sheet>_<suffix>.csv` with path separators replaced
fn report_file_name(file: &str, sheet: &str, suffix: &str) -> String {
    let sanitize = |s: &str| s.replace(['/', '\\', ':'], "_");
    format!("{}_{}_{}.csv", sanitize(file), sanitize(sheet), suffix)
}

/// Write one failures CSV per sheet with failures; returns the files written
pub fn write_failure_files(
    outputs_dir: &Path,
    results: &[ValidationResult],
) -> DgwResult<Vec<PathBuf>> {
    let dir = outputs_dir.join(FAILURES_DIR);
    ensure_dir(&dir)?;

    let mut written = Vec::new();
    for result in results.iter().filter(|r| !r.failures.is_empty()) {
        let path = dir.join(report_file_name(&result.file, &result.sheet, "failures"));

        let mut file = File::create(&path)?;
        file.write_all(UTF8_BOM)?;
        let mut writer = csv::Writer::from_writer(file);
        for failure in &result.failures {
            writer.serialize(failure)?;
        }
        writer.flush()?;

        debug!(path = %path.display(), failures = result.failures.len(), "failures written");
        written.push(path);
    }
    Ok(written)
}

/// Writes the first rows of each validated sheet as CSV
#[derive(Debug, Clone)]
pub struct PreviewSink {
    dir: PathBuf,
    rows: usize,
}

impl PreviewSink {
    pub fn new(outputs_dir: &Path, rows: usize) -> DgwResult<Self> {
        let dir = outputs_dir.join(PREVIEWS_DIR);
        ensure_dir(&dir)?;
        Ok(Self { dir, rows })
    }

    pub fn write(&self, file: &str, sheet: &str, table: &Table) -> DgwResult<PathBuf> {
        let path = self.dir.join(report_file_name(file, sheet, "preview"));
        let mut writer = csv::Writer::from_path(&path)?;

        writer.write_record(table.columns())?;
        for row in table.rows().iter().take(self.rows) {
            writer.write_record(row.iter().map(|cell| cell.render()))?;
        }
        writer.flush()?;

        debug!(path = %path.display(), "preview written");
        Ok(path)
    }
}

/// Pretty-printed JSON of `value` at `path`
pub fn write_json_summary<T: Serialize + ?Sized>(path: &Path, value: &T) -> DgwResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

/// Delete the files inside the failures and previews folders; returns how many
pub fn clean_outputs(outputs_dir: &Path) -> DgwResult<usize> {
    let mut removed = 0;

    for sub in [FAILURES_DIR, PREVIEWS_DIR] {
        let dir = outputs_dir.join(sub);
        if !dir.is_dir() {
            continue;
        }
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_file() {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
    }

    Ok(removed)
}
