//! Partial-failure batch loop shared by both pipeline stages

use crate::error::{DgwError, DgwResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Run `process` over every item, in order.
///
/// A failing item is logged and turned into a record by `on_error`, so the
/// output always covers every input. Fatal errors (see
/// [`DgwError::is_fatal`]) stop the batch and are returned.
pub fn run_batch<T, R, P, E>(items: &[T], mut process: P, mut on_error: E) -> DgwResult<Vec<R>>
where
    T: AsRef<Path>,
    P: FnMut(&Path) -> DgwResult<Vec<R>>,
    E: FnMut(&Path, &DgwError) -> R,
{
    let mut results = Vec::new();

    for item in items {
        let path = item.as_ref();
        match process(path) {
            Ok(records) => results.extend(records),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "file failed, continuing");
                results.push(on_error(path, &e));
            }
        }
    }

    Ok(results)
}

/// `.xlsx` files directly inside `dir`, sorted by name. Office lock files
/// (`~$name.xlsx`) are ignored.
pub fn collect_workbooks(dir: &Path) -> DgwResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let is_xlsx = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));
        if is_xlsx && !file_label(&path).starts_with("~$") {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// File name used in results and logs
pub fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
