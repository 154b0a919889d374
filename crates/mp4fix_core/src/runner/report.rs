//! JSON run report.

use std::fs;
use std::io::Write;
use std::path::Path;

use super::errors::{RunError, RunResult};
use super::types::RunSummary;

/// Write `summary` as pretty JSON to `path`, atomically.
pub fn write_report(summary: &RunSummary, path: &Path) -> RunResult<()> {
    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| RunError::report(path, e.to_string()))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| RunError::io("creating report directory", e))?;
        }
    }

    let temp_path = path.with_extension("json.tmp");
    let write = || -> std::io::Result<()> {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    };

    write().map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        RunError::report(path, e.to_string())
    })?;

    tracing::info!("Wrote run report to {}", path.display());
    Ok(())
}
