//! Report artifact writing.

use std::fs;
use std::path::{Path, PathBuf};

use plinth_core::outcome::ImportReport;

/// Write a timestamped JSON report into `dir`, creating it if needed.
/// Returns the path of the written file.
pub fn write_report(dir: &Path, report: &ImportReport) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let filename = format!(
        "import-report-{}-{}.json",
        report.source_name,
        report.finished_at.format("%Y%m%dT%H%M%SZ")
    );
    let path = dir.join(filename);

    fs::write(&path, serde_json::to_vec_pretty(report)?)?;
    Ok(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
