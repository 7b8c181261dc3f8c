//! Report and chart-data writers

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use var_backtest::{AnalysisReport, DashboardRow};

fn create(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    File::create(path).with_context(|| format!("creating {}", path.display()))
}

/// Write the backtest report as pretty JSON
pub fn write_report(path: &Path, report: &AnalysisReport) -> Result<()> {
    let writer = BufWriter::new(create(path)?);
    serde_json::to_writer_pretty(writer, report)
        .with_context(|| format!("writing report to {}", path.display()))?;
    Ok(())
}

/// Write one CSV row per forecast date
pub fn write_series(path: &Path, rows: &[DashboardRow]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(BufWriter::new(create(path)?));
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
