use crate::retry::RetryPolicy;
use crate::source::SourceConfig;
use anyhow::{bail, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use var_backtest::AnalysisConfig;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct DataConfig {
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// JSON backtest report
    pub report_path: Option<PathBuf>,
    /// CSV chart data
    pub series_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: Some(PathBuf::from("output/var_report.json")),
            series_path: Some(PathBuf::from("output/var_series.csv")),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.data.sources.is_empty() {
            bail!("at least one data source is required");
        }
        for source in &self.data.sources {
            if let SourceConfig::Yahoo { ticker, start, end, .. } = source {
                if start >= end {
                    bail!("{ticker}: start {start} must be before end {end}");
                }
            }
        }
        self.analysis.validate()?;
        Ok(())
    }
}
