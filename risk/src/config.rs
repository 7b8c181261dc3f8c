//! Analysis configuration
//!
//! Loaded from YAML or JSON, e.g.
//!
//! ```yaml
//! confidence_level: 0.99
//! window: 252
//! backtest_target: historical
//! ```

use crate::error::Result;
use crate::estimator::{VarConfig, VarMethod};
use serde::{Deserialize, Serialize};

/// Parameters for one estimate-and-backtest run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub confidence_level: f64,

    pub window: usize,

    /// Which forecast series the Kupiec test validates
    pub backtest_target: VarMethod,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let var = VarConfig::default();
        Self {
            confidence_level: var.confidence_level,
            window: var.window,
            backtest_target: VarMethod::Historical,
        }
    }
}

impl AnalysisConfig {
    /// Parse and validate a YAML document
    ///
    /// # Example
    ///
    /// ```
    /// use var_backtest::AnalysisConfig;
    ///
    /// let config = AnalysisConfig::from_yaml("window: 100\nconfidence_level: 0.95").unwrap();
    /// assert_eq!(config.window, 100);
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn var_config(&self) -> VarConfig {
        VarConfig {
            confidence_level: self.confidence_level,
            window: self.window,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.var_config().validate()
    }
}
