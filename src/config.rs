//! Analysis configuration.
//!
//! Every field has a default, so an empty file (or no file at all) runs the
//! standard analysis. A minimal override looks like:
//!
//! ```toml
//! input = "data/site.csv"
//!
//! [sarima]
//! order = [2, 0, 1]
//! seasonal_order = [1, 0, 1]
//! season_regressors = true
//!
//! [search]
//! mode = "stepwise"
//! ```

use crate::core::AnalysisWindow;
use crate::data::LoadOptions;
use crate::distribution::ZeroPolicy;
use crate::error::{Result, WindError};
use crate::models::arima::{ModelOrder, SearchConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Input column headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub timestamp: String,
    pub wind_speed: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            timestamp: "timestamp".to_string(),
            wind_speed: "wind_speed".to_string(),
        }
    }
}

/// Weibull analysis settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeibullConfig {
    pub zero_policy: ZeroPolicy,
    /// Largest sample used by the goodness-of-fit test.
    pub goodness_of_fit_points: usize,
    pub histogram_bins: usize,
    /// Seed for sampling and simulation.
    pub seed: u64,
}

impl Default for WeibullConfig {
    fn default() -> Self {
        Self {
            zero_policy: ZeroPolicy::Drop,
            goodness_of_fit_points: 1000,
            histogram_bins: 30,
            seed: 42,
        }
    }
}

/// The forecasting model and its outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SarimaConfig {
    /// Non-seasonal (p, d, q).
    pub order: (usize, usize, usize),
    /// Seasonal (P, D, Q).
    pub seasonal_order: (usize, usize, usize),
    /// Seasonal period, shared with the order search.
    pub period: usize,
    /// Regress on season indicators before fitting.
    pub season_regressors: bool,
    pub horizon: usize,
    pub levels: Vec<f64>,
    /// Hours of history used for the recent-window forecast.
    pub recent_history: usize,
    /// Largest lag in the ACF/PACF outputs.
    pub max_lag: usize,
}

impl Default for SarimaConfig {
    fn default() -> Self {
        Self {
            order: (2, 0, 1),
            seasonal_order: (1, 0, 1),
            period: 24,
            season_regressors: false,
            horizon: 48,
            levels: vec![0.80, 0.95],
            recent_history: 240,
            max_lag: 48,
        }
    }
}

impl SarimaConfig {
    pub fn model_order(&self) -> ModelOrder {
        ModelOrder::new(self.order, self.seasonal_order, self.period)
    }
}

/// Complete configuration of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub window: AnalysisWindow,
    pub columns: ColumnConfig,
    pub weibull: WeibullConfig,
    pub sarima: SarimaConfig,
    pub search: SearchConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/wind_speed.csv"),
            output_dir: PathBuf::from("output"),
            window: AnalysisWindow::default(),
            columns: ColumnConfig::default(),
            weibull: WeibullConfig::default(),
            sarima: SarimaConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Read and validate a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            WindError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&text)?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| WindError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no run could succeed with.
    pub fn validate(&self) -> Result<()> {
        if self.window.start >= self.window.end {
            return Err(WindError::Config(format!(
                "window start {} must be before end {}",
                self.window.start, self.window.end
            )));
        }
        if self.weibull.histogram_bins == 0 {
            return Err(WindError::Config("histogram_bins must be at least 1".into()));
        }
        if self.weibull.goodness_of_fit_points < 8 {
            return Err(WindError::Config(
                "goodness_of_fit_points must be at least 8".into(),
            ));
        }
        if let Some(level) = self.sarima.levels.iter().find(|l| !(**l > 0.0 && **l < 1.0)) {
            return Err(WindError::Config(format!(
                "interval level {level} must lie strictly between 0 and 1"
            )));
        }
        if self.sarima.horizon == 0 {
            return Err(WindError::Config("horizon must be at least 1".into()));
        }
        if self.sarima.recent_history == 0 {
            return Err(WindError::Config("recent_history must be at least 1".into()));
        }
        Ok(())
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            timestamp_column: self.columns.timestamp.clone(),
            wind_speed_column: self.columns.wind_speed.clone(),
            window: self.window,
        }
    }
}
