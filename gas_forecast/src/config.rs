//! Pipeline and model configuration
//!
//! Every hyperparameter the pipeline uses lives here, passed explicitly to
//! the components that need it. The defaults reproduce the tuned gasoline
//! price setup; [`PipelineConfig::from_env`] lets a JSON file override any of
//! them.

use crate::diagnostics::CrossValidationConfig;
use crate::error::{ForecastError, Result};
use crate::partition::SplitBoundaries;
use crate::recession::{RecessionWindow, GREAT_RECESSION_COLUMN};
use crate::utils::Frequency;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Environment variable naming an optional JSON configuration file
pub const CONFIG_ENV_VAR: &str = "GAS_FORECAST_CONFIG";
/// Environment variable overriding the input data path
pub const DATA_ENV_VAR: &str = "GAS_FORECAST_DATA";
/// Input file used when nothing else is configured
pub const DEFAULT_DATA_PATH: &str = "scripts/forecasting_take_home_data.csv";

/// How a seasonal component combines with the trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonalityMode {
    /// Added to the trend in the units of the series
    Additive,
    /// Scales the trend by `1 + component`
    Multiplicative,
}

/// A custom Fourier seasonality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalityConfig {
    /// Component name, also the name of its output column
    pub name: String,
    /// Period in days
    pub period: f64,
    /// Number of Fourier harmonics
    pub fourier_order: usize,
    /// Scale of the Gaussian prior on the coefficients
    pub prior_scale: f64,
    /// Additive or multiplicative
    pub mode: SeasonalityMode,
    /// Optional 0/1 column; the component is only active where it is 1
    #[serde(default)]
    pub condition: Option<String>,
}

impl SeasonalityConfig {
    pub fn new(name: &str, period: f64, fourier_order: usize) -> Self {
        Self {
            name: name.to_string(),
            period,
            fourier_order,
            prior_scale: 10.0,
            mode: SeasonalityMode::Additive,
            condition: None,
        }
    }

    pub fn with_prior_scale(mut self, scale: f64) -> Self {
        self.prior_scale = scale;
        self
    }

    pub fn with_mode(mut self, mode: SeasonalityMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_condition(mut self, column: &str) -> Self {
        self.condition = Some(column.to_string());
        self
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "Seasonality name must not be empty".to_string(),
            ));
        }
        if !(self.period > 0.0 && self.period.is_finite()) {
            return Err(ForecastError::InvalidParameter(format!(
                "Seasonality '{}' needs a positive period, got {}",
                self.name, self.period
            )));
        }
        if self.fourier_order == 0 {
            return Err(ForecastError::InvalidParameter(format!(
                "Seasonality '{}' needs a Fourier order of at least 1",
                self.name
            )));
        }
        if !(self.prior_scale > 0.0 && self.prior_scale.is_finite()) {
            return Err(ForecastError::InvalidParameter(format!(
                "Seasonality '{}' needs a positive prior scale, got {}",
                self.name, self.prior_scale
            )));
        }
        Ok(())
    }
}

/// Hyperparameters of the forecasting model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Add the built-in yearly seasonality (period 365.25, order 10)
    pub yearly_seasonality: bool,
    /// Laplace prior scale on trend rate changes
    pub changepoint_prior_scale: f64,
    /// Share of the history in which changepoints may be placed
    pub changepoint_range: f64,
    /// Number of potential changepoints
    pub n_changepoints: usize,
    /// Custom seasonal components
    pub custom_seasonalities: Vec<SeasonalityConfig>,
    /// Width of the uncertainty interval
    pub interval_width: f64,
    /// Number of simulated paths for intervals; 0 uses the analytic band
    pub uncertainty_samples: usize,
    /// Seed for the simulated paths
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            yearly_seasonality: true,
            changepoint_prior_scale: 0.05,
            changepoint_range: 0.8,
            n_changepoints: 25,
            custom_seasonalities: Vec::new(),
            interval_width: 0.8,
            uncertainty_samples: 200,
            seed: 0,
        }
    }
}

impl ModelConfig {
    /// The tuned configuration for monthly gasoline prices.
    ///
    /// Built-in yearly seasonality is replaced by a custom 3-term yearly
    /// component, and a 4-term yearly component is switched on only during
    /// the Great Recession.
    pub fn gas_price() -> Self {
        Self {
            yearly_seasonality: false,
            changepoint_prior_scale: 0.1,
            changepoint_range: 0.85,
            custom_seasonalities: vec![
                SeasonalityConfig::new("yearly", 365.25, 3)
                    .with_prior_scale(20.0)
                    .with_mode(SeasonalityMode::Additive),
                SeasonalityConfig::new(GREAT_RECESSION_COLUMN, 365.25, 4)
                    .with_condition(GREAT_RECESSION_COLUMN),
            ],
            ..Self::default()
        }
    }

    pub fn with_seasonality(mut self, seasonality: SeasonalityConfig) -> Self {
        self.custom_seasonalities.push(seasonality);
        self
    }

    /// All seasonal components in fit order, built-ins first.
    ///
    /// A custom component named like a built-in replaces it.
    pub fn seasonalities(&self) -> Vec<SeasonalityConfig> {
        let mut all = Vec::with_capacity(self.custom_seasonalities.len() + 1);
        let custom_yearly = self.custom_seasonalities.iter().any(|s| s.name == "yearly");
        if self.yearly_seasonality && !custom_yearly {
            all.push(SeasonalityConfig::new("yearly", 365.25, 10));
        }
        all.extend(self.custom_seasonalities.iter().cloned());
        all
    }

    /// Condition columns the model needs in every frame it sees
    pub fn condition_columns(&self) -> Vec<&str> {
        self.custom_seasonalities
            .iter()
            .filter_map(|s| s.condition.as_deref())
            .collect()
    }

    /// Check parameter ranges and name uniqueness
    pub fn validate(&self) -> Result<()> {
        if !(self.changepoint_prior_scale > 0.0 && self.changepoint_prior_scale.is_finite()) {
            return Err(ForecastError::InvalidParameter(format!(
                "changepoint_prior_scale must be positive, got {}",
                self.changepoint_prior_scale
            )));
        }
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "changepoint_range must be in (0, 1], got {}",
                self.changepoint_range
            )));
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval_width must be in (0, 1), got {}",
                self.interval_width
            )));
        }

        let mut names = HashSet::new();
        for seasonality in &self.custom_seasonalities {
            seasonality.validate()?;
            if !names.insert(seasonality.name.as_str()) {
                return Err(ForecastError::InvalidParameter(format!(
                    "Seasonality '{}' is defined twice",
                    seasonality.name
                )));
            }
        }
        Ok(())
    }
}

/// Everything the pipeline needs to run end to end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Input CSV file
    pub data_path: PathBuf,
    /// Train/test date boundaries
    pub boundaries: SplitBoundaries,
    /// Window used for the recession indicator
    pub recession: RecessionWindow,
    /// Number of periods to forecast past the last observed date
    pub horizon_periods: usize,
    /// Frequency of the forecast periods
    pub horizon_frequency: Frequency,
    /// Forecasting model hyperparameters
    pub model: ModelConfig,
    /// Rolling-origin validation windows
    pub cross_validation: CrossValidationConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            boundaries: SplitBoundaries::default(),
            recession: RecessionWindow::great_recession(),
            horizon_periods: 24,
            horizon_frequency: Frequency::MonthStart,
            model: ModelConfig::gas_price(),
            cross_validation: CrossValidationConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Read a configuration from a JSON file; missing fields keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Build the configuration from the environment.
    ///
    /// `GAS_FORECAST_CONFIG` names an optional JSON file and
    /// `GAS_FORECAST_DATA` overrides the input path.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => {
                log::info!("Reading configuration from {}", path);
                Self::from_json_file(path)?
            }
            Err(_) => Self::default(),
        };

        if let Ok(path) = std::env::var(DATA_ENV_VAR) {
            config.data_path = PathBuf::from(path);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check every nested section
    pub fn validate(&self) -> Result<()> {
        if self.boundaries.test_start > self.boundaries.test_end {
            return Err(ForecastError::InvalidParameter(format!(
                "Test start {} is after test end {}",
                self.boundaries.test_start, self.boundaries.test_end
            )));
        }
        if self.horizon_periods == 0 {
            return Err(ForecastError::InvalidParameter(
                "horizon_periods must be at least 1".to_string(),
            ));
        }
        self.model.validate()?;
        self.cross_validation.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gas_price_defaults() {
        let config = ModelConfig::gas_price();
        assert!(!config.yearly_seasonality);
        assert_eq!(config.changepoint_prior_scale, 0.1);
        assert_eq!(config.changepoint_range, 0.85);

        let seasonalities = config.seasonalities();
        assert_eq!(seasonalities.len(), 2);
        assert_eq!(seasonalities[0].fourier_order, 3);
        assert_eq!(seasonalities[0].prior_scale, 20.0);
        assert_eq!(seasonalities[1].fourier_order, 4);
        assert_eq!(
            seasonalities[1].condition.as_deref(),
            Some(GREAT_RECESSION_COLUMN)
        );
        assert_eq!(config.condition_columns(), vec![GREAT_RECESSION_COLUMN]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builtin_yearly_is_replaced_by_custom() {
        let config =
            ModelConfig::default().with_seasonality(SeasonalityConfig::new("yearly", 365.25, 2));
        let seasonalities = config.seasonalities();
        assert_eq!(seasonalities.len(), 1);
        assert_eq!(seasonalities[0].fourier_order, 2);

        assert_eq!(ModelConfig::default().seasonalities()[0].fourier_order, 10);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = ModelConfig::gas_price();
        config.changepoint_range = 1.5;
        assert!(config.validate().is_err());

        let duplicated =
            ModelConfig::gas_price().with_seasonality(SeasonalityConfig::new("yearly", 365.25, 3));
        assert!(duplicated.validate().is_err());

        let zero_order =
            ModelConfig::gas_price().with_seasonality(SeasonalityConfig::new("weekly", 7.0, 0));
        assert!(zero_order.validate().is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "horizon_periods": 12, "model": { "changepoint_prior_scale": 0.2 } }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.horizon_periods, 12);
        assert_eq!(config.model.changepoint_prior_scale, 0.2);
        assert_eq!(config.horizon_frequency, Frequency::MonthStart);
        assert_eq!(config.cross_validation, CrossValidationConfig::default());
    }
}
