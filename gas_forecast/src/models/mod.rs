//! Forecasting backends and the forecast table they produce

use crate::config::ModelConfig;
use crate::data::TimeSeriesData;
use crate::diagnostics::{self, CrossValidationConfig, CrossValidationReport};
use crate::error::{ForecastError, Result};
use crate::plot::ForecastPlot;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;

pub mod decomposable;
pub mod trend;
pub mod uncertainty;

pub use decomposable::{DecomposableModel, FittedDecomposable};

/// Predictions over a date axis.
///
/// Rows are kept in the order of the frame they were predicted from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Date of each row
    pub ds: Vec<NaiveDate>,
    /// Point prediction
    pub yhat: Vec<f64>,
    /// Lower bound of the uncertainty interval
    pub yhat_lower: Vec<f64>,
    /// Upper bound of the uncertainty interval
    pub yhat_upper: Vec<f64>,
    /// Trend component
    pub trend: Vec<f64>,
    /// Seasonal components by name
    pub components: BTreeMap<String, Vec<f64>>,
}

impl Forecast {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.ds.len()
    }

    /// Whether the forecast has no rows
    pub fn is_empty(&self) -> bool {
        self.ds.is_empty()
    }

    /// Point prediction for a date, if the forecast covers it
    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        self.ds
            .iter()
            .position(|d| *d == date)
            .map(|i| self.yhat[i])
    }

    /// Point predictions keyed by date
    pub fn by_date(&self) -> BTreeMap<NaiveDate, f64> {
        self.ds
            .iter()
            .copied()
            .zip(self.yhat.iter().copied())
            .collect()
    }

    /// Named component, if present
    pub fn component(&self, name: &str) -> Option<&[f64]> {
        self.components.get(name).map(Vec::as_slice)
    }

    /// Rows with `from < ds <= to`
    pub fn between(&self, from: NaiveDate, to: NaiveDate) -> Self {
        self.select(|d| from < d && d <= to)
    }

    /// Rows strictly after a date
    pub fn after(&self, date: NaiveDate) -> Self {
        self.select(|d| d > date)
    }

    fn select<F>(&self, keep: F) -> Self
    where
        F: Fn(NaiveDate) -> bool,
    {
        let rows: Vec<usize> = (0..self.len()).filter(|&i| keep(self.ds[i])).collect();
        let pick = |column: &[f64]| rows.iter().map(|&i| column[i]).collect::<Vec<f64>>();

        Self {
            ds: rows.iter().map(|&i| self.ds[i]).collect(),
            yhat: pick(&self.yhat),
            yhat_lower: pick(&self.yhat_lower),
            yhat_upper: pick(&self.yhat_upper),
            trend: pick(&self.trend),
            components: self
                .components
                .iter()
                .map(|(name, values)| (name.clone(), pick(values)))
                .collect(),
        }
    }

    /// Append the rows of another forecast with the same components
    pub fn append(&mut self, other: &Forecast) -> Result<()> {
        if !self.components.keys().eq(other.components.keys()) {
            return Err(ForecastError::DataError(format!(
                "Cannot append forecasts with components {:?} and {:?}",
                self.components.keys().collect::<Vec<_>>(),
                other.components.keys().collect::<Vec<_>>()
            )));
        }

        self.ds.extend_from_slice(&other.ds);
        self.yhat.extend_from_slice(&other.yhat);
        self.yhat_lower.extend_from_slice(&other.yhat_lower);
        self.yhat_upper.extend_from_slice(&other.yhat_upper);
        self.trend.extend_from_slice(&other.trend);
        for (name, values) in self.components.iter_mut() {
            if let Some(extra) = other.components.get(name) {
                values.extend_from_slice(extra);
            }
        }
        Ok(())
    }
}

/// A backend after fitting, ready to predict
pub trait FittedForecast: Debug {
    /// Predict every date of the frame.
    ///
    /// The frame must carry every condition column the configuration uses.
    fn predict(&self, frame: &TimeSeriesData) -> Result<Forecast>;

    /// Series the model was fitted on
    fn history(&self) -> &TimeSeriesData;

    /// Configuration the model was fitted with
    fn config(&self) -> &ModelConfig;
}

/// Forecasting capability injected into the orchestrator
pub trait ForecastBackend: Debug {
    /// The type of fitted model produced
    type Fitted: FittedForecast;

    /// Fit the configured model on a history with `ds` and `y` columns
    fn fit(&self, config: &ModelConfig, history: &TimeSeriesData) -> Result<Self::Fitted>;

    /// Get the name of the backend
    fn name(&self) -> &str;

    /// Rolling-origin validation: refit on each prefix and score the next window
    fn cross_validate(
        &self,
        config: &ModelConfig,
        history: &TimeSeriesData,
        cv: &CrossValidationConfig,
    ) -> Result<CrossValidationReport> {
        diagnostics::cross_validate(self, config, history, cv)
    }

    /// History points with the forecast line and interval band
    fn plot(&self, history: &TimeSeriesData, forecast: &Forecast) -> Result<ForecastPlot> {
        ForecastPlot::new(history, forecast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ymd;

    fn table(months: &[u32], offset: f64) -> Forecast {
        let ds: Vec<NaiveDate> = months.iter().map(|m| ymd(2016, *m, 1)).collect();
        let yhat: Vec<f64> = months.iter().map(|m| *m as f64 + offset).collect();
        let mut components = BTreeMap::new();
        components.insert("yearly".to_string(), vec![0.5; months.len()]);
        Forecast {
            yhat_lower: yhat.iter().map(|v| v - 1.0).collect(),
            yhat_upper: yhat.iter().map(|v| v + 1.0).collect(),
            trend: yhat.clone(),
            ds,
            yhat,
            components,
        }
    }

    #[test]
    fn test_value_at_and_slices() {
        let forecast = table(&[1, 2, 3, 4], 0.0);
        assert_eq!(forecast.value_at(ymd(2016, 3, 1)), Some(3.0));
        assert_eq!(forecast.value_at(ymd(2017, 3, 1)), None);

        let middle = forecast.between(ymd(2016, 1, 1), ymd(2016, 3, 1));
        assert_eq!(middle.ds, vec![ymd(2016, 2, 1), ymd(2016, 3, 1)]);
        assert_eq!(middle.component("yearly").unwrap().len(), 2);

        assert_eq!(forecast.after(ymd(2016, 3, 1)).yhat, vec![4.0]);
    }

    #[test]
    fn test_append() {
        let mut forecast = table(&[1, 2], 0.0);
        forecast.append(&table(&[3], 0.0)).unwrap();
        assert_eq!(forecast.len(), 3);
        assert_eq!(forecast.by_date()[&ymd(2016, 3, 1)], 3.0);

        let mut other = table(&[4], 0.0);
        other.components.clear();
        assert!(forecast.append(&other).is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let forecast = table(&[1, 2], 0.5);
        let json = serde_json::to_string(&forecast).unwrap();
        let back: Forecast = serde_json::from_str(&json).unwrap();
        assert_eq!(back, forecast);
    }
}
