//! Metrics for evaluating forecast performance

use crate::data::TimeSeriesData;
use crate::diagnostics::CrossValidationReport;
use crate::error::{ForecastError, Result};
use crate::models::Forecast;
use forecast_math::metrics::{error_metrics, ErrorMetrics};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean absolute and root mean squared error of one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyPair {
    pub mae: f64,
    pub rmse: f64,
}

impl From<ErrorMetrics> for AccuracyPair {
    fn from(metrics: ErrorMetrics) -> Self {
        Self {
            mae: metrics.mae,
            rmse: metrics.rmse,
        }
    }
}

impl AccuracyPair {
    /// Whether both numbers are finite and non-negative
    pub fn is_valid(&self) -> bool {
        [self.mae, self.rmse].iter().all(|v| v.is_finite() && *v >= 0.0)
    }
}

/// Training accuracy from cross-validation and test accuracy on held-out rows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    /// Mean of the per-fold cross-validation errors
    pub train: AccuracyPair,
    /// Errors on the held-out test rows
    pub test: AccuracyPair,
}

impl fmt::Display for AccuracyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Train MAE:  {:.4}", self.train.mae)?;
        writeln!(f, "Train RMSE: {:.4}", self.train.rmse)?;
        writeln!(f, "Test MAE:   {:.4}", self.test.mae)?;
        write!(f, "Test RMSE:  {:.4}", self.test.rmse)
    }
}

/// Average the per-fold errors of a cross-validation run
pub fn train_accuracy(report: &CrossValidationReport) -> Result<AccuracyPair> {
    Ok(AccuracyPair {
        mae: report.mean_mae()?,
        rmse: report.mean_rmse()?,
    })
}

/// Compare predictions with actuals matched by date.
///
/// Every actual date must be present in the forecast; row order and extra
/// forecast rows do not matter.
pub fn evaluate_by_date(forecast: &Forecast, actuals: &TimeSeriesData) -> Result<ErrorMetrics> {
    let predicted_by_date = forecast.by_date();
    let dates = actuals.dates()?;
    let values = actuals.values()?;

    let predicted = dates
        .iter()
        .map(|date| {
            predicted_by_date.get(date).copied().ok_or_else(|| {
                ForecastError::DataError(format!("No prediction for test date {}", date))
            })
        })
        .collect::<Result<Vec<f64>>>()?;

    Ok(error_metrics(&values, &predicted)?)
}
