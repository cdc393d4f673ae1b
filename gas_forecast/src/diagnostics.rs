//! Rolling-origin cross-validation and horizon-indexed performance metrics

use crate::config::ModelConfig;
use crate::data::TimeSeriesData;
use crate::error::{ForecastError, Result};
use crate::models::{FittedForecast, ForecastBackend};
use chrono::{Duration, NaiveDate};
use forecast_math::metrics::{error_metrics, ErrorMetrics};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Windows of the rolling-origin validation, in days
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossValidationConfig {
    /// History required before the first cutoff
    pub initial_days: i64,
    /// Spacing between cutoffs
    pub period_days: i64,
    /// Length of each evaluation window
    pub horizon_days: i64,
    /// Share of the predictions averaged per row of the horizon table
    pub rolling_window: f64,
}

impl Default for CrossValidationConfig {
    fn default() -> Self {
        Self {
            initial_days: 730,
            period_days: 180,
            horizon_days: 365,
            rolling_window: 0.1,
        }
    }
}

impl CrossValidationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.initial_days < 0 || self.period_days <= 0 || self.horizon_days <= 0 {
            return Err(ForecastError::InvalidParameter(format!(
                "Cross-validation windows must be positive: initial {}, period {}, horizon {}",
                self.initial_days, self.period_days, self.horizon_days
            )));
        }
        if !(0.0..=1.0).contains(&self.rolling_window) {
            return Err(ForecastError::InvalidParameter(format!(
                "rolling_window must be in [0, 1], got {}",
                self.rolling_window
            )));
        }
        if self.initial_days < self.period_days {
            log::warn!(
                "Initial window ({} days) is shorter than the period ({} days)",
                self.initial_days,
                self.period_days
            );
        }
        Ok(())
    }

    fn horizon(&self) -> Duration {
        Duration::days(self.horizon_days)
    }
}

/// One held-out prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationRow {
    pub ds: NaiveDate,
    pub cutoff: NaiveDate,
    pub y: f64,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

impl CrossValidationRow {
    /// Days between the cutoff and the predicted date
    pub fn horizon_days(&self) -> i64 {
        (self.ds - self.cutoff).num_days()
    }
}

/// Accuracy of one refit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoldResult {
    pub cutoff: NaiveDate,
    pub rows: usize,
    pub metrics: ErrorMetrics,
}

/// Metrics averaged over a rolling window of horizons
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonMetrics {
    pub horizon_days: i64,
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    /// Share of actuals inside the uncertainty interval
    pub coverage: f64,
}

/// Everything produced by a cross-validation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationReport {
    pub folds: Vec<FoldResult>,
    pub predictions: Vec<CrossValidationRow>,
}

impl CrossValidationReport {
    /// Mean of the per-fold MAE
    pub fn mean_mae(&self) -> Result<f64> {
        self.mean_of(|m| m.mae)
    }

    /// Mean of the per-fold RMSE
    pub fn mean_rmse(&self) -> Result<f64> {
        self.mean_of(|m| m.rmse)
    }

    fn mean_of<F>(&self, pick: F) -> Result<f64>
    where
        F: Fn(&ErrorMetrics) -> f64,
    {
        let values: Vec<f64> = self.folds.iter().map(|f| pick(&f.metrics)).collect();
        Ok(forecast_math::stats::mean(&values)?)
    }

    /// Horizon-indexed metrics over all held-out predictions.
    ///
    /// Predictions are grouped by horizon; each output row averages the
    /// `rolling_window` share of predictions at and just below that horizon.
    pub fn performance_metrics(&self, rolling_window: f64) -> Result<Vec<HorizonMetrics>> {
        if self.predictions.is_empty() {
            return Err(ForecastError::InsufficientData(
                "No cross-validation predictions to summarize".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&rolling_window) {
            return Err(ForecastError::InvalidParameter(format!(
                "rolling_window must be in [0, 1], got {}",
                rolling_window
            )));
        }

        let n = self.predictions.len();
        let window = ((rolling_window * n as f64) as usize).clamp(1, n);
        let horizons: Vec<i64> = self.predictions.iter().map(|r| r.horizon_days()).collect();

        let squared: Vec<f64> = self
            .predictions
            .iter()
            .map(|r| (r.y - r.yhat).powi(2))
            .collect();
        let absolute: Vec<f64> = self
            .predictions
            .iter()
            .map(|r| (r.y - r.yhat).abs())
            .collect();
        let covered: Vec<f64> = self
            .predictions
            .iter()
            .map(|r| f64::from(u8::from(r.yhat_lower <= r.y && r.y <= r.yhat_upper)))
            .collect();

        let mse = rolling_mean_by_horizon(&squared, &horizons, window);
        let mae = rolling_mean_by_horizon(&absolute, &horizons, window);
        let coverage = rolling_mean_by_horizon(&covered, &horizons, window);

        Ok(mse
            .iter()
            .zip(&mae)
            .zip(&coverage)
            .map(|(((h, mse), (_, mae)), (_, coverage))| HorizonMetrics {
                horizon_days: *h,
                mse: *mse,
                rmse: mse.sqrt(),
                mae: *mae,
                coverage: *coverage,
            })
            .collect())
    }
}

/// Rolling mean of `values` over the `window` points with the largest
/// horizons not exceeding each horizon.
///
/// Horizons with too few points at or below them are left out. When the
/// window cuts through a horizon group, that group contributes pro rata.
fn rolling_mean_by_horizon(values: &[f64], horizons: &[i64], window: usize) -> Vec<(i64, f64)> {
    let mut groups: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    for (value, h) in values.iter().zip(horizons) {
        let entry = groups.entry(*h).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    let hs: Vec<i64> = groups.keys().copied().collect();
    let sums: Vec<f64> = groups.values().map(|(s, _)| *s).collect();
    let counts: Vec<usize> = groups.values().map(|(_, c)| *c).collect();

    let mut results = vec![0.0; hs.len()];
    let mut trailing = hs.len();
    let mut x_sum = 0.0;
    let mut n_sum = 0usize;

    for i in (0..hs.len()).rev() {
        x_sum += sums[i];
        n_sum += counts[i];
        while n_sum >= window {
            let excess_n = (n_sum - window) as f64;
            let excess_x = excess_n * sums[i] / counts[i] as f64;
            trailing -= 1;
            results[trailing] = (x_sum - excess_x) / window as f64;
            x_sum -= sums[trailing];
            n_sum -= counts[trailing];
        }
    }

    hs[trailing..]
        .iter()
        .copied()
        .zip(results[trailing..].iter().copied())
        .collect()
}

/// Cutoff dates for rolling-origin validation, in ascending order.
///
/// The last cutoff leaves one horizon of data after it; earlier cutoffs step
/// back by the period while at least the initial window remains before them.
/// A window with no data moves the cutoff to one horizon before the last
/// observed date preceding it.
pub fn generate_cutoffs(dates: &[NaiveDate], cv: &CrossValidationConfig) -> Result<Vec<NaiveDate>> {
    let (first, last) = match (dates.iter().min(), dates.iter().max()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => {
            return Err(ForecastError::InsufficientData(
                "Cannot cross-validate an empty history".to_string(),
            ))
        }
    };

    let horizon = cv.horizon();
    let period = Duration::days(cv.period_days);
    let earliest = first + Duration::days(cv.initial_days);

    let mut cutoff = last - horizon;
    if cutoff < first {
        return Err(ForecastError::InsufficientData(format!(
            "History from {} to {} is shorter than the {}-day horizon",
            first, last, cv.horizon_days
        )));
    }

    let mut cutoffs = vec![cutoff];
    while cutoff >= earliest {
        cutoff -= period;
        let covered = dates.iter().any(|d| *d > cutoff && *d <= cutoff + horizon);
        if !covered && cutoff > first {
            if let Some(closest) = dates.iter().filter(|d| **d <= cutoff).max() {
                cutoff = *closest - horizon;
            }
        }
        cutoffs.push(cutoff);
    }
    cutoffs.pop();

    if cutoffs.is_empty() {
        return Err(ForecastError::InsufficientData(format!(
            "History from {} to {} leaves no cutoff after the {}-day initial window; \
             shorten the initial window or the horizon",
            first, last, cv.initial_days
        )));
    }

    cutoffs.reverse();
    Ok(cutoffs)
}

/// Refit on the history up to each cutoff and predict the following horizon
pub fn cross_validate<B>(
    backend: &B,
    config: &ModelConfig,
    history: &TimeSeriesData,
    cv: &CrossValidationConfig,
) -> Result<CrossValidationReport>
where
    B: ForecastBackend + ?Sized,
{
    cv.validate()?;
    let cutoffs = generate_cutoffs(&history.dates()?, cv)?;
    log::info!(
        "Cross-validating {} with {} cutoffs from {} to {}",
        backend.name(),
        cutoffs.len(),
        cutoffs[0],
        cutoffs[cutoffs.len() - 1]
    );

    let horizon = cv.horizon();
    let mut folds = Vec::with_capacity(cutoffs.len());
    let mut predictions = Vec::new();

    for cutoff in cutoffs {
        let train = history.filter_dates(|d| d <= cutoff)?;
        if train.len() < 2 {
            return Err(ForecastError::InsufficientData(format!(
                "Less than two observations before cutoff {}; increase the initial window",
                cutoff
            )));
        }

        let held_out = history.filter_dates(|d| d > cutoff && d <= cutoff + horizon)?;
        let fitted = backend.fit(config, &train)?;
        let forecast = fitted.predict(&held_out)?;
        let actual = held_out.values()?;

        let metrics = error_metrics(&actual, &forecast.yhat)?;
        log::debug!(
            "Cutoff {}: {} rows, MAE {:.4}, RMSE {:.4}",
            cutoff,
            actual.len(),
            metrics.mae,
            metrics.rmse
        );

        for (i, y) in actual.iter().enumerate() {
            predictions.push(CrossValidationRow {
                ds: forecast.ds[i],
                cutoff,
                y: *y,
                yhat: forecast.yhat[i],
                yhat_lower: forecast.yhat_lower[i],
                yhat_upper: forecast.yhat_upper[i],
            });
        }
        folds.push(FoldResult {
            cutoff,
            rows: actual.len(),
            metrics,
        });
    }

    Ok(CrossValidationReport { folds, predictions })
}
