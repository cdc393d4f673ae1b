//! Time scaling and the piecewise-linear trend

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Maps dates onto model time, 0 at the first history date and 1 at the last
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeScale {
    start: NaiveDate,
    span_days: f64,
}

impl TimeScale {
    /// Scale spanning a history's dates, which must cover more than one day
    pub fn from_history(dates: &[NaiveDate]) -> Result<Self> {
        let (start, end) = match (dates.iter().min(), dates.iter().max()) {
            (Some(start), Some(end)) => (*start, *end),
            _ => {
                return Err(ForecastError::InsufficientData(
                    "Cannot scale time over an empty history".to_string(),
                ))
            }
        };

        let span_days = (end - start).num_days() as f64;
        if span_days <= 0.0 {
            return Err(ForecastError::InsufficientData(format!(
                "History must span more than one date, got only {}",
                start
            )));
        }

        Ok(Self { start, span_days })
    }

    /// Model time of a date
    pub fn scale(&self, date: NaiveDate) -> f64 {
        (date - self.start).num_days() as f64 / self.span_days
    }

    /// Model time of every date
    pub fn scale_all(&self, dates: &[NaiveDate]) -> Vec<f64> {
        dates.iter().map(|d| self.scale(*d)).collect()
    }
}

/// Potential changepoint locations in model time.
///
/// `n_changepoints` points are spread evenly over the first `range` share of
/// the history rows; the first row never holds one. Short histories get fewer.
pub fn select_changepoints(t_hist: &[f64], n_changepoints: usize, range: f64) -> Vec<f64> {
    let hist_size = (t_hist.len() as f64 * range).floor() as usize;
    let n = n_changepoints.min(hist_size.saturating_sub(1));
    if n == 0 {
        return Vec::new();
    }

    let last = (hist_size - 1) as f64;
    (1..=n)
        .map(|i| {
            let index = (last * i as f64 / n as f64).round() as usize;
            t_hist[index]
        })
        .collect()
}

/// Hinge columns `max(0, t - s_j)`, one per changepoint
pub fn changepoint_matrix(t: &[f64], t_change: &[f64]) -> Vec<Vec<f64>> {
    t.iter()
        .map(|ti| t_change.iter().map(|s| (ti - s).max(0.0)).collect())
        .collect()
}

/// Trend with base rate `k`, offset `m` and a rate change `delta_j` at each
/// changepoint
pub fn piecewise_linear(k: f64, m: f64, deltas: &[f64], t: &[f64], t_change: &[f64]) -> Vec<f64> {
    t.iter()
        .map(|ti| {
            let bends: f64 = deltas
                .iter()
                .zip(t_change)
                .map(|(delta, s)| delta * (ti - s).max(0.0))
                .sum();
            k * ti + m + bends
        })
        .collect()
}

/// Fitted trend parameters in scaled units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiecewiseTrend {
    /// Base growth rate
    pub k: f64,
    /// Offset
    pub m: f64,
    /// Rate change at each changepoint
    pub deltas: Vec<f64>,
    /// Changepoint locations in model time
    pub t_change: Vec<f64>,
}

impl PiecewiseTrend {
    /// Trend value at each model time
    pub fn evaluate(&self, t: &[f64]) -> Vec<f64> {
        piecewise_linear(self.k, self.m, &self.deltas, t, &self.t_change)
    }

    /// Mean absolute rate change, the scale of simulated future changes
    pub fn mean_abs_delta(&self) -> f64 {
        if self.deltas.is_empty() {
            return 0.0;
        }
        self.deltas.iter().map(|d| d.abs()).sum::<f64>() / self.deltas.len() as f64
    }
}
