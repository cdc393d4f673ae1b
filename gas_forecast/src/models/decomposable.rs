//! Decomposable trend plus seasonality model
//!
//! The series is modelled as a piecewise-linear trend with automatically
//! placed changepoints, plus Fourier seasonal components that are either added
//! to the trend or scale it. Parameters are the posterior mode under Gaussian
//! priors on the trend base and seasonal coefficients and a Laplace prior on
//! the trend changes; the Laplace prior is handled by iteratively reweighted
//! ridge regression.

use crate::config::{ModelConfig, SeasonalityConfig, SeasonalityMode};
use crate::data::TimeSeriesData;
use crate::error::{ForecastError, Result};
use crate::models::trend::{changepoint_matrix, select_changepoints, PiecewiseTrend, TimeScale};
use crate::models::uncertainty::{analytic_interval, simulated_interval, PredictionParts};
use crate::models::{FittedForecast, Forecast, ForecastBackend};
use crate::utils::days_since_epoch;
use chrono::NaiveDate;
use forecast_math::fourier::{apply_condition, fourier_series};
use forecast_math::regression::{penalized_fit, DesignMatrix, PenalizedFit};
use forecast_math::stats::abs_max;
use std::collections::BTreeMap;

/// Prior scale on the base growth rate and offset
const TREND_PRIOR_SCALE: f64 = 5.0;
/// Reweighting passes for the Laplace prior
const REWEIGHT_ITERATIONS: usize = 6;
/// Smallest change magnitude used when reweighting
const DELTA_FLOOR: f64 = 1e-4;
/// Smallest noise variance, in scaled units
const SIGMA2_FLOOR: f64 = 1e-8;

/// Name of the summed additive component in forecast output
pub const ADDITIVE_TERMS: &str = "additive_terms";
/// Name of the summed multiplicative component in forecast output
pub const MULTIPLICATIVE_TERMS: &str = "multiplicative_terms";

/// Trend plus seasonality forecasting backend
#[derive(Debug, Clone)]
pub struct DecomposableModel {
    /// Name of the model
    name: String,
}

impl Default for DecomposableModel {
    fn default() -> Self {
        Self::new()
    }
}

impl DecomposableModel {
    /// Create a new backend
    pub fn new() -> Self {
        Self {
            name: "Decomposable trend + seasonality".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct FittedSeasonality {
    config: SeasonalityConfig,
    coefficients: Vec<f64>,
}

/// Fitted decomposable model
#[derive(Debug, Clone)]
pub struct FittedDecomposable {
    /// Configuration used for the fit
    config: ModelConfig,
    /// Training history
    history: TimeSeriesData,
    /// Date to model time mapping
    time_scale: TimeScale,
    /// Absolute maximum of the history values
    y_scale: f64,
    /// Trend parameters in scaled units
    trend: PiecewiseTrend,
    /// Seasonal coefficients in scaled units
    seasonalities: Vec<FittedSeasonality>,
    /// Observation noise in scaled units
    sigma_obs: f64,
}

struct SeasonalBlock {
    features: Vec<Vec<f64>>,
    prior_scale: f64,
}

struct Estimate {
    trend: PiecewiseTrend,
    coefficients: Vec<Vec<f64>>,
    sigma2: f64,
}

/// Fourier features of one seasonality, zeroed where its condition is off
fn seasonal_features(
    seasonality: &SeasonalityConfig,
    dates: &[NaiveDate],
    frame: &TimeSeriesData,
) -> Result<Vec<Vec<f64>>> {
    let t_days: Vec<f64> = dates.iter().map(|d| days_since_epoch(*d) as f64).collect();
    let mut features = fourier_series(&t_days, seasonality.period, seasonality.fourier_order)?;

    if let Some(column) = &seasonality.condition {
        let active = frame.condition(column)?;
        apply_condition(&mut features, &active)?;
    }

    Ok(features)
}

/// Noise variance with the residual degrees of freedom as denominator
fn residual_variance(design: &DesignMatrix, target: &[f64], fit: &PenalizedFit) -> Result<f64> {
    let fitted = design.predict(&fit.coefficients)?;
    let rss: f64 = target
        .iter()
        .zip(&fitted)
        .map(|(y, f)| (y - f).powi(2))
        .sum();
    let residual_dof = (target.len() as f64 - fit.effective_dof).max(1.0);
    Ok((rss / residual_dof).max(SIGMA2_FLOOR))
}

/// Posterior mode of trend and seasonal coefficients for a scaled target
fn estimate(
    t: &[f64],
    target: &[f64],
    t_change: &[f64],
    blocks: &[SeasonalBlock],
    changepoint_prior_scale: f64,
) -> Result<Estimate> {
    let n = t.len();
    let n_delta = t_change.len();

    let mut design = DesignMatrix::new(n);
    design.push_column(t)?;
    design.push_column(&vec![1.0; n])?;
    if n_delta > 0 {
        design.push_block(&changepoint_matrix(t, t_change))?;
    }
    for block in blocks {
        design.push_block(&block.features)?;
    }

    // noise level of a straight line through the data
    let mut line = DesignMatrix::new(n);
    line.push_column(t)?;
    line.push_column(&vec![1.0; n])?;
    let line_fit = penalized_fit(&line, target, &[0.0, 0.0])?;
    let mut sigma2 = residual_variance(&line, target, &line_fit)?;

    let mut beta: Vec<f64> = Vec::new();
    for iteration in 0..REWEIGHT_ITERATIONS {
        let mut penalties = Vec::with_capacity(design.n_columns());
        let trend_penalty = sigma2 / TREND_PRIOR_SCALE.powi(2);
        penalties.push(trend_penalty);
        penalties.push(trend_penalty);

        for j in 0..n_delta {
            let penalty = if iteration == 0 {
                sigma2 / changepoint_prior_scale.powi(2)
            } else {
                sigma2 / (changepoint_prior_scale * beta[2 + j].abs().max(DELTA_FLOOR))
            };
            penalties.push(penalty);
        }

        for block in blocks {
            let penalty = sigma2 / block.prior_scale.powi(2);
            let width = block.features.first().map_or(0, Vec::len);
            penalties.extend(std::iter::repeat(penalty).take(width));
        }

        let fit = penalized_fit(&design, target, &penalties)?;
        sigma2 = residual_variance(&design, target, &fit)?;
        beta = fit.coefficients;
        log::trace!("Reweighting pass {}: sigma2 = {:.3e}", iteration, sigma2);
    }

    let mut offset = 2 + n_delta;
    let mut coefficients = Vec::with_capacity(blocks.len());
    for block in blocks {
        let width = block.features.first().map_or(0, Vec::len);
        coefficients.push(beta[offset..offset + width].to_vec());
        offset += width;
    }

    Ok(Estimate {
        trend: PiecewiseTrend {
            k: beta[0],
            m: beta[1],
            deltas: beta[2..2 + n_delta].to_vec(),
            t_change: t_change.to_vec(),
        },
        coefficients,
        sigma2,
    })
}

impl ForecastBackend for DecomposableModel {
    type Fitted = FittedDecomposable;

    fn fit(&self, config: &ModelConfig, history: &TimeSeriesData) -> Result<Self::Fitted> {
        config.validate()?;

        let dates = history.dates()?;
        let y = history.values()?;
        if y.len() < 2 {
            return Err(ForecastError::InsufficientData(format!(
                "Need at least 2 observations to fit, got {}",
                y.len()
            )));
        }
        if !dates.windows(2).all(|w| w[0] < w[1]) {
            return Err(ForecastError::DataError(
                "History must be sorted by date without duplicates".to_string(),
            ));
        }

        let time_scale = TimeScale::from_history(&dates)?;
        let t = time_scale.scale_all(&dates);
        let y_scale = match abs_max(&y) {
            scale if scale > 0.0 => scale,
            _ => 1.0,
        };
        let target: Vec<f64> = y.iter().map(|v| v / y_scale).collect();
        let t_change = select_changepoints(&t, config.n_changepoints, config.changepoint_range);

        let seasonalities = config.seasonalities();
        let features = seasonalities
            .iter()
            .map(|s| seasonal_features(s, &dates, history))
            .collect::<Result<Vec<_>>>()?;

        // multiplicative features act on the trend level, taken from an
        // additive-only fit
        let needs_level = seasonalities
            .iter()
            .any(|s| s.mode == SeasonalityMode::Multiplicative);
        let level = if needs_level {
            let additive_only: Vec<SeasonalBlock> = seasonalities
                .iter()
                .zip(&features)
                .filter(|(s, _)| s.mode == SeasonalityMode::Additive)
                .map(|(s, f)| SeasonalBlock {
                    features: f.clone(),
                    prior_scale: s.prior_scale,
                })
                .collect();
            estimate(
                &t,
                &target,
                &t_change,
                &additive_only,
                config.changepoint_prior_scale,
            )?
            .trend
            .evaluate(&t)
        } else {
            vec![1.0; t.len()]
        };

        let blocks: Vec<SeasonalBlock> = seasonalities
            .iter()
            .zip(features)
            .map(|(s, mut f)| {
                if s.mode == SeasonalityMode::Multiplicative {
                    for (row, scale) in f.iter_mut().zip(&level) {
                        row.iter_mut().for_each(|v| *v *= scale);
                    }
                }
                SeasonalBlock {
                    features: f,
                    prior_scale: s.prior_scale,
                }
            })
            .collect();

        let fit = estimate(
            &t,
            &target,
            &t_change,
            &blocks,
            config.changepoint_prior_scale,
        )?;
        let sigma_obs = fit.sigma2.sqrt();

        log::debug!(
            "Fitted {} rows with {} changepoints, sigma_obs {:.4}",
            y.len(),
            t_change.len(),
            sigma_obs * y_scale
        );

        Ok(FittedDecomposable {
            config: config.clone(),
            history: history.clone(),
            time_scale,
            y_scale,
            trend: fit.trend,
            seasonalities: seasonalities
                .into_iter()
                .zip(fit.coefficients)
                .map(|(config, coefficients)| FittedSeasonality {
                    config,
                    coefficients,
                })
                .collect(),
            sigma_obs,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl FittedDecomposable {
    /// Observation noise in the units of the series
    pub fn sigma_obs(&self) -> f64 {
        self.sigma_obs * self.y_scale
    }

    /// Fourier coefficients of a seasonality, in scaled units
    pub fn coefficients(&self, seasonality: &str) -> Option<&[f64]> {
        self.seasonalities
            .iter()
            .find(|s| s.config.name == seasonality)
            .map(|s| s.coefficients.as_slice())
    }
}

impl FittedForecast for FittedDecomposable {
    fn predict(&self, frame: &TimeSeriesData) -> Result<Forecast> {
        let dates = frame.dates()?;
        let n = dates.len();
        let t = self.time_scale.scale_all(&dates);
        let trend: Vec<f64> = self
            .trend
            .evaluate(&t)
            .iter()
            .map(|v| v * self.y_scale)
            .collect();

        let mut additive = vec![0.0; n];
        let mut multiplicative = vec![0.0; n];
        let mut components = BTreeMap::new();

        for seasonality in &self.seasonalities {
            let effect: Vec<f64> = seasonal_features(&seasonality.config, &dates, frame)?
                .iter()
                .map(|row| {
                    row.iter()
                        .zip(&seasonality.coefficients)
                        .map(|(x, beta)| x * beta)
                        .sum()
                })
                .collect();

            let component: Vec<f64> = match seasonality.config.mode {
                SeasonalityMode::Additive => {
                    let values: Vec<f64> = effect.iter().map(|v| v * self.y_scale).collect();
                    additive.iter_mut().zip(&values).for_each(|(a, v)| *a += v);
                    values
                }
                SeasonalityMode::Multiplicative => {
                    multiplicative
                        .iter_mut()
                        .zip(&effect)
                        .for_each(|(m, v)| *m += v);
                    effect
                }
            };
            components.insert(seasonality.config.name.clone(), component);
        }

        let yhat: Vec<f64> = (0..n)
            .map(|i| trend[i] * (1.0 + multiplicative[i]) + additive[i])
            .collect();

        let (yhat_lower, yhat_upper) = if self.config.uncertainty_samples == 0 {
            analytic_interval(&yhat, self.sigma_obs(), self.config.interval_width)?
        } else {
            let parts = PredictionParts {
                t: &t,
                additive: &additive,
                multiplicative: &multiplicative,
            };
            simulated_interval(
                &self.trend,
                parts,
                self.y_scale,
                self.sigma_obs,
                &self.config,
            )?
        };

        components.insert(ADDITIVE_TERMS.to_string(), additive);
        components.insert(MULTIPLICATIVE_TERMS.to_string(), multiplicative);

        Ok(Forecast {
            ds: dates,
            yhat,
            yhat_lower,
            yhat_upper,
            trend,
            components,
        })
    }

    fn history(&self) -> &TimeSeriesData {
        &self.history
    }

    fn config(&self) -> &ModelConfig {
        &self.config
    }
}
