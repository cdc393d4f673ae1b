//! Uncertainty intervals for point predictions
//!
//! Intervals come from simulated paths: future trend changes are drawn at the
//! rate and magnitude seen in the history, and observation noise is added on
//! top. With no samples requested an analytic normal band is used instead.

use crate::config::ModelConfig;
use crate::error::{ForecastError, Result};
use crate::models::trend::PiecewiseTrend;
use forecast_math::stats::quantile;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal as NoiseDistribution, Poisson};
use statrs::distribution::{ContinuousCDF, Normal};

/// Inputs of the point prediction, row aligned
#[derive(Debug, Clone, Copy)]
pub struct PredictionParts<'a> {
    /// Model time of each row
    pub t: &'a [f64],
    /// Sum of additive components, in the units of the series
    pub additive: &'a [f64],
    /// Sum of multiplicative components, as fractions of the trend
    pub multiplicative: &'a [f64],
}

/// Lower and upper bounds of the interval
pub type Interval = (Vec<f64>, Vec<f64>);

fn math_error<E: std::fmt::Display>(err: E) -> ForecastError {
    ForecastError::MathError(err.to_string())
}

/// `yhat ± z * sigma` with `z` the normal quantile for the interval width
pub fn analytic_interval(yhat: &[f64], sigma: f64, width: f64) -> Result<Interval> {
    let standard = Normal::new(0.0, 1.0).map_err(math_error)?;
    let z = standard.inverse_cdf((1.0 + width) / 2.0);

    let lower = yhat.iter().map(|v| v - z * sigma).collect();
    let upper = yhat.iter().map(|v| v + z * sigma).collect();
    Ok((lower, upper))
}

/// Interval from `config.uncertainty_samples` simulated paths.
///
/// `sigma_obs` is in scaled units and `y_scale` converts back to the series
/// units. The generator is seeded from the configuration, so repeated calls
/// agree.
pub fn simulated_interval(
    trend: &PiecewiseTrend,
    parts: PredictionParts<'_>,
    y_scale: f64,
    sigma_obs: f64,
    config: &ModelConfig,
) -> Result<Interval> {
    let rows = parts.t.len();
    let samples = config.uncertainty_samples;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = NoiseDistribution::new(0.0, sigma_obs * y_scale).map_err(math_error)?;

    let mut paths: Vec<Vec<f64>> = vec![Vec::with_capacity(samples); rows];
    for _ in 0..samples {
        let trend_path = sample_trend(trend, parts.t, &mut rng)?;
        for (row, path) in paths.iter_mut().enumerate() {
            let level = trend_path[row] * y_scale;
            let value = level * (1.0 + parts.multiplicative[row])
                + parts.additive[row]
                + noise.sample(&mut rng);
            path.push(value);
        }
    }

    let lower_q = (1.0 - config.interval_width) / 2.0;
    let upper_q = (1.0 + config.interval_width) / 2.0;

    let mut lower = Vec::with_capacity(rows);
    let mut upper = Vec::with_capacity(rows);
    for path in &paths {
        lower.push(quantile(path, lower_q)?);
        upper.push(quantile(path, upper_q)?);
    }
    Ok((lower, upper))
}

/// One trend path with new changepoints beyond the end of the history.
///
/// New changepoints arrive as a Poisson process over `(1, t_max)` at the
/// historical rate, with Laplace magnitudes scaled by the mean absolute
/// historical change.
fn sample_trend(trend: &PiecewiseTrend, t: &[f64], rng: &mut StdRng) -> Result<Vec<f64>> {
    let t_max = t.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let rate = trend.t_change.len() as f64 * (t_max - 1.0);
    if t_max <= 1.0 || rate <= 0.0 {
        return Ok(trend.evaluate(t));
    }

    let n_new = Poisson::new(rate).map_err(math_error)?.sample(rng) as usize;
    let scale = trend.mean_abs_delta() + 1e-8;
    let magnitude = Exp::new(1.0 / scale).map_err(math_error)?;

    let mut path = trend.clone();
    for _ in 0..n_new {
        let location = rng.gen_range(1.0..t_max);
        let size: f64 = magnitude.sample(rng);
        let delta = if rng.gen_bool(0.5) { size } else { -size };
        path.t_change.push(location);
        path.deltas.push(delta);
    }

    Ok(path.evaluate(t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn flat_trend() -> PiecewiseTrend {
        PiecewiseTrend {
            k: 0.0,
            m: 1.0,
            deltas: vec![0.1, -0.1],
            t_change: vec![0.3, 0.6],
        }
    }

    #[test]
    fn test_analytic_interval_is_symmetric() {
        let (lower, upper) = analytic_interval(&[10.0, 20.0], 2.0, 0.8).unwrap();
        // z for 80% is about 1.2816
        assert_relative_eq!(upper[0] - 10.0, 2.0 * 1.2816, epsilon = 1e-3);
        assert_relative_eq!(10.0 - lower[0], upper[0] - 10.0, epsilon = 1e-12);
        assert_relative_eq!(upper[1] - lower[1], upper[0] - lower[0], epsilon = 1e-12);
    }

    #[test]
    fn test_simulated_interval_brackets_prediction() {
        let trend = flat_trend();
        let t = vec![0.5, 1.0, 1.5, 2.0];
        let zeros = vec![0.0; t.len()];
        let parts = PredictionParts {
            t: &t,
            additive: &zeros,
            multiplicative: &zeros,
        };
        let config = ModelConfig {
            uncertainty_samples: 300,
            ..ModelConfig::default()
        };

        let yhat: Vec<f64> = trend.evaluate(&t).iter().map(|v| v * 3.0).collect();
        let (lower, upper) = simulated_interval(&trend, parts, 3.0, 0.01, &config).unwrap();

        for i in 0..t.len() {
            assert!(lower[i] < yhat[i] && yhat[i] < upper[i]);
        }
        // trend uncertainty grows with distance past the history
        assert!(upper[3] - lower[3] > upper[0] - lower[0]);

        let again = simulated_interval(&trend, parts, 3.0, 0.01, &config).unwrap();
        assert_eq!(again.0, lower);
    }

    #[test]
    fn test_no_new_changepoints_inside_history() {
        let trend = flat_trend();
        let mut rng = StdRng::seed_from_u64(7);
        let t = vec![0.0, 0.5, 1.0];
        let sampled = sample_trend(&trend, &t, &mut rng).unwrap();
        assert_eq!(sampled, trend.evaluate(&t));
    }
}
