//! Fourier series features for periodic seasonality

use crate::{MathError, Result};
use std::f64::consts::PI;

/// Build Fourier features for the given time points.
///
/// `t` is measured in days; each row holds `sin(2πnt/P), cos(2πnt/P)` for
/// `n = 1..=order`, interleaved, so every row has `2 * order` columns.
pub fn fourier_series(t: &[f64], period: f64, order: usize) -> Result<Vec<Vec<f64>>> {
    if period <= 0.0 || !period.is_finite() {
        return Err(MathError::InvalidInput(format!(
            "Seasonality period must be positive, got {}",
            period
        )));
    }
    if order == 0 {
        return Err(MathError::InvalidInput(
            "Fourier order must be at least 1".to_string(),
        ));
    }

    let rows = t
        .iter()
        .map(|&ti| {
            let mut row = Vec::with_capacity(2 * order);
            for n in 1..=order {
                let angle = 2.0 * PI * n as f64 * ti / period;
                row.push(angle.sin());
                row.push(angle.cos());
            }
            row
        })
        .collect();

    Ok(rows)
}

/// Zero out feature rows where the condition is false.
///
/// Used for conditional seasonalities that should only contribute on
/// flagged rows.
pub fn apply_condition(features: &mut [Vec<f64>], condition: &[bool]) -> Result<()> {
    if features.len() != condition.len() {
        return Err(MathError::InvalidInput(format!(
            "Condition length ({}) doesn't match feature rows ({})",
            condition.len(),
            features.len()
        )));
    }

    for (row, &active) in features.iter_mut().zip(condition) {
        if !active {
            row.iter_mut().for_each(|v| *v = 0.0);
        }
    }

    Ok(())
}
