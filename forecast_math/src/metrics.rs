//! Error metrics for forecast evaluation

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Point error metrics between actual and predicted values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
}

impl std::fmt::Display for ErrorMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Error Metrics:")?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  MSE:   {:.4}", self.mse)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        Ok(())
    }
}

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(MathError::InvalidInput(format!(
            "Actual ({}) and predicted ({}) values must have the same non-zero length",
            actual.len(),
            predicted.len()
        )));
    }
    Ok(())
}

/// Mean absolute difference between actual and predicted values
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;

    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum();

    Ok(sum / actual.len() as f64)
}

/// Mean squared difference between actual and predicted values
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;

    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    Ok(sum / actual.len() as f64)
}

/// Calculate all error metrics for a set of predictions
pub fn error_metrics(actual: &[f64], predicted: &[f64]) -> Result<ErrorMetrics> {
    let mae = mean_absolute_error(actual, predicted)?;
    let mse = mean_squared_error(actual, predicted)?;

    Ok(ErrorMetrics {
        mae,
        mse,
        rmse: mse.sqrt(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_regression_metrics() {
        let actual = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        let predicted = vec![12.0, 18.0, 33.0, 37.0, 52.0];

        assert_relative_eq!(mean_absolute_error(&actual, &predicted).unwrap(), 2.4);
        assert_relative_eq!(mean_squared_error(&actual, &predicted).unwrap(), 6.0);

        let metrics = error_metrics(&actual, &predicted).unwrap();
        assert_relative_eq!(metrics.mae, 2.4);
        assert_relative_eq!(metrics.rmse, 6.0_f64.sqrt());
        assert!(metrics.rmse >= metrics.mae);
    }

    #[test]
    fn test_equal_residuals_give_equal_mae_and_rmse() {
        let metrics = error_metrics(&[1.0, 2.0, 3.0], &[2.0, 3.0, 4.0]).unwrap();
        assert_relative_eq!(metrics.mae, 1.0);
        assert_relative_eq!(metrics.rmse, 1.0);
    }

    #[test]
    fn test_error_handling() {
        let empty: Vec<f64> = vec![];
        assert!(mean_absolute_error(&empty, &empty).is_err());
        assert!(mean_squared_error(&[1.0, 2.0, 3.0], &[1.0, 2.0]).is_err());
        assert!(error_metrics(&[1.0], &[]).is_err());
    }
}
