//! # Forecast Math
//!
//! Numerical building blocks for decomposable time series forecasting.
//! This crate provides Fourier seasonal features, penalized least squares,
//! error metrics and a few descriptive statistics used by the forecasting
//! backend and its diagnostics.

use thiserror::Error;

pub mod fourier;
pub mod metrics;
pub mod regression;
pub mod stats;

/// Errors that can occur in forecasting-related calculations
#[derive(Error, Debug)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for forecasting math operations
pub type Result<T> = std::result::Result<T, MathError>;
