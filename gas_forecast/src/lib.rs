//! # Gas Forecast
//!
//! Monthly gasoline price forecasting with a recession-conditioned seasonal
//! model.
//!
//! ## Features
//!
//! - CSV ingestion into polars-backed time series (`ds`, `y`, condition columns)
//! - Great Recession tagging and date-bounded train/test partitioning
//! - A pluggable forecasting backend trait with a decomposable
//!   trend + seasonality implementation
//! - Rolling-origin cross-validation and date-keyed test accuracy
//! - Uncertainty intervals and an in-memory SVG forecast plot
//!
//! ## Quick Start
//!
//! ```no_run
//! use gas_forecast::config::PipelineConfig;
//! use gas_forecast::pipeline::run_pipeline;
//!
//! let config = PipelineConfig::default();
//! let output = run_pipeline(&config)?;
//!
//! println!("{}", output.accuracy);
//! let svg = output.plot.render_svg();
//! # Ok::<(), gas_forecast::ForecastError>(())
//! ```
//!
//! ## Custom backends
//!
//! Anything implementing [`ForecastBackend`] can be handed to
//! [`ForecastOrchestrator`]; tagging and partitioning do not depend on it.

pub mod config;
pub mod data;
pub mod diagnostics;
pub mod error;
pub mod metrics;
pub mod models;
pub mod partition;
pub mod pipeline;
pub mod plot;
pub mod recession;
pub mod utils;

// Re-export commonly used types
pub use crate::config::{ModelConfig, PipelineConfig, SeasonalityConfig, SeasonalityMode};
pub use crate::data::{DataLoader, TimeSeriesData};
pub use crate::error::ForecastError;
pub use crate::metrics::AccuracyReport;
pub use crate::models::{DecomposableModel, FittedForecast, Forecast, ForecastBackend};
pub use crate::partition::{DatasetPartitioner, SplitBoundaries};
pub use crate::pipeline::{run_pipeline, ForecastOrchestrator, PipelineOutput};
pub use crate::recession::{is_great_recession, RecessionWindow};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
