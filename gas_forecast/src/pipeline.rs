//! Forecast orchestration and the end-to-end pipeline

use crate::config::{ModelConfig, PipelineConfig};
use crate::data::{DataLoader, TimeSeriesData};
use crate::diagnostics::{CrossValidationConfig, CrossValidationReport, HorizonMetrics};
use crate::error::{ForecastError, Result};
use crate::metrics::{evaluate_by_date, train_accuracy, AccuracyReport};
use crate::models::{DecomposableModel, FittedForecast, Forecast, ForecastBackend};
use crate::partition::DatasetPartitioner;
use crate::plot::ForecastPlot;
use crate::recession::{RecessionWindow, GREAT_RECESSION_COLUMN};
use crate::utils::{future_dates, Frequency};
use polars::prelude::DataFrame;

/// Everything a pipeline run produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Predictions over the combined history and the extended horizon
    pub forecast: Forecast,
    /// Per-fold results of the training cross-validation
    pub cross_validation: CrossValidationReport,
    /// Horizon-indexed cross-validation metrics
    pub horizon_metrics: Vec<HorizonMetrics>,
    /// Train and test accuracy
    pub accuracy: AccuracyReport,
    /// Plot of the forecast over the training history
    pub plot: ForecastPlot,
}

/// Drives a forecasting backend from fit to accuracy report
#[derive(Debug, Clone)]
pub struct ForecastOrchestrator<B: ForecastBackend> {
    backend: B,
    model: ModelConfig,
    cross_validation: CrossValidationConfig,
    recession: RecessionWindow,
    horizon_periods: usize,
    horizon_frequency: Frequency,
}

impl<B: ForecastBackend> ForecastOrchestrator<B> {
    /// Create an orchestrator for a backend and a validated configuration
    pub fn new(backend: B, config: &PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            backend,
            model: config.model.clone(),
            cross_validation: config.cross_validation,
            recession: config.recession,
            horizon_periods: config.horizon_periods,
            horizon_frequency: config.horizon_frequency,
        })
    }

    /// Dates past the end of the series, tagged with the recession indicator
    pub fn future_frame(&self, series: &TimeSeriesData) -> Result<TimeSeriesData> {
        let dates = future_dates(
            series.last_date()?,
            self.horizon_periods,
            self.horizon_frequency,
        )?;
        let recession = self.recession;
        TimeSeriesData::from_dates(&dates)?
            .with_condition(GREAT_RECESSION_COLUMN, |d| recession.tag(d))
    }

    /// Fit on the training rows, predict the combined range plus the horizon,
    /// and score the model against cross-validation folds and the test rows.
    pub fn run(&self, train: &TimeSeriesData, test: &TimeSeriesData) -> Result<PipelineOutput> {
        if test.is_empty() {
            return Err(ForecastError::InsufficientData(
                "Test range has no rows to evaluate".to_string(),
            ));
        }

        let combined = train.concat(test)?;
        log::info!(
            "Fitting {} on {} training rows",
            self.backend.name(),
            train.len()
        );
        let fitted = self.backend.fit(&self.model, train)?;

        let future = self.future_frame(&combined)?;
        let mut forecast = fitted.predict(&combined)?;
        forecast.append(&fitted.predict(&future)?)?;
        log::info!(
            "Predicted {} rows through {}",
            forecast.len(),
            future.last_date()?
        );

        let cross_validation = self
            .backend
            .cross_validate(&self.model, train, &self.cross_validation)?;
        let horizon_metrics =
            cross_validation.performance_metrics(self.cross_validation.rolling_window)?;
        let train_accuracy = train_accuracy(&cross_validation)?;

        let test_accuracy = evaluate_by_date(&forecast, test)?.into();
        let accuracy = AccuracyReport {
            train: train_accuracy,
            test: test_accuracy,
        };
        log::info!(
            "Train MAE {:.4}, RMSE {:.4}; test MAE {:.4}, RMSE {:.4}",
            accuracy.train.mae,
            accuracy.train.rmse,
            accuracy.test.mae,
            accuracy.test.rmse
        );

        let plot = self
            .backend
            .plot(fitted.history(), &forecast)?
            .with_title("Gasoline price forecast");

        Ok(PipelineOutput {
            forecast,
            cross_validation,
            horizon_metrics,
            accuracy,
            plot,
        })
    }
}

/// Partition an already loaded raw frame and run the default backend on it
pub fn run_on_frame(raw: &DataFrame, config: &PipelineConfig) -> Result<PipelineOutput> {
    let partitioner = DatasetPartitioner::new(config.boundaries, config.recession)?;
    let partition = partitioner.partition(raw)?;

    let orchestrator = ForecastOrchestrator::new(DecomposableModel::new(), config)?;
    orchestrator.run(&partition.train, &partition.test)
}

/// Load the configured input file and run the whole pipeline
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineOutput> {
    let raw = DataLoader::from_csv(&config.data_path)?;
    run_on_frame(&raw, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ymd;

    #[test]
    fn test_future_frame_is_tagged() {
        let config = PipelineConfig::default();
        let orchestrator = ForecastOrchestrator::new(DecomposableModel::new(), &config).unwrap();
        let series =
            TimeSeriesData::new(vec![ymd(2007, 9, 1), ymd(2007, 10, 1)], vec![2.0, 2.1]).unwrap();

        let future = orchestrator.future_frame(&series).unwrap();
        assert_eq!(future.len(), 24);
        assert_eq!(future.first_date().unwrap(), ymd(2007, 11, 1));

        let flags = future.condition(GREAT_RECESSION_COLUMN).unwrap();
        assert!(!flags[0]);
        assert!(flags[1]);
        assert!(flags[19]);
        assert!(!flags[20]);
    }

    #[test]
    fn test_empty_test_range_is_rejected() {
        let config = PipelineConfig::default();
        let orchestrator = ForecastOrchestrator::new(DecomposableModel::new(), &config).unwrap();
        let train =
            TimeSeriesData::new(vec![ymd(2000, 1, 1), ymd(2000, 2, 1)], vec![1.0, 1.1]).unwrap();
        let test = train.filter_dates(|_| false).unwrap();

        assert!(matches!(
            orchestrator.run(&train, &test),
            Err(ForecastError::InsufficientData(_))
        ));
    }
}
