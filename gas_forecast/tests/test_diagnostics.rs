mod common;

use common::{date, raw_frame};
use gas_forecast::config::ModelConfig;
use gas_forecast::diagnostics::{generate_cutoffs, CrossValidationConfig};
use gas_forecast::models::{DecomposableModel, ForecastBackend};
use gas_forecast::partition::DatasetPartitioner;
use gas_forecast::{ForecastError, TimeSeriesData};

fn training_history(start: chrono::NaiveDate, months: usize) -> TimeSeriesData {
    DatasetPartitioner::default()
        .partition(&raw_frame(start, months))
        .unwrap()
        .train
}

fn fast_config() -> ModelConfig {
    ModelConfig {
        uncertainty_samples: 50,
        ..ModelConfig::gas_price()
    }
}

#[test]
fn test_cross_validation_folds() {
    let history = training_history(date(2008, 1, 1), 120);
    let cv = CrossValidationConfig::default();
    let backend = DecomposableModel::new();

    let report = backend
        .cross_validate(&fast_config(), &history, &cv)
        .unwrap();
    let cutoffs = generate_cutoffs(&history.dates().unwrap(), &cv).unwrap();

    assert_eq!(report.folds.len(), cutoffs.len());
    assert!(report.folds.len() >= 5);
    for (fold, cutoff) in report.folds.iter().zip(&cutoffs) {
        assert_eq!(fold.cutoff, *cutoff);
        assert!(fold.rows > 0);
        assert!(fold.metrics.mae.is_finite() && fold.metrics.mae >= 0.0);
        assert!(fold.metrics.rmse >= fold.metrics.mae);
    }

    for row in &report.predictions {
        let h = row.horizon_days();
        assert!(h > 0 && h <= 365, "horizon {} out of range", h);
    }
    assert_eq!(
        report.predictions.len(),
        report.folds.iter().map(|f| f.rows).sum::<usize>()
    );
}

#[test]
fn test_horizon_table() {
    let history = training_history(date(2008, 1, 1), 120);
    let cv = CrossValidationConfig::default();
    let report = DecomposableModel::new()
        .cross_validate(&fast_config(), &history, &cv)
        .unwrap();

    let table = report.performance_metrics(cv.rolling_window).unwrap();
    assert!(!table.is_empty());
    assert!(table
        .windows(2)
        .all(|w| w[0].horizon_days < w[1].horizon_days));
    for row in &table {
        assert!(row.rmse >= 0.0 && row.rmse.is_finite());
        assert!((0.0..=1.0).contains(&row.coverage));
    }
}

#[test]
fn test_short_history_is_insufficient() {
    // 20 months cannot hold a 730-day initial window plus a 365-day horizon
    let history = training_history(date(2014, 1, 1), 20);
    let result = DecomposableModel::new().cross_validate(
        &fast_config(),
        &history,
        &CrossValidationConfig::default(),
    );
    assert!(matches!(result, Err(ForecastError::InsufficientData(_))));
}
