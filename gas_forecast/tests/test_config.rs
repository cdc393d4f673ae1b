mod common;

use gas_forecast::config::{PipelineConfig, SeasonalityMode};
use gas_forecast::diagnostics::CrossValidationConfig;
use gas_forecast::utils::Frequency;
use gas_forecast::ForecastError;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_default_pipeline_config() {
    let config = PipelineConfig::default();
    assert_eq!(config.horizon_periods, 24);
    assert_eq!(config.horizon_frequency, Frequency::MonthStart);
    assert_eq!(config.boundaries.test_start, common::date(2016, 1, 1));
    assert_eq!(config.boundaries.test_end, common::date(2018, 1, 1));
    assert_eq!(config.cross_validation.initial_days, 730);
    assert_eq!(config.cross_validation.period_days, 180);
    assert_eq!(config.cross_validation.horizon_days, 365);
    assert!(config
        .model
        .custom_seasonalities
        .iter()
        .all(|s| s.mode == SeasonalityMode::Additive));
    assert!(config.validate().is_ok());
}

#[test]
fn test_json_file_overrides_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{
            "data_path": "data/prices.csv",
            "horizon_periods": 6,
            "cross_validation": {{ "horizon_days": 180 }}
        }}"#
    )
    .unwrap();

    let config = PipelineConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.data_path.to_str(), Some("data/prices.csv"));
    assert_eq!(config.horizon_periods, 6);
    assert_eq!(
        config.cross_validation,
        CrossValidationConfig {
            horizon_days: 180,
            ..CrossValidationConfig::default()
        }
    );
    assert_eq!(config.model, PipelineConfig::default().model);
}

#[test]
fn test_bad_json_is_a_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{{ not json").unwrap();
    assert!(matches!(
        PipelineConfig::from_json_file(file.path()),
        Err(ForecastError::ConfigError(_))
    ));
}

#[test]
fn test_invalid_values_are_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, r#"{{ "horizon_periods": 0 }}"#).unwrap();
    assert!(matches!(
        PipelineConfig::from_json_file(file.path()),
        Err(ForecastError::InvalidParameter(_))
    ));

    let mut config = PipelineConfig::default();
    config.cross_validation.period_days = 0;
    assert!(config.validate().is_err());
}
