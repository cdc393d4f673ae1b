use forecast_math::MathError;
use gas_forecast::ForecastError;
use pretty_assertions::assert_eq;
use std::io;

#[test]
fn test_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    assert!(matches!(
        ForecastError::from(io_error),
        ForecastError::IoError(_)
    ));

    let math_error = MathError::InsufficientData("empty".to_string());
    assert!(matches!(
        ForecastError::from(math_error),
        ForecastError::InsufficientData(_)
    ));

    let math_error = MathError::CalculationError("singular".to_string());
    assert!(matches!(
        ForecastError::from(math_error),
        ForecastError::MathError(_)
    ));

    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(
        ForecastError::from(json_error),
        ForecastError::ConfigError(_)
    ));
}

#[test]
fn test_error_display() {
    let error =
        ForecastError::InputSchema("Missing required column(s) [\"gas_price\"]".to_string());
    assert_eq!(
        error.to_string(),
        "Input schema error: Missing required column(s) [\"gas_price\"]"
    );

    let error = ForecastError::InvalidParameter("horizon_periods must be at least 1".to_string());
    assert_eq!(
        format!("{}", error),
        "Invalid parameter: horizon_periods must be at least 1"
    );
}
