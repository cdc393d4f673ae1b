use gas_forecast::config::PipelineConfig;
use gas_forecast::pipeline::run_on_frame;
use gas_forecast::utils::{future_dates, Frequency};
use polars::prelude::*;
use std::f64::consts::PI;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Monthly prices from 1992 through 2017: slow growth, a yearly cycle and
    // a slump during the Great Recession
    let start = chrono::NaiveDate::from_ymd_opt(1992, 1, 1).ok_or("invalid start date")?;
    let mut dates = vec![start];
    dates.extend(future_dates(start, 311, Frequency::MonthStart)?);

    let prices: Vec<f64> = dates
        .iter()
        .enumerate()
        .map(|(i, date)| {
            let season = 0.15 * (2.0 * PI * i as f64 / 12.0).sin();
            let slump = -0.8 * f64::from(gas_forecast::is_great_recession(*date));
            1.1 + 0.008 * i as f64 + season + slump
        })
        .collect();

    let labels: Vec<String> = dates
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect();
    let raw = DataFrame::new(vec![
        Series::new("month_and_year", labels),
        Series::new("gas_price", prices),
    ])?;

    let config = PipelineConfig::default();
    let output = run_on_frame(&raw, &config)?;

    println!("{}", output.accuracy);
    println!(
        "Cross-validation folds: {}",
        output.cross_validation.folds.len()
    );
    for row in output.horizon_metrics.iter().step_by(4) {
        println!(
            "  horizon {:>3} days: MAE {:.4}, RMSE {:.4}, coverage {:.2}",
            row.horizon_days, row.mae, row.rmse, row.coverage
        );
    }

    println!("Last forecast rows:");
    let tail = output.forecast.len().saturating_sub(3);
    for i in tail..output.forecast.len() {
        println!(
            "  {}: {:.3} [{:.3}, {:.3}]",
            output.forecast.ds[i],
            output.forecast.yhat[i],
            output.forecast.yhat_lower[i],
            output.forecast.yhat_upper[i]
        );
    }

    let svg = output.plot.with_size(1280, 720).render_svg();
    println!("SVG plot: {} bytes", svg.len());
    Ok(())
}
