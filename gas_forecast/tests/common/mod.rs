#![allow(dead_code)]

use chrono::NaiveDate;
use gas_forecast::utils::{future_dates, Frequency};
use polars::prelude::*;
use std::f64::consts::PI;
use tempfile::NamedTempFile;

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// `months` consecutive month starts beginning at `start`
pub fn monthly_dates(start: NaiveDate, months: usize) -> Vec<NaiveDate> {
    let mut dates = vec![start];
    let rest = future_dates(start, months - 1, Frequency::MonthStart).unwrap();
    dates.extend(rest);
    dates
}

/// Linear trend with a yearly cycle and a dip during the Great Recession
pub fn synthetic_price(index: usize, date: NaiveDate) -> f64 {
    let season = 0.1 * (2.0 * PI * index as f64 / 12.0).sin();
    let dip = -0.5 * f64::from(gas_forecast::is_great_recession(date));
    1.5 + 0.01 * index as f64 + season + dip
}

/// Raw frame with the input file's column names
pub fn raw_frame(start: NaiveDate, months: usize) -> DataFrame {
    let dates = monthly_dates(start, months);
    let labels: Vec<String> = dates
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect();
    let prices: Vec<f64> = dates
        .iter()
        .enumerate()
        .map(|(i, d)| synthetic_price(i, *d))
        .collect();

    DataFrame::new(vec![
        Series::new("month_and_year", labels),
        Series::new("gas_price", prices),
    ])
    .unwrap()
}

/// Write rows to a temporary CSV file with the given header
pub fn write_csv(header: &[&str], rows: &[Vec<String>]) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    {
        let mut writer = csv::Writer::from_path(file.path()).unwrap();
        writer.write_record(header).unwrap();
        for row in rows {
            writer.write_record(row).unwrap();
        }
        writer.flush().unwrap();
    }
    file
}

/// Synthetic monthly input file
pub fn synthetic_csv(start: NaiveDate, months: usize) -> NamedTempFile {
    let rows: Vec<Vec<String>> = monthly_dates(start, months)
        .iter()
        .enumerate()
        .map(|(i, d)| {
            vec![
                d.format("%Y-%m-%d").to_string(),
                format!("{:.4}", synthetic_price(i, *d)),
            ]
        })
        .collect();
    write_csv(&["month_and_year", "gas_price"], &rows)
}
