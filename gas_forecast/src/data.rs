//! Time series data handling for forecasting

use crate::error::{ForecastError, Result};
use crate::recession::GREAT_RECESSION_COLUMN;
use crate::utils::{date_from_epoch_days, date_parser, days_since_epoch};
use chrono::NaiveDate;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Name of the normalized date column
pub const DATE_COLUMN: &str = "ds";
/// Name of the normalized value column
pub const VALUE_COLUMN: &str = "y";

/// A single tagged monthly observation
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Observation {
    /// Calendar month-start date
    pub ds: NaiveDate,
    /// Gasoline price
    pub y: f64,
    /// Recession indicator derived from `ds`
    pub great_recession: bool,
}

/// Time series data structure for forecasting.
///
/// Wraps a polars frame with a `ds` date column, an optional `y` value column
/// and any number of 0/1 condition columns such as `great_recession`.
#[derive(Debug, Clone)]
pub struct TimeSeriesData {
    /// Data frame containing the time series data
    df: DataFrame,
}

/// Data loader for the raw input file
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load the raw dataset from a CSV file.
    ///
    /// Only the first two columns (date and price, by position) are kept; the
    /// header names are preserved for the partitioner's schema check.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let path = path.as_ref();
        log::info!("Loading raw dataset from {}", path.display());

        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::first_two_columns(df)
    }

    /// Keep the first two columns of an already loaded frame
    pub fn first_two_columns(df: DataFrame) -> Result<DataFrame> {
        let date = df.select_at_idx(0);
        let price = df.select_at_idx(1);

        match (date, price) {
            (Some(date), Some(price)) => {
                let raw = DataFrame::new(vec![date.clone(), price.clone()])?;
                log::debug!("Raw dataset has {} rows", raw.height());
                Ok(raw)
            }
            _ => Err(ForecastError::InputSchema(format!(
                "Expected at least two columns (date, price), found {}",
                df.width()
            ))),
        }
    }
}

/// Parse every value of a column as a calendar date
pub(crate) fn parse_date_column(series: &Series) -> Result<Vec<NaiveDate>> {
    let as_text = series.cast(&DataType::Utf8)?;
    let values = as_text.utf8()?;

    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value {
            Some(text) => date_parser::parse_date(text),
            None => Err(ForecastError::Parse(format!(
                "Missing date in column '{}' at row {}",
                series.name(),
                row
            ))),
        })
        .collect()
}

/// Parse every value of a column as a float
pub(crate) fn parse_float_column(series: &Series) -> Result<Vec<f64>> {
    let as_float = series.cast(&DataType::Float64).map_err(|e| {
        ForecastError::Parse(format!("Column '{}' is not numeric: {}", series.name(), e))
    })?;
    let values = as_float.f64()?;

    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.filter(|v| v.is_finite()).ok_or_else(|| {
                ForecastError::Parse(format!(
                    "Missing or non-numeric value in column '{}' at row {}",
                    series.name(),
                    row
                ))
            })
        })
        .collect()
}

fn date_series(dates: &[NaiveDate]) -> Result<Series> {
    let days: Vec<i32> = dates.iter().map(|d| days_since_epoch(*d)).collect();
    Ok(Series::new(DATE_COLUMN, days).cast(&DataType::Date)?)
}

impl TimeSeriesData {
    /// Build a frame from tagged observations
    pub fn from_observations(observations: &[Observation]) -> Result<Self> {
        let dates: Vec<NaiveDate> = observations.iter().map(|o| o.ds).collect();
        let values: Vec<f64> = observations.iter().map(|o| o.y).collect();
        let flags: Vec<i32> = observations
            .iter()
            .map(|o| i32::from(o.great_recession))
            .collect();

        let df = DataFrame::new(vec![
            date_series(&dates)?,
            Series::new(VALUE_COLUMN, values),
            Series::new(GREAT_RECESSION_COLUMN, flags),
        ])?;

        Ok(Self { df })
    }

    /// Build a frame of dates without values, for prediction only
    pub fn from_dates(dates: &[NaiveDate]) -> Result<Self> {
        let df = DataFrame::new(vec![date_series(dates)?])?;
        Ok(Self { df })
    }

    /// Create a new TimeSeriesData from dates and values, without conditions
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::DataError(format!(
                "Dates ({}) and values ({}) have different lengths",
                dates.len(),
                values.len()
            )));
        }

        let df = DataFrame::new(vec![
            date_series(&dates)?,
            Series::new(VALUE_COLUMN, values),
        ])?;
        Ok(Self { df })
    }

    /// Add or replace a 0/1 condition column computed from each date
    pub fn with_condition<F>(mut self, name: &str, tag: F) -> Result<Self>
    where
        F: Fn(NaiveDate) -> i32,
    {
        let flags: Vec<i32> = self.dates()?.into_iter().map(tag).collect();
        self.df.with_column(Series::new(name, flags))?;
        Ok(self)
    }

    /// Get the DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Get the dates as a vector
    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        let col = self.df.column(DATE_COLUMN)?;
        let days = col.cast(&DataType::Int32)?;

        days.i32()?
            .into_iter()
            .map(|value| {
                value
                    .ok_or_else(|| ForecastError::DataError("Null date in series".to_string()))
                    .and_then(date_from_epoch_days)
            })
            .collect()
    }

    /// Whether the frame carries observed values
    pub fn has_values(&self) -> bool {
        self.df.get_column_names().contains(&VALUE_COLUMN)
    }

    /// Get the observed values as a vector
    pub fn values(&self) -> Result<Vec<f64>> {
        if !self.has_values() {
            return Err(ForecastError::DataError(format!(
                "Series has no '{}' column",
                VALUE_COLUMN
            )));
        }
        parse_float_column(self.df.column(VALUE_COLUMN)?)
    }

    /// Get a condition column as booleans
    pub fn condition(&self, name: &str) -> Result<Vec<bool>> {
        let col = self.df.column(name).map_err(|_| {
            ForecastError::InputSchema(format!("Condition column '{}' not found", name))
        })?;
        let flags = col.cast(&DataType::Int32)?;

        let result = flags
            .i32()?
            .into_iter()
            .map(|value| value.unwrap_or(0) != 0)
            .collect();
        Ok(result)
    }

    /// Rebuild the tagged observations held by the frame
    pub fn observations(&self) -> Result<Vec<Observation>> {
        let dates = self.dates()?;
        let values = self.values()?;
        let flags = match self.condition(GREAT_RECESSION_COLUMN) {
            Ok(flags) => flags,
            Err(ForecastError::InputSchema(_)) => vec![false; dates.len()],
            Err(other) => return Err(other),
        };

        Ok(dates
            .into_iter()
            .zip(values)
            .zip(flags)
            .map(|((ds, y), great_recession)| Observation {
                ds,
                y,
                great_recession,
            })
            .collect())
    }

    /// Stack another series with the same columns below this one
    pub fn concat(&self, other: &Self) -> Result<Self> {
        let df = self.df.vstack(&other.df)?;
        Ok(Self { df })
    }

    /// Keep the rows whose date satisfies the predicate
    pub fn filter_dates<F>(&self, keep: F) -> Result<Self>
    where
        F: Fn(NaiveDate) -> bool,
    {
        let mask: Vec<bool> = self.dates()?.into_iter().map(keep).collect();
        let mask = BooleanChunked::from_slice("mask", &mask);
        Ok(Self {
            df: self.df.filter(&mask)?,
        })
    }

    /// First date in the series
    pub fn first_date(&self) -> Result<NaiveDate> {
        self.dates()?
            .first()
            .copied()
            .ok_or_else(|| ForecastError::InsufficientData("Series is empty".to_string()))
    }

    /// Last date in the series
    pub fn last_date(&self) -> Result<NaiveDate> {
        self.dates()?
            .last()
            .copied()
            .ok_or_else(|| ForecastError::InsufficientData("Series is empty".to_string()))
    }

    /// Check if the time series is empty
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Get the length of the time series
    pub fn len(&self) -> usize {
        self.df.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ymd;

    fn observation(ds: NaiveDate, y: f64, great_recession: bool) -> Observation {
        Observation {
            ds,
            y,
            great_recession,
        }
    }

    fn sample() -> TimeSeriesData {
        let observations = vec![
            observation(ymd(2007, 11, 1), 3.0, false),
            observation(ymd(2007, 12, 1), 3.1, true),
            observation(ymd(2008, 1, 1), 3.2, true),
        ];
        TimeSeriesData::from_observations(&observations).unwrap()
    }

    #[test]
    fn test_observation_roundtrip() {
        let data = sample();
        assert_eq!(data.len(), 3);
        assert_eq!(data.dates().unwrap()[1], ymd(2007, 12, 1));
        assert_eq!(data.values().unwrap(), vec![3.0, 3.1, 3.2]);
        assert_eq!(
            data.condition(GREAT_RECESSION_COLUMN).unwrap(),
            vec![false, true, true]
        );
        assert_eq!(data.observations().unwrap()[2].y, 3.2);
    }

    #[test]
    fn test_filter_and_concat() {
        let data = sample();
        let early = data.filter_dates(|d| d < ymd(2007, 12, 1)).unwrap();
        let late = data.filter_dates(|d| d >= ymd(2007, 12, 1)).unwrap();
        assert_eq!(early.len(), 1);
        assert_eq!(late.len(), 2);

        let joined = early.concat(&late).unwrap();
        assert_eq!(joined.dates().unwrap(), data.dates().unwrap());
        assert_eq!(joined.last_date().unwrap(), ymd(2008, 1, 1));
    }

    #[test]
    fn test_date_only_frame() {
        let frame = TimeSeriesData::from_dates(&[ymd(2018, 2, 1), ymd(2018, 3, 1)])
            .unwrap()
            .with_condition(GREAT_RECESSION_COLUMN, |_| 0)
            .unwrap();
        assert!(!frame.has_values());
        assert!(frame.values().is_err());
        assert_eq!(
            frame.condition(GREAT_RECESSION_COLUMN).unwrap(),
            vec![false, false]
        );
        assert!(frame.condition("missing").is_err());
    }

    #[test]
    fn test_first_two_columns() {
        let df = DataFrame::new(vec![
            Series::new("month_and_year", vec!["1992-01-01", "1992-02-01"]),
            Series::new("gas_price", vec![1.0, 1.1]),
            Series::new("extra", vec![0, 1]),
        ])
        .unwrap();
        let raw = DataLoader::first_two_columns(df).unwrap();
        assert_eq!(raw.width(), 2);

        let narrow = DataFrame::new(vec![Series::new("only", vec![1.0])]).unwrap();
        assert!(matches!(
            DataLoader::first_two_columns(narrow),
            Err(ForecastError::InputSchema(_))
        ));
    }
}
