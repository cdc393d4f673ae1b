//! Column normalization, recession tagging and the train/test split

use crate::data::{parse_date_column, parse_float_column, Observation, TimeSeriesData};
use crate::error::{ForecastError, Result};
use crate::recession::RecessionWindow;
use crate::utils::ymd;
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

/// Raw date column name in the input file
pub const RAW_DATE_COLUMN: &str = "month_and_year";
/// Raw price column name in the input file
pub const RAW_PRICE_COLUMN: &str = "gas_price";

/// Date boundaries separating training and test rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitBoundaries {
    /// First date that no longer belongs to training (exclusive train bound)
    pub test_start: NaiveDate,
    /// Last date that belongs to the test set (inclusive)
    pub test_end: NaiveDate,
}

impl Default for SplitBoundaries {
    fn default() -> Self {
        Self {
            test_start: ymd(2016, 1, 1),
            test_end: ymd(2018, 1, 1),
        }
    }
}

impl SplitBoundaries {
    /// Whether the date belongs to the training range
    pub fn is_train(&self, date: NaiveDate) -> bool {
        date < self.test_start
    }

    /// Whether the date belongs to the test range
    pub fn is_test(&self, date: NaiveDate) -> bool {
        self.test_start <= date && date <= self.test_end
    }
}

/// Tagged dataset together with its train and test splits
#[derive(Debug, Clone)]
pub struct Partition {
    /// All rows, renamed to `ds`/`y` and tagged with `great_recession`
    pub tagged: TimeSeriesData,
    /// Rows before the test start
    pub train: TimeSeriesData,
    /// Rows within the test range, bounds included
    pub test: TimeSeriesData,
}

/// Normalizes the raw frame and splits it by fixed date boundaries
#[derive(Debug, Clone, Default)]
pub struct DatasetPartitioner {
    boundaries: SplitBoundaries,
    recession: RecessionWindow,
}

impl DatasetPartitioner {
    /// Create a partitioner with explicit boundaries and recession window
    pub fn new(boundaries: SplitBoundaries, recession: RecessionWindow) -> Result<Self> {
        if boundaries.test_start > boundaries.test_end {
            return Err(ForecastError::InvalidParameter(format!(
                "Test start {} is after test end {}",
                boundaries.test_start, boundaries.test_end
            )));
        }
        Ok(Self {
            boundaries,
            recession,
        })
    }

    /// Split boundaries in use
    pub fn boundaries(&self) -> &SplitBoundaries {
        &self.boundaries
    }

    /// Rename the raw columns to `ds`/`y`, tag every row and sort by date.
    ///
    /// Fails with an input schema error before reading any values when a
    /// required column is absent.
    pub fn rename_and_tag(&self, raw: &DataFrame) -> Result<TimeSeriesData> {
        let names = raw.get_column_names();
        let missing: Vec<&str> = [RAW_DATE_COLUMN, RAW_PRICE_COLUMN]
            .into_iter()
            .filter(|required| !names.contains(required))
            .collect();
        if !missing.is_empty() {
            return Err(ForecastError::InputSchema(format!(
                "Missing required column(s) {:?}; found {:?}",
                missing, names
            )));
        }

        let dates = parse_date_column(raw.column(RAW_DATE_COLUMN)?)?;
        let prices = parse_float_column(raw.column(RAW_PRICE_COLUMN)?)?;

        let mut observations: Vec<Observation> = dates
            .into_iter()
            .zip(prices)
            .map(|(ds, y)| Observation {
                ds,
                y,
                great_recession: self.recession.contains(ds),
            })
            .collect();
        observations.sort_by_key(|o| o.ds);

        if let Some(pair) = observations.windows(2).find(|w| w[0].ds == w[1].ds) {
            return Err(ForecastError::DataError(format!(
                "Duplicate date {} in input",
                pair[0].ds
            )));
        }

        TimeSeriesData::from_observations(&observations)
    }

    /// Split a tagged dataset into independent train and test copies
    pub fn split(&self, tagged: &TimeSeriesData) -> Result<(TimeSeriesData, TimeSeriesData)> {
        let boundaries = self.boundaries;
        let train = tagged.filter_dates(|d| boundaries.is_train(d))?;
        let test = tagged.filter_dates(|d| boundaries.is_test(d))?;

        let dropped = tagged.len() - train.len() - test.len();
        if dropped > 0 {
            log::warn!(
                "{} row(s) after {} belong to neither split and were dropped",
                dropped,
                boundaries.test_end
            );
        }

        Ok((train, test))
    }

    /// Rename, tag and split the raw dataset
    pub fn partition(&self, raw: &DataFrame) -> Result<Partition> {
        let tagged = self.rename_and_tag(raw)?;
        let (train, test) = self.split(&tagged)?;

        log::info!(
            "Partitioned {} rows into {} training and {} test rows",
            tagged.len(),
            train.len(),
            test.len()
        );

        Ok(Partition {
            tagged,
            train,
            test,
        })
    }
}
