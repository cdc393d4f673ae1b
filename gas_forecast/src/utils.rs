//! Utility functions for the gas_forecast crate

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Calendar date from constant parts.
///
/// Only for literals known to be valid; user input goes through
/// [`date_parser::parse_date`].
pub(crate) fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("constant calendar date is valid")
}

fn unix_epoch() -> NaiveDate {
    ymd(1970, 1, 1)
}

/// Whole days between 1970-01-01 and the date
pub fn days_since_epoch(date: NaiveDate) -> i32 {
    (date - unix_epoch()).num_days() as i32
}

/// Inverse of [`days_since_epoch`]
pub fn date_from_epoch_days(days: i32) -> Result<NaiveDate> {
    unix_epoch()
        .checked_add_signed(Duration::days(i64::from(days)))
        .ok_or_else(|| ForecastError::Parse(format!("Day offset {} is out of range", days)))
}

/// Sampling frequency of a date axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    /// First day of each calendar month
    MonthStart,
}

/// Create future dates for forecasting.
///
/// Returns `periods` dates strictly after `anchor`. For [`Frequency::MonthStart`]
/// an anchor that is not a first-of-month rolls forward to the next one.
pub fn future_dates(
    anchor: NaiveDate,
    periods: usize,
    frequency: Frequency,
) -> Result<Vec<NaiveDate>> {
    let mut dates = Vec::with_capacity(periods);

    let overflow = || {
        ForecastError::InvalidParameter(format!(
            "Cannot extend {} by {} periods",
            anchor, periods
        ))
    };

    match frequency {
        Frequency::Daily | Frequency::Weekly => {
            let step = if frequency == Frequency::Daily {
                Duration::days(1)
            } else {
                Duration::weeks(1)
            };
            let mut current = anchor;
            for _ in 0..periods {
                current = current.checked_add_signed(step).ok_or_else(overflow)?;
                dates.push(current);
            }
        }
        Frequency::MonthStart => {
            let month_start = anchor.with_day(1).ok_or_else(overflow)?;
            for i in 1..=periods {
                let next = month_start
                    .checked_add_months(Months::new(i as u32))
                    .ok_or_else(overflow)?;
                dates.push(next);
            }
        }
    }

    Ok(dates)
}

/// Date parsing for the raw input file
pub mod date_parser {
    use crate::error::{ForecastError, Result};
    use chrono::{NaiveDate, NaiveDateTime};

    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
    ];

    /// Parse a calendar date in one of the supported layouts.
    ///
    /// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, `MM/DD/YYYY`, date-times (the time
    /// part is dropped) and `YYYY-MM`, which maps to the first of the month.
    pub fn parse_date(raw: &str) -> Result<NaiveDate> {
        let value = raw.trim().trim_matches('"');

        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(value, format) {
                return Ok(date);
            }
        }

        for format in DATETIME_FORMATS {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
                return Ok(datetime.date());
            }
        }

        if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", value), "%Y-%m-%d") {
            return Ok(date);
        }

        Err(ForecastError::Parse(format!(
            "Invalid date value: '{}'",
            raw
        )))
    }
}
