//! Recession window tagging
//!
//! The tag is a pure function of the date alone, so it can be recomputed for
//! any date axis (history, held-out rows or future periods) and always agrees.

use crate::error::{ForecastError, Result};
use crate::utils::ymd;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Name of the derived recession indicator column
pub const GREAT_RECESSION_COLUMN: &str = "great_recession";

/// Inclusive calendar window marking a recession
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecessionWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl RecessionWindow {
    /// Create a window covering `start..=end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(ForecastError::InvalidParameter(format!(
                "Recession window start {} is after its end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// The Great Recession, December 2007 through June 2009
    pub fn great_recession() -> Self {
        Self {
            start: ymd(2007, 12, 1),
            end: ymd(2009, 6, 1),
        }
    }

    /// First day of the window
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the window
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether the date falls inside the window, bounds included
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Binary indicator: 1 inside the window, 0 outside
    pub fn tag(&self, date: NaiveDate) -> i32 {
        i32::from(self.contains(date))
    }
}

impl Default for RecessionWindow {
    fn default() -> Self {
        Self::great_recession()
    }
}

/// Tag a date with 1 if it falls in the Great Recession, 0 otherwise
pub fn is_great_recession(date: NaiveDate) -> i32 {
    RecessionWindow::great_recession().tag(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_are_inclusive() {
        assert_eq!(is_great_recession(ymd(2007, 12, 1)), 1);
        assert_eq!(is_great_recession(ymd(2009, 6, 1)), 1);
        assert_eq!(is_great_recession(ymd(2007, 11, 30)), 0);
        assert_eq!(is_great_recession(ymd(2009, 6, 2)), 0);
    }

    #[test]
    fn test_inside_and_outside() {
        assert_eq!(is_great_recession(ymd(2008, 9, 15)), 1);
        assert_eq!(is_great_recession(ymd(1992, 1, 1)), 0);
        assert_eq!(is_great_recession(ymd(2016, 1, 1)), 0);
    }

    #[test]
    fn test_custom_window() {
        let window = RecessionWindow::new(ymd(2020, 2, 1), ymd(2020, 4, 1)).unwrap();
        assert!(window.contains(ymd(2020, 3, 1)));
        assert!(!window.contains(ymd(2020, 5, 1)));
        assert_eq!(window.start(), ymd(2020, 2, 1));
        assert_eq!(window.end(), ymd(2020, 4, 1));

        let reversed = RecessionWindow::new(ymd(2020, 4, 1), ymd(2020, 2, 1));
        assert!(reversed.is_err());
    }
}
