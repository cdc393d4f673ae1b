mod common;

use common::date;
use gas_forecast::recession::{is_great_recession, RecessionWindow};
use rstest::rstest;

#[rstest]
#[case(date(2007, 11, 30), 0)]
#[case(date(2007, 12, 1), 1)]
#[case(date(2008, 6, 15), 1)]
#[case(date(2009, 6, 1), 1)]
#[case(date(2009, 6, 2), 0)]
#[case(date(1992, 1, 1), 0)]
#[case(date(2017, 12, 1), 0)]
fn test_great_recession_tag(#[case] day: chrono::NaiveDate, #[case] expected: i32) {
    assert_eq!(is_great_recession(day), expected);
}

#[test]
fn test_tag_is_a_function_of_the_date_only() {
    let window = RecessionWindow::great_recession();
    for day in common::monthly_dates(date(2006, 1, 1), 60) {
        assert_eq!(window.tag(day), is_great_recession(day));
        assert_eq!(window.tag(day), window.tag(day));
    }
}

#[test]
fn test_window_serializes() {
    let window = RecessionWindow::great_recession();
    let json = serde_json::to_string(&window).unwrap();
    let back: RecessionWindow = serde_json::from_str(&json).unwrap();
    assert_eq!(back, window);
}
