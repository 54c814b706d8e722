//! Money-flow indicators.
//!
//! `row` holds the pure per-record functions, `flow` and `weekly` the
//! per-stock ordered passes, and `score` the composite ranking value.
//! `engine` ties them together over a merged table.

pub mod engine;
pub mod flow;
pub mod rolling;
pub mod row;
pub mod score;
pub mod weekly;

pub use engine::{median_volume, record_order, IndicatorConfig, IndicatorEngine, IndicatorRun};
pub use flow::{flow_series, money_flow_index, FlowSeries};
pub use row::compute_row;
pub use score::{score, ScoreConditions, MAX_SCORE};
pub use weekly::week_key;

/// Create a dated record for testing.
///
/// Date is 2024-01-`day`; high = close + 1, low = close - 1.
#[cfg(test)]
pub fn make_record(code: &str, day: u32, close: f64, volume: f64) -> crate::domain::DailyRecord {
    let date = chrono::NaiveDate::from_ymd_opt(2024, 1, day);
    let mut rec = crate::domain::DailyRecord::new(code, date, format!("daily_202401{day:02}.csv"));
    rec.high = Some(close + 1.0);
    rec.low = Some(close - 1.0);
    rec.close = Some(close);
    rec.volume = Some(volume);
    rec
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
