//! Week bucketing and the week-over-week volume comparison.
//!
//! Weeks are Sunday-anchored (`%Y-%U`): days before a year's first Sunday fall
//! in week `00`. The same key is used for the `Week` column and for the
//! volume comparison.

use chrono::NaiveDate;
use std::collections::BTreeMap;

pub fn week_key(date: NaiveDate) -> String {
    date.format("%Y-%U").to_string()
}

/// Summed volume per week key. Missing volumes contribute nothing.
pub fn weekly_volumes(rows: impl IntoIterator<Item = (NaiveDate, Option<f64>)>) -> BTreeMap<String, f64> {
    let mut weeks = BTreeMap::new();
    for (date, volume) in rows {
        *weeks.entry(week_key(date)).or_insert(0.0) += volume.unwrap_or(0.0);
    }
    weeks
}

/// 1 when the latest week's volume exceeds the week bucket before it, else 0.
///
/// `latest` is the week of the stock's most recent dated row. With no earlier
/// bucket the result is 0.
pub fn volume_change_positive(weeks: &BTreeMap<String, f64>, latest: &str) -> u8 {
    let Some(current) = weeks.get(latest) else {
        return 0;
    };
    match weeks.range::<String, _>(..latest.to_owned()).next_back() {
        Some((_, previous)) if current > previous => 1,
        _ => 0,
    }
}
