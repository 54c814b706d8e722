//! Trailing-window aggregates over sequences with missing values.
//!
//! Missing entries are skipped inside a window. A window produces a value only
//! when it holds at least `min_periods` present observations; otherwise the
//! output is `None`. Windows are re-summed directly from the slice, so each
//! output equals a fresh aggregate of its trailing slice.

/// Present values in the trailing window ending at `i` (inclusive).
fn window_values(values: &[Option<f64>], i: usize, window: usize) -> impl Iterator<Item = f64> + '_ {
    let start = (i + 1).saturating_sub(window);
    values[start..=i].iter().filter_map(|v| *v)
}

/// Trailing sum over `window` rows.
pub fn rolling_sum(values: &[Option<f64>], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    assert!(window >= 1, "rolling window must be >= 1");
    (0..values.len())
        .map(|i| {
            let mut count = 0usize;
            let mut sum = 0.0;
            for v in window_values(values, i, window) {
                count += 1;
                sum += v;
            }
            (count >= min_periods.max(1)).then_some(sum)
        })
        .collect()
}

/// Trailing mean over `window` rows.
pub fn rolling_mean(values: &[Option<f64>], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    assert!(window >= 1, "rolling window must be >= 1");
    (0..values.len())
        .map(|i| {
            let mut count = 0usize;
            let mut sum = 0.0;
            for v in window_values(values, i, window) {
                count += 1;
                sum += v;
            }
            (count >= min_periods.max(1)).then(|| sum / count as f64)
        })
        .collect()
}

/// Previous element of the sequence (`None` for the first).
pub fn lag(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if !values.is_empty() {
        out.push(None);
        out.extend_from_slice(&values[..values.len() - 1]);
    }
    out
}

/// Median of the present values, `None` when there are none.
pub fn median(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let mut sorted: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().map(|v| Some(*v)).collect()
    }

    #[test]
    fn sum_with_min_periods_one_starts_immediately() {
        let out = rolling_sum(&some(&[1.0, 2.0, 3.0, 4.0]), 3, 1);
        assert_eq!(out, vec![Some(1.0), Some(3.0), Some(6.0), Some(9.0)]);
    }

    #[test]
    fn sum_skips_missing_values() {
        let values = vec![Some(1.0), None, Some(3.0)];
        assert_eq!(rolling_sum(&values, 2, 1), vec![Some(1.0), Some(1.0), Some(3.0)]);
    }

    #[test]
    fn all_missing_window_is_none() {
        let values = vec![None, None];
        assert_eq!(rolling_sum(&values, 14, 1), vec![None, None]);
    }

    #[test]
    fn mean_waits_for_min_periods() {
        let out = rolling_mean(&some(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]), 5, 5);
        assert!(out[..4].iter().all(|v| v.is_none()));
        assert_approx(out[4].unwrap(), 12.0, DEFAULT_EPSILON);
        assert_approx(out[5].unwrap(), 13.0, DEFAULT_EPSILON);
    }

    #[test]
    fn mean_with_gap_needs_full_count() {
        let mut values = some(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        values[3] = None;
        let out = rolling_mean(&values, 5, 5);
        assert!(out[4].is_none());
        assert!(out[5].is_none());
    }

    #[test]
    fn lag_shifts_by_one() {
        assert_eq!(lag(&some(&[1.0, 2.0])), vec![None, Some(1.0)]);
        assert!(lag(&[]).is_empty());
    }

    #[test]
    fn median_odd_even_and_empty() {
        assert_eq!(median([3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median([4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(std::iter::empty()), None);
    }
}
