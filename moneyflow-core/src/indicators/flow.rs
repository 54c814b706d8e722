//! Money Flow Index over a single stock's date-ordered rows.
//!
//! Direction compares each row's VWAP with the previous row's. Positive and
//! negative flow are the row's money flow split by that direction, summed over
//! a trailing window (at least one present value required), then folded into
//! the oscillator `100 - 100 / (1 + pos / neg)`.

use super::rolling::{lag, rolling_sum};
use crate::domain::{FlowDirection, MfiSignal};

pub const MFI_OVERBOUGHT: f64 = 80.0;
pub const MFI_OVERSOLD: f64 = 20.0;

pub fn flow_direction(vwap: Option<f64>, prev_vwap: Option<f64>) -> FlowDirection {
    match (vwap, prev_vwap) {
        (Some(v), Some(p)) if v > p => FlowDirection::Positive,
        (Some(v), Some(p)) if v < p => FlowDirection::Negative,
        _ => FlowDirection::Neutral,
    }
}

/// `(positive, negative)` flow for a row. The side that does not match the
/// direction is zero; the matching side carries the (possibly missing) money flow.
pub fn split_flow(direction: FlowDirection, money_flow: Option<f64>) -> (Option<f64>, Option<f64>) {
    match direction {
        FlowDirection::Positive => (money_flow, Some(0.0)),
        FlowDirection::Negative => (Some(0.0), money_flow),
        FlowDirection::Neutral => (Some(0.0), Some(0.0)),
    }
}

/// MFI rounded to two decimals; exactly 100 when there is no negative flow.
pub fn money_flow_index(pos_flow: Option<f64>, neg_flow: Option<f64>) -> Option<f64> {
    let (pos, neg) = (pos_flow?, neg_flow?);
    if neg == 0.0 {
        return Some(100.0);
    }
    let raw = 100.0 - 100.0 / (1.0 + pos / neg);
    Some(round2(raw))
}

pub fn mfi_signal(mfi: Option<f64>) -> MfiSignal {
    match mfi {
        Some(m) if m >= MFI_OVERBOUGHT => MfiSignal::Overbought,
        Some(m) if m <= MFI_OVERSOLD => MfiSignal::Oversold,
        _ => MfiSignal::Normal,
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// MFI columns for one stock, one entry per input row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowSeries {
    pub prev_vwap: Vec<Option<f64>>,
    pub direction: Vec<FlowDirection>,
    pub positive: Vec<Option<f64>>,
    pub negative: Vec<Option<f64>>,
    pub pos_window: Vec<Option<f64>>,
    pub neg_window: Vec<Option<f64>>,
    pub mfi: Vec<Option<f64>>,
    pub signal: Vec<MfiSignal>,
}

/// Compute the flow series. `vwap` and `money_flow` must be in date order
/// for a single stock and have equal length.
pub fn flow_series(vwap: &[Option<f64>], money_flow: &[Option<f64>], window: usize) -> FlowSeries {
    debug_assert_eq!(vwap.len(), money_flow.len());
    let prev_vwap = lag(vwap);
    let direction: Vec<FlowDirection> = vwap
        .iter()
        .zip(&prev_vwap)
        .map(|(v, p)| flow_direction(*v, *p))
        .collect();
    let (positive, negative): (Vec<_>, Vec<_>) = direction
        .iter()
        .zip(money_flow)
        .map(|(d, mf)| split_flow(*d, *mf))
        .unzip();
    let pos_window = rolling_sum(&positive, window, 1);
    let neg_window = rolling_sum(&negative, window, 1);
    let mfi: Vec<Option<f64>> = pos_window
        .iter()
        .zip(&neg_window)
        .map(|(p, n)| money_flow_index(*p, *n))
        .collect();
    let signal = mfi.iter().map(|m| mfi_signal(*m)).collect();

    FlowSeries {
        prev_vwap,
        direction,
        positive,
        negative,
        pos_window,
        neg_window,
        mfi,
        signal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn direction_needs_both_sides() {
        assert_eq!(flow_direction(Some(2.0), Some(1.0)), FlowDirection::Positive);
        assert_eq!(flow_direction(Some(1.0), Some(2.0)), FlowDirection::Negative);
        assert_eq!(flow_direction(Some(1.0), Some(1.0)), FlowDirection::Neutral);
        assert_eq!(flow_direction(Some(1.0), None), FlowDirection::Neutral);
    }

    #[test]
    fn mfi_without_negative_flow_is_100() {
        assert_eq!(money_flow_index(Some(0.0), Some(0.0)), Some(100.0));
        assert_eq!(money_flow_index(Some(5.0), Some(0.0)), Some(100.0));
    }

    #[test]
    fn mfi_is_rounded_to_two_decimals() {
        // pos/neg = 2 → 100 - 100/3 = 66.666…
        assert_eq!(money_flow_index(Some(200.0), Some(100.0)), Some(66.67));
        assert_eq!(money_flow_index(Some(0.0), Some(100.0)), Some(0.0));
        assert_eq!(money_flow_index(None, Some(1.0)), None);
    }

    #[test]
    fn signal_bands_are_inclusive() {
        assert_eq!(mfi_signal(Some(80.0)), MfiSignal::Overbought);
        assert_eq!(mfi_signal(Some(20.0)), MfiSignal::Oversold);
        assert_eq!(mfi_signal(Some(50.0)), MfiSignal::Normal);
        assert_eq!(mfi_signal(None), MfiSignal::Normal);
    }

    #[test]
    fn series_first_row_has_no_previous() {
        let vwap = vec![Some(100.0), Some(102.0), Some(101.0)];
        let mf = vec![Some(1000.0), Some(2000.0), Some(500.0)];
        let s = flow_series(&vwap, &mf, 14);

        assert_eq!(s.prev_vwap, vec![None, Some(100.0), Some(102.0)]);
        assert_eq!(
            s.direction,
            vec![FlowDirection::Neutral, FlowDirection::Positive, FlowDirection::Negative]
        );
        assert_eq!(s.positive, vec![Some(0.0), Some(2000.0), Some(0.0)]);
        assert_eq!(s.negative, vec![Some(0.0), Some(0.0), Some(500.0)]);
        assert_eq!(s.mfi[0], Some(100.0));
        assert_eq!(s.mfi[1], Some(100.0));
        // 2000 / 500 = 4 → 100 - 20 = 80
        assert_approx(s.mfi[2].unwrap(), 80.0, DEFAULT_EPSILON);
        assert_eq!(s.signal[2], MfiSignal::Overbought);
    }

    #[test]
    fn window_drops_old_flows() {
        let vwap: Vec<Option<f64>> = (0..5).map(|i| Some(100.0 - i as f64)).collect();
        let mf = vec![Some(10.0); 5];
        let s = flow_series(&vwap, &mf, 2);
        assert_eq!(s.neg_window, vec![Some(0.0), Some(10.0), Some(20.0), Some(20.0), Some(20.0)]);
        assert_eq!(s.mfi[4], Some(0.0));
    }

    #[test]
    fn missing_money_flow_on_positive_row() {
        let vwap = vec![Some(1.0), Some(2.0)];
        let mf = vec![Some(10.0), None];
        let s = flow_series(&vwap, &mf, 14);
        assert_eq!(s.positive[1], None);
        assert_eq!(s.pos_window[1], Some(0.0));
    }
}
