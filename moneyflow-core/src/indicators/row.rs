//! Per-record indicators.
//!
//! Each function here reads a single record (plus the run-wide median volume)
//! and never looks at neighbouring rows. Comparisons involving a missing value
//! are false, so missing inputs fall through to the neutral label.

use crate::domain::{DailyRecord, FinalSignal, ForeignFlow, RowIndicators, Signal};

/// Foreign buy/sell dominance multiple.
pub const FOREIGN_DOMINANCE: f64 = 2.0;

/// Imbalance beyond which a directional signal is upgraded to its strong variant.
pub const STRONG_IMBALANCE: f64 = 0.3;

/// Volume multiple of the median that counts as unusual.
pub const UNUSUAL_VOLUME_MULTIPLE: f64 = 2.0;

/// Typical price `(high + low + close) / 3`.
pub fn vwap(high: Option<f64>, low: Option<f64>, close: Option<f64>) -> Option<f64> {
    Some((high? + low? + close?) / 3.0)
}

pub fn money_flow(vwap: Option<f64>, volume: Option<f64>) -> Option<f64> {
    Some(vwap? * volume?)
}

pub fn classify_signal(
    close: Option<f64>,
    vwap: Option<f64>,
    volume: Option<f64>,
    median_volume: Option<f64>,
) -> Signal {
    let (Some(close), Some(vwap), Some(volume), Some(median)) = (close, vwap, volume, median_volume)
    else {
        return Signal::Netral;
    };
    if volume <= median {
        Signal::Netral
    } else if close > vwap {
        Signal::Akumulasi
    } else if close < vwap {
        Signal::Distribusi
    } else {
        Signal::Netral
    }
}

pub fn classify_foreign_flow(buy: Option<f64>, sell: Option<f64>) -> ForeignFlow {
    match (buy, sell) {
        (Some(b), Some(s)) if b > FOREIGN_DOMINANCE * s => ForeignFlow::Inflow,
        (Some(b), Some(s)) if s > FOREIGN_DOMINANCE * b => ForeignFlow::Outflow,
        _ => ForeignFlow::Netral,
    }
}

/// `(bid - offer) / (bid + offer)`, or 0 when either side is missing or
/// negative, or the total is zero.
pub fn bid_offer_imbalance(bid: Option<f64>, offer: Option<f64>) -> f64 {
    match (bid, offer) {
        (Some(b), Some(o)) if b >= 0.0 && o >= 0.0 && b + o > 0.0 => (b - o) / (b + o),
        _ => 0.0,
    }
}

pub fn final_signal(signal: Signal, imbalance: f64) -> FinalSignal {
    match signal {
        Signal::Akumulasi if imbalance > STRONG_IMBALANCE => FinalSignal::StrongAkumulasi,
        Signal::Distribusi if imbalance < -STRONG_IMBALANCE => FinalSignal::StrongDistribusi,
        other => other.into(),
    }
}

pub fn unusual_volume(volume: Option<f64>, median_volume: Option<f64>) -> bool {
    matches!((volume, median_volume), (Some(v), Some(m)) if v > UNUSUAL_VOLUME_MULTIPLE * m)
}

/// All per-record indicators for `record`.
pub fn compute_row(record: &DailyRecord, median_volume: Option<f64>) -> RowIndicators {
    let vwap = vwap(record.high, record.low, record.close);
    let signal = classify_signal(record.close, vwap, record.volume, median_volume);
    let imbalance = bid_offer_imbalance(record.bid_volume, record.offer_volume);
    RowIndicators {
        vwap,
        money_flow: money_flow(vwap, record.volume),
        signal,
        foreign_flow: classify_foreign_flow(record.foreign_buy, record.foreign_sell),
        bid_offer_imbalance: imbalance,
        final_signal: final_signal(signal, imbalance),
        unusual_volume: unusual_volume(record.volume, median_volume),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_record, DEFAULT_EPSILON};

    #[test]
    fn vwap_is_typical_price() {
        assert_approx(vwap(Some(110.0), Some(100.0), Some(108.0)).unwrap(), 106.0, DEFAULT_EPSILON);
        assert_eq!(vwap(Some(1.0), None, Some(1.0)), None);
    }

    #[test]
    fn money_flow_propagates_missing() {
        assert_eq!(money_flow(Some(10.0), Some(5.0)), Some(50.0));
        assert_eq!(money_flow(None, Some(5.0)), None);
    }

    #[test]
    fn signal_requires_above_median_volume() {
        let median = Some(1000.0);
        assert_eq!(classify_signal(Some(108.0), Some(106.0), Some(5000.0), median), Signal::Akumulasi);
        assert_eq!(classify_signal(Some(104.0), Some(106.0), Some(5000.0), median), Signal::Distribusi);
        assert_eq!(classify_signal(Some(108.0), Some(106.0), Some(1000.0), median), Signal::Netral);
        assert_eq!(classify_signal(Some(106.0), Some(106.0), Some(5000.0), median), Signal::Netral);
        assert_eq!(classify_signal(Some(108.0), Some(106.0), Some(5000.0), None), Signal::Netral);
    }

    #[test]
    fn foreign_flow_thresholds_are_strict() {
        assert_eq!(classify_foreign_flow(Some(300.0), Some(100.0)), ForeignFlow::Inflow);
        assert_eq!(classify_foreign_flow(Some(200.0), Some(100.0)), ForeignFlow::Netral);
        assert_eq!(classify_foreign_flow(Some(100.0), Some(201.0)), ForeignFlow::Outflow);
        assert_eq!(classify_foreign_flow(None, Some(10.0)), ForeignFlow::Netral);
        assert_eq!(classify_foreign_flow(Some(0.0), Some(0.0)), ForeignFlow::Netral);
    }

    #[test]
    fn imbalance_edge_cases() {
        assert_approx(bid_offer_imbalance(Some(600.0), Some(400.0)), 0.2, DEFAULT_EPSILON);
        assert_eq!(bid_offer_imbalance(Some(0.0), Some(0.0)), 0.0);
        assert_eq!(bid_offer_imbalance(None, Some(3.0)), 0.0);
        assert_eq!(bid_offer_imbalance(Some(5.0), Some(0.0)), 1.0);
        assert_eq!(bid_offer_imbalance(Some(-1.0), Some(3.0)), 0.0);
    }

    #[test]
    fn strong_variants_need_matching_sign() {
        assert_eq!(final_signal(Signal::Akumulasi, 0.31), FinalSignal::StrongAkumulasi);
        assert_eq!(final_signal(Signal::Akumulasi, 0.3), FinalSignal::Akumulasi);
        assert_eq!(final_signal(Signal::Akumulasi, -0.9), FinalSignal::Akumulasi);
        assert_eq!(final_signal(Signal::Distribusi, -0.5), FinalSignal::StrongDistribusi);
        assert_eq!(final_signal(Signal::Netral, 0.9), FinalSignal::Netral);
    }

    #[test]
    fn unusual_volume_is_strictly_above_twice_median() {
        assert!(unusual_volume(Some(5000.0), Some(1000.0)));
        assert!(!unusual_volume(Some(2000.0), Some(1000.0)));
        assert!(!unusual_volume(None, Some(1000.0)));
    }

    #[test]
    fn compute_row_abc_example() {
        let mut rec = make_record("ABC", 15, 108.0, 5000.0);
        rec.high = Some(110.0);
        rec.low = Some(100.0);
        rec.foreign_buy = Some(300.0);
        rec.foreign_sell = Some(100.0);
        rec.bid_volume = Some(600.0);
        rec.offer_volume = Some(400.0);

        let row = compute_row(&rec, Some(1000.0));
        assert_approx(row.vwap.unwrap(), 106.0, DEFAULT_EPSILON);
        assert_approx(row.money_flow.unwrap(), 530_000.0, DEFAULT_EPSILON);
        assert_eq!(row.signal, Signal::Akumulasi);
        assert_eq!(row.foreign_flow, ForeignFlow::Inflow);
        assert_eq!(row.final_signal, FinalSignal::Akumulasi);
        assert!(row.unusual_volume);
    }
}
