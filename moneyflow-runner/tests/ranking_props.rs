//! Property tests for the ranking views.

use chrono::NaiveDate;
use moneyflow_core::domain::{
    DailyRecord, EnrichedRecord, FinalSignal, ForeignFlow, GroupIndicators, OutputRecord,
    RowIndicators, Signal,
};
use moneyflow_runner::{alerts, latest_date, top_picks};
use proptest::prelude::*;
use std::collections::HashSet;

fn record(code: u8, day: u32, score: u8, unusual: bool, inflow: bool) -> OutputRecord {
    let mut rec = DailyRecord::new(
        format!("S{code:02}"),
        NaiveDate::from_ymd_opt(2024, 3, day),
        "x.csv",
    );
    rec.volume = Some(1.0);
    EnrichedRecord {
        record: rec,
        row: RowIndicators {
            vwap: None,
            money_flow: None,
            signal: Signal::Netral,
            foreign_flow: if inflow {
                ForeignFlow::Inflow
            } else {
                ForeignFlow::Netral
            },
            bid_offer_imbalance: 0.0,
            final_signal: FinalSignal::Netral,
            unusual_volume: unusual,
        },
        group: GroupIndicators::undated(),
        score,
    }
    .with_sector("Others")
}

fn dataset() -> impl Strategy<Value = Vec<OutputRecord>> {
    prop::collection::vec(
        (0u8..12, 1u32..4, 0u8..=10, any::<bool>(), any::<bool>())
            .prop_map(|(c, d, s, u, i)| record(c, d, s, u, i)),
        0..60,
    )
}

proptest! {
    #[test]
    fn top_picks_are_unique_bounded_and_sorted(data in dataset(), n in 1usize..25) {
        let picks = top_picks(&data, n);
        prop_assert!(picks.len() <= n);

        let codes: HashSet<&str> = picks.iter().map(|r| r.stock_code()).collect();
        prop_assert_eq!(codes.len(), picks.len());

        for pair in picks.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }

        let latest = latest_date(&data);
        prop_assert!(picks.iter().all(|r| r.date() == latest));
    }

    #[test]
    fn each_pick_is_its_stocks_best_latest_row(data in dataset()) {
        let latest = latest_date(&data);
        for pick in top_picks(&data, usize::MAX) {
            let best = data
                .iter()
                .filter(|r| r.stock_code() == pick.stock_code() && r.date() == latest)
                .map(|r| r.score)
                .max();
            prop_assert_eq!(Some(pick.score), best);
        }
    }

    #[test]
    fn alerts_are_latest_unusual_inflow(data in dataset()) {
        let latest = latest_date(&data);
        for r in alerts(&data) {
            prop_assert!(r.row.unusual_volume);
            prop_assert_eq!(r.row.foreign_flow, ForeignFlow::Inflow);
            prop_assert_eq!(r.date(), latest);
        }
    }
}
