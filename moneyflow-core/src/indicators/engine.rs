//! IndicatorEngine: the per-row pass followed by per-stock grouped passes.
//!
//! The run-wide median volume is computed once over every record in the run
//! (all stocks, all dates). Records are then stably sorted by stock code and
//! date, with undated rows placed after the dated ones of their stock. Each
//! stock's dated rows are folded in order for lagged and rolling fields; its
//! undated rows get neutral group fields.

use super::flow::flow_series;
use super::rolling::{median, rolling_mean};
use super::row::compute_row;
use super::score::score;
use super::weekly::{volume_change_positive, week_key, weekly_volumes};
use crate::domain::{DailyRecord, EnrichedRecord, GroupIndicators, RowIndicators};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Window sizes for the grouped indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub mfi_window: usize,
    pub avg_volume_window: usize,
    /// Present volumes required before the rolling average is defined.
    pub avg_volume_min_periods: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            mfi_window: 14,
            avg_volume_window: 5,
            avg_volume_min_periods: 5,
        }
    }
}

/// Result of an engine run.
#[derive(Debug, Clone, Default)]
pub struct IndicatorRun {
    pub records: Vec<EnrichedRecord>,
    pub median_volume: Option<f64>,
    pub stocks: usize,
}

#[derive(Debug, Clone, Default)]
pub struct IndicatorEngine {
    config: IndicatorConfig,
}

/// Stock code, then date ascending with undated rows last.
pub fn record_order(a: &DailyRecord, b: &DailyRecord) -> Ordering {
    a.stock_code
        .cmp(&b.stock_code)
        .then_with(|| match (a.date, b.date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

/// Median of every present volume in `records`.
pub fn median_volume(records: &[DailyRecord]) -> Option<f64> {
    median(records.iter().filter_map(|r| r.volume))
}

impl IndicatorEngine {
    pub fn new(config: IndicatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    pub fn run(&self, mut records: Vec<DailyRecord>) -> IndicatorRun {
        let median_volume = median_volume(&records);
        records.sort_by(record_order);

        let rows: Vec<RowIndicators> = records
            .iter()
            .map(|r| compute_row(r, median_volume))
            .collect();

        let mut groups: Vec<GroupIndicators> = Vec::with_capacity(records.len());
        let mut stocks = 0usize;
        let mut start = 0usize;
        while start < records.len() {
            let code = &records[start].stock_code;
            let end = records[start..]
                .iter()
                .position(|r| &r.stock_code != code)
                .map_or(records.len(), |offset| start + offset);
            groups.extend(self.group_pass(&records[start..end], &rows[start..end]));
            stocks += 1;
            start = end;
        }

        let enriched: Vec<EnrichedRecord> = records
            .into_iter()
            .zip(rows)
            .zip(groups)
            .map(|((record, row), group)| {
                let score = score(&record, &row, &group);
                EnrichedRecord {
                    record,
                    row,
                    group,
                    score,
                }
            })
            .collect();

        tracing::info!(
            rows = enriched.len(),
            stocks,
            median_volume = ?median_volume,
            "computed indicators"
        );

        IndicatorRun {
            records: enriched,
            median_volume,
            stocks,
        }
    }

    /// Grouped fields for one stock. `records` is sorted, dated rows first.
    fn group_pass(&self, records: &[DailyRecord], rows: &[RowIndicators]) -> Vec<GroupIndicators> {
        let dated = records.iter().take_while(|r| r.date.is_some()).count();
        let dated_records = &records[..dated];

        let vwap: Vec<Option<f64>> = rows[..dated].iter().map(|r| r.vwap).collect();
        let money_flow: Vec<Option<f64>> = rows[..dated].iter().map(|r| r.money_flow).collect();
        let volume: Vec<Option<f64>> = dated_records.iter().map(|r| r.volume).collect();

        let flows = flow_series(&vwap, &money_flow, self.config.mfi_window);
        let avg_volume = rolling_mean(
            &volume,
            self.config.avg_volume_window,
            self.config.avg_volume_min_periods,
        );

        let weeks: Vec<String> = dated_records
            .iter()
            .filter_map(|r| r.date.map(week_key))
            .collect();
        let buckets = weekly_volumes(
            dated_records
                .iter()
                .filter_map(|r| r.date.map(|d| (d, r.volume))),
        );
        let change = weeks
            .last()
            .map_or(0, |latest| volume_change_positive(&buckets, latest));

        let mut out: Vec<GroupIndicators> = (0..dated)
            .map(|i| GroupIndicators {
                week: Some(weeks[i].clone()),
                prev_vwap: flows.prev_vwap[i],
                flow_direction: flows.direction[i],
                positive_flow: flows.positive[i],
                negative_flow: flows.negative[i],
                pos_flow_14: flows.pos_window[i],
                neg_flow_14: flows.neg_window[i],
                mfi14: flows.mfi[i],
                mfi_signal: flows.signal[i],
                avg_volume_5d: avg_volume[i],
                weekly_volume_change_positive: change,
            })
            .collect();

        out.extend((dated..records.len()).map(|_| GroupIndicators {
            weekly_volume_change_positive: change,
            ..GroupIndicators::undated()
        }));
        out
    }
}
