//! Ranking views over a published dataset: top picks, alerts, the daily
//! summary, and one stock's history.
//!
//! Picks, alerts and the summary look only at rows on the latest trading
//! date present in the data.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use moneyflow_core::domain::{ForeignFlow, OutputRecord};
use moneyflow_core::publish::write_artifact;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Most recent date in the dataset.
pub fn latest_date(records: &[OutputRecord]) -> Option<NaiveDate> {
    records.iter().filter_map(|r| r.date()).max()
}

/// Rows on the latest date, in dataset order.
pub fn latest_rows(records: &[OutputRecord]) -> Vec<&OutputRecord> {
    let Some(latest) = latest_date(records) else {
        return Vec::new();
    };
    records.iter().filter(|r| r.date() == Some(latest)).collect()
}

/// Highest-scoring latest-date rows, one per stock, at most `n`.
///
/// Ties keep dataset order.
pub fn top_picks(records: &[OutputRecord], n: usize) -> Vec<&OutputRecord> {
    let mut rows = latest_rows(records);
    rows.sort_by(|a, b| b.score.cmp(&a.score));

    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|r| seen.insert(r.stock_code()))
        .take(n)
        .collect()
}

/// Latest-date rows with unusual volume and foreign inflow.
pub fn alerts(records: &[OutputRecord]) -> Vec<&OutputRecord> {
    latest_rows(records)
        .into_iter()
        .filter(|r| r.row.unusual_volume && r.row.foreign_flow == ForeignFlow::Inflow)
        .collect()
}

/// Market breadth on the latest date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_volume: f64,
    pub advancers: usize,
    pub decliners: usize,
    pub rows: usize,
}

pub fn daily_summary(records: &[OutputRecord]) -> Option<DailySummary> {
    let date = latest_date(records)?;
    let rows = latest_rows(records);
    Some(DailySummary {
        date,
        total_volume: rows.iter().filter_map(|r| r.record.volume).sum(),
        advancers: rows
            .iter()
            .filter(|r| matches!(r.record.change, Some(c) if c > 0.0))
            .count(),
        decliners: rows
            .iter()
            .filter(|r| matches!(r.record.change, Some(c) if c < 0.0))
            .count(),
        rows: rows.len(),
    })
}

/// One point of a stock's chart history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub close: Option<f64>,
    pub volume: Option<f64>,
    pub foreign_buy: Option<f64>,
    pub foreign_sell: Option<f64>,
    /// Volume not attributed to foreign buying.
    pub non_foreign: Option<f64>,
    pub money_flow: Option<f64>,
    pub mfi14: Option<f64>,
}

/// Dated rows of `stock_code` in date order, optionally limited to an
/// inclusive date range.
pub fn stock_history(
    records: &[OutputRecord],
    stock_code: &str,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Vec<HistoryPoint> {
    let mut points: Vec<HistoryPoint> = records
        .iter()
        .filter(|r| r.stock_code() == stock_code)
        .filter_map(|r| {
            let date = r.date()?;
            if let Some((from, to)) = range {
                if date < from || date > to {
                    return None;
                }
            }
            let rec = &r.record;
            Some(HistoryPoint {
                date,
                close: rec.close,
                volume: rec.volume,
                foreign_buy: rec.foreign_buy,
                foreign_sell: rec.foreign_sell,
                non_foreign: rec.volume.map(|v| v - rec.foreign_buy.unwrap_or(0.0)),
                money_flow: r.row.money_flow,
                mfi14: r.group.mfi14,
            })
        })
        .collect();
    points.sort_by_key(|p| p.date);
    points
}

/// Distinct stock codes in dataset order.
pub fn stock_codes(records: &[OutputRecord]) -> Vec<&str> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(|r| r.stock_code())
        .filter(|c| seen.insert(*c))
        .collect()
}

/// Top picks as a CSV download, in the artifact's column layout.
pub fn export_top_picks_csv(picks: &[&OutputRecord]) -> Result<String> {
    let owned: Vec<OutputRecord> = picks.iter().map(|r| (*r).clone()).collect();
    let bytes = write_artifact(&owned).context("failed to serialize top picks")?;
    String::from_utf8(bytes).context("top picks CSV is not UTF-8")
}
