//! Row coercion and the full-table merge.
//!
//! Every raw row with a stock code becomes a `DailyRecord`. Declared numeric
//! columns that do not parse become missing values, as do negative share
//! counts; dates go through the
//! `DateNormalizer`. Nothing is rejected for data quality, and duplicate
//! `(stock, date)` pairs are kept as they arrive.

use super::dates::{DateNormalizer, DateStrategy};
use super::reader::{ReadOutcome, SourceRead};
use crate::domain::record::columns;
use crate::domain::{DailyRecord, RawRow, NUMERIC_COLUMNS, VOLUME_COLUMNS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counters describing what the merge saw.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeReport {
    pub sources_with_rows: usize,
    pub sources_empty: usize,
    pub sources_exhausted: usize,
    pub rows_in: usize,
    pub rows_merged: usize,
    pub rows_without_stock_code: usize,
    /// Non-empty numeric cells that failed to parse.
    pub coerced_to_missing: usize,
    pub undated_rows: usize,
    pub date_strategies: BTreeMap<String, usize>,
}

/// All merged records, in source order then row order.
#[derive(Debug, Clone, Default)]
pub struct MergedTable {
    pub records: Vec<DailyRecord>,
    pub report: MergeReport,
}

/// Parse a numeric cell. Blank, unparseable and non-finite values are `None`.
pub fn coerce_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Outcome of coercing a single raw row.
#[derive(Debug, Clone)]
pub struct CoercedRow {
    pub record: DailyRecord,
    pub coerced_to_missing: usize,
    pub date_strategy: Option<DateStrategy>,
}

fn is_declared(column: &str) -> bool {
    column == columns::STOCK_CODE
        || column == columns::DATE
        || NUMERIC_COLUMNS.contains(&column)
        || columns::DERIVED.contains(&column)
}

/// Coerce a raw row into a record. Returns `None` when the stock code is blank.
pub fn coerce_row(row: &RawRow) -> Option<CoercedRow> {
    let stock_code = row.get(columns::STOCK_CODE)?.trim();
    if stock_code.is_empty() {
        return None;
    }

    let raw_date = row.get(columns::DATE).unwrap_or("");
    let resolved = DateNormalizer::resolve(raw_date, &row.source_file);

    let mut record = DailyRecord::new(stock_code, resolved.map(|(d, _)| d), row.source_file.clone());
    let mut coerced_to_missing = 0;

    for column in NUMERIC_COLUMNS {
        let Some(raw) = row.get(column) else {
            continue;
        };
        let value = coerce_numeric(raw).filter(|v| *v >= 0.0 || !VOLUME_COLUMNS.contains(&column));
        if value.is_none() && !raw.trim().is_empty() {
            coerced_to_missing += 1;
        }
        let slot = match column {
            columns::HIGH => &mut record.high,
            columns::LOW => &mut record.low,
            columns::CLOSE => &mut record.close,
            columns::VOLUME => &mut record.volume,
            columns::FOREIGN_BUY => &mut record.foreign_buy,
            columns::FOREIGN_SELL => &mut record.foreign_sell,
            columns::BID_VOLUME => &mut record.bid_volume,
            columns::OFFER_VOLUME => &mut record.offer_volume,
            columns::PREVIOUS => &mut record.previous,
            columns::CHANGE => &mut record.change,
            _ => continue,
        };
        *slot = value;
    }

    if record.change.is_none() {
        record.change = match (record.close, record.previous) {
            (Some(close), Some(prev)) => Some(close - prev),
            _ => None,
        };
    }

    record.extras = row
        .cells
        .iter()
        .filter(|(name, _)| !name.is_empty() && !is_declared(name))
        .cloned()
        .collect();

    Some(CoercedRow {
        record,
        coerced_to_missing,
        date_strategy: resolved.map(|(_, s)| s),
    })
}

/// Union rows from every source into one table.
pub fn merge_sources(reads: &[SourceRead]) -> MergedTable {
    let mut report = MergeReport::default();
    let mut records = Vec::new();

    for read in reads {
        let rows = match &read.outcome {
            ReadOutcome::Rows(rows) => {
                report.sources_with_rows += 1;
                rows
            }
            ReadOutcome::Empty => {
                report.sources_empty += 1;
                continue;
            }
            ReadOutcome::RetryExhausted { .. } => {
                report.sources_exhausted += 1;
                continue;
            }
        };

        for row in rows {
            report.rows_in += 1;
            match coerce_row(row) {
                Some(coerced) => {
                    report.coerced_to_missing += coerced.coerced_to_missing;
                    match coerced.date_strategy {
                        Some(s) => {
                            *report
                                .date_strategies
                                .entry(strategy_key(s).to_string())
                                .or_default() += 1;
                        }
                        None => report.undated_rows += 1,
                    }
                    records.push(coerced.record);
                }
                None => report.rows_without_stock_code += 1,
            }
        }
    }

    report.rows_merged = records.len();
    tracing::info!(
        rows = report.rows_merged,
        coerced_to_missing = report.coerced_to_missing,
        undated = report.undated_rows,
        without_code = report.rows_without_stock_code,
        "merged sources"
    );

    MergedTable { records, report }
}

fn strategy_key(s: DateStrategy) -> &'static str {
    match s {
        DateStrategy::MonthToken => "month_token",
        DateStrategy::Generic => "generic",
        DateStrategy::SourceFileName => "source_file_name",
    }
}
