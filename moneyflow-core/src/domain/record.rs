//! DailyRecord, the canonical per-stock per-day unit, and the derived
//! indicator blocks attached to it by later stages.

use super::signal::{FinalSignal, FlowDirection, ForeignFlow, MfiSignal, Signal};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Input column names.
pub mod columns {
    pub const STOCK_CODE: &str = "Stock Code";
    pub const DATE: &str = "Last Trading Date";
    pub const HIGH: &str = "High";
    pub const LOW: &str = "Low";
    pub const CLOSE: &str = "Close";
    pub const VOLUME: &str = "Volume";
    pub const FOREIGN_BUY: &str = "Foreign Buy";
    pub const FOREIGN_SELL: &str = "Foreign Sell";
    pub const BID_VOLUME: &str = "Bid Volume";
    pub const OFFER_VOLUME: &str = "Offer Volume";
    pub const PREVIOUS: &str = "Previous";
    pub const CHANGE: &str = "Change";
    pub const SOURCE_FILE: &str = "Source File";
    pub const SECTOR: &str = "Sector";

    pub const VWAP: &str = "VWAP";
    pub const WEEK: &str = "Week";
    pub const SIGNAL: &str = "Signal";
    pub const MONEY_FLOW: &str = "Money Flow";
    pub const PREV_VWAP: &str = "Prev VWAP";
    pub const FLOW_DIRECTION: &str = "Flow Direction";
    pub const POSITIVE_FLOW: &str = "Positive Flow";
    pub const NEGATIVE_FLOW: &str = "Negative Flow";
    pub const POS_FLOW_14: &str = "PosFlow14";
    pub const NEG_FLOW_14: &str = "NegFlow14";
    pub const MFI14: &str = "MFI14";
    pub const MFI_SIGNAL: &str = "MFI Signal";
    pub const FOREIGN_FLOW: &str = "Foreign Flow";
    pub const BID_OFFER_IMBALANCE: &str = "Bid/Offer Imbalance";
    pub const FINAL_SIGNAL: &str = "Final Signal";
    pub const UNUSUAL_VOLUME: &str = "Unusual Volume";
    pub const AVG_VOLUME_5D: &str = "Avg Volume 5D";
    pub const VOLUME_CHANGE_POSITIVE: &str = "Volume Change Positive";
    pub const SCORE: &str = "Score";

    /// Columns written by the pipeline itself. Input columns with these
    /// names are not passed through.
    pub const DERIVED: [&str; 21] = [
        VWAP,
        WEEK,
        SIGNAL,
        MONEY_FLOW,
        PREV_VWAP,
        FLOW_DIRECTION,
        POSITIVE_FLOW,
        NEGATIVE_FLOW,
        POS_FLOW_14,
        NEG_FLOW_14,
        MFI14,
        MFI_SIGNAL,
        FOREIGN_FLOW,
        BID_OFFER_IMBALANCE,
        FINAL_SIGNAL,
        UNUSUAL_VOLUME,
        AVG_VOLUME_5D,
        VOLUME_CHANGE_POSITIVE,
        SCORE,
        SECTOR,
        SOURCE_FILE,
    ];
}

/// Declared numeric columns, coerced string → number during merge.
pub const NUMERIC_COLUMNS: [&str; 10] = [
    columns::HIGH,
    columns::LOW,
    columns::CLOSE,
    columns::VOLUME,
    columns::FOREIGN_BUY,
    columns::FOREIGN_SELL,
    columns::BID_VOLUME,
    columns::OFFER_VOLUME,
    columns::PREVIOUS,
    columns::CHANGE,
];

/// Share-count columns. Negative values are invalid and coerce to missing.
pub const VOLUME_COLUMNS: [&str; 5] = [
    columns::VOLUME,
    columns::FOREIGN_BUY,
    columns::FOREIGN_SELL,
    columns::BID_VOLUME,
    columns::OFFER_VOLUME,
];

/// One stock on one trading day, as merged from the sources.
///
/// `date` is `None` only when every normalization strategy failed; such rows
/// are kept but excluded from ordered (lag/rolling) computations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub stock_code: String,
    pub date: Option<NaiveDate>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
    pub foreign_buy: Option<f64>,
    pub foreign_sell: Option<f64>,
    pub bid_volume: Option<f64>,
    pub offer_volume: Option<f64>,
    pub previous: Option<f64>,
    /// Close minus previous close; read from the source when present.
    pub change: Option<f64>,
    /// Non-declared input columns (e.g. company name), in source order.
    pub extras: Vec<(String, String)>,
    pub source_file: String,
}

impl DailyRecord {
    /// Record with only identity fields set.
    pub fn new(stock_code: impl Into<String>, date: Option<NaiveDate>, source_file: impl Into<String>) -> Self {
        Self {
            stock_code: stock_code.into(),
            date,
            high: None,
            low: None,
            close: None,
            volume: None,
            foreign_buy: None,
            foreign_sell: None,
            bid_volume: None,
            offer_volume: None,
            previous: None,
            change: None,
            extras: Vec::new(),
            source_file: source_file.into(),
        }
    }

    pub fn extra(&self, column: &str) -> Option<&str> {
        self.extras
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v.as_str())
    }
}

/// Indicators that depend on a single record (plus the run-wide median volume).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowIndicators {
    pub vwap: Option<f64>,
    pub money_flow: Option<f64>,
    pub signal: Signal,
    pub foreign_flow: ForeignFlow,
    pub bid_offer_imbalance: f64,
    pub final_signal: FinalSignal,
    pub unusual_volume: bool,
}

/// Indicators that depend on the record's position inside its stock group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupIndicators {
    pub week: Option<String>,
    pub prev_vwap: Option<f64>,
    pub flow_direction: FlowDirection,
    pub positive_flow: Option<f64>,
    pub negative_flow: Option<f64>,
    pub pos_flow_14: Option<f64>,
    pub neg_flow_14: Option<f64>,
    pub mfi14: Option<f64>,
    pub mfi_signal: MfiSignal,
    pub avg_volume_5d: Option<f64>,
    /// 1 when the stock's latest week out-traded the week before it.
    /// Broadcast to every row of the stock.
    pub weekly_volume_change_positive: u8,
}

impl GroupIndicators {
    /// Group fields for a row that cannot be placed in date order.
    pub fn undated() -> Self {
        Self {
            week: None,
            prev_vwap: None,
            flow_direction: FlowDirection::Neutral,
            positive_flow: None,
            negative_flow: None,
            pos_flow_14: None,
            neg_flow_14: None,
            mfi14: None,
            mfi_signal: MfiSignal::Normal,
            avg_volume_5d: None,
            weekly_volume_change_positive: 0,
        }
    }
}

/// A record with every indicator and its composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub record: DailyRecord,
    pub row: RowIndicators,
    pub group: GroupIndicators,
    pub score: u8,
}

impl EnrichedRecord {
    pub fn with_sector(self, sector: impl Into<String>) -> OutputRecord {
        OutputRecord {
            record: self.record,
            row: self.row,
            group: self.group,
            score: self.score,
            sector: sector.into(),
        }
    }
}

/// Final published unit: an enriched record with its sector label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub record: DailyRecord,
    pub row: RowIndicators,
    pub group: GroupIndicators,
    pub score: u8,
    pub sector: String,
}

impl OutputRecord {
    pub fn stock_code(&self) -> &str {
        &self.record.stock_code
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.record.date
    }
}
