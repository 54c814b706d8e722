//! Composite score: a weighted count of independently satisfied bullish
//! conditions, bounded to `0..=10`.

use crate::domain::{DailyRecord, ForeignFlow, GroupIndicators, RowIndicators};
use serde::{Deserialize, Serialize};

pub const VOLUME_SURGE_RATIO: f64 = 1.5;
pub const STRONG_MFI: f64 = 70.0;
pub const MAX_SCORE: u8 = 10;

/// Which score conditions hold for a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreConditions {
    pub accumulation: bool,
    pub foreign_inflow: bool,
    pub volume_surge: bool,
    pub close_at_or_above_vwap: bool,
    pub weekly_volume_up: bool,
    pub unusual_volume: bool,
    pub strong_mfi: bool,
}

impl ScoreConditions {
    pub fn evaluate(record: &DailyRecord, row: &RowIndicators, group: &GroupIndicators) -> Self {
        let volume_surge = match (record.volume, group.avg_volume_5d) {
            (Some(v), Some(avg)) if avg != 0.0 => v / avg > VOLUME_SURGE_RATIO,
            _ => false,
        };
        let close_at_or_above_vwap = matches!((record.close, row.vwap), (Some(c), Some(v)) if c >= v);
        Self {
            accumulation: row.final_signal.is_accumulation(),
            foreign_inflow: row.foreign_flow == ForeignFlow::Inflow,
            volume_surge,
            close_at_or_above_vwap,
            weekly_volume_up: group.weekly_volume_change_positive == 1,
            unusual_volume: row.unusual_volume,
            strong_mfi: matches!(group.mfi14, Some(m) if m > STRONG_MFI),
        }
    }

    /// Weighted sum of the satisfied conditions.
    pub fn score(&self) -> u8 {
        let weighted: [(bool, u8); 7] = [
            (self.accumulation, 2),
            (self.foreign_inflow, 2),
            (self.volume_surge, 2),
            (self.close_at_or_above_vwap, 1),
            (self.weekly_volume_up, 1),
            (self.unusual_volume, 1),
            (self.strong_mfi, 1),
        ];
        weighted.iter().filter(|(hit, _)| *hit).map(|(_, w)| *w).sum()
    }
}

pub fn score(record: &DailyRecord, row: &RowIndicators, group: &GroupIndicators) -> u8 {
    ScoreConditions::evaluate(record, row, group).score()
}
