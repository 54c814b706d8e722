//! MoneyFlow Core — domain types, source ingestion, indicators, publication.
//!
//! This crate contains the batch pipeline's stages as pure functions and
//! backend traits:
//! - Domain types (daily records, signal labels, indicator blocks)
//! - Source enumeration and retrying sheet reads
//! - Date normalization, numeric coercion and the merge
//! - Per-row and per-stock money-flow indicators and the composite score
//! - Sector join, artifact serialization and the retrying publisher

pub mod data;
pub mod domain;
pub mod indicators;
pub mod publish;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: all stage outputs are Send + Sync so the runner
    /// can hand them across threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::DailyRecord>();
        require_sync::<domain::DailyRecord>();
        require_send::<domain::EnrichedRecord>();
        require_sync::<domain::EnrichedRecord>();
        require_send::<domain::OutputRecord>();
        require_sync::<domain::OutputRecord>();
        require_send::<domain::RawRow>();
        require_sync::<domain::RawRow>();

        require_send::<data::Enumeration>();
        require_sync::<data::Enumeration>();
        require_send::<data::ReadOutcome>();
        require_sync::<data::ReadOutcome>();
        require_send::<data::MergedTable>();
        require_sync::<data::MergedTable>();
        require_send::<data::SectorReference>();
        require_sync::<data::SectorReference>();
        require_send::<data::SourceError>();
        require_sync::<data::SourceError>();

        require_send::<indicators::IndicatorRun>();
        require_sync::<indicators::IndicatorRun>();
        require_send::<publish::PublishOutcome>();
        require_sync::<publish::PublishOutcome>();
        require_send::<publish::FileSink>();
        require_sync::<publish::FileSink>();
    }
}
