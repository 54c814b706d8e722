//! MoneyFlow Runner — pipeline orchestration, configuration, ranking views.
//!
//! This crate builds on `moneyflow-core` to provide:
//! - TOML pipeline configuration with validation
//! - The staged batch run with partial-enumeration policy and a run report
//! - Ranking views (top picks, alerts, daily summary, stock history)
//! - The read-side snapshot cache used by viewers

pub mod config;
pub mod pipeline;
pub mod ranking;
pub mod report;
pub mod snapshot;

pub use config::{ConfigError, PartialPolicy, PipelineConfig, PublishTarget};
pub use pipeline::{Backends, Pipeline, PipelineError, PipelineRun};
pub use ranking::{
    alerts, daily_summary, export_top_picks_csv, latest_date, stock_codes, stock_history,
    top_picks, DailySummary, HistoryPoint,
};
pub use report::{generate_report, save_report, RunReport, SourceSummary, SCHEMA_VERSION};
pub use snapshot::{Snapshot, SnapshotCache, SnapshotError};
