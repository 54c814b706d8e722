//! Domain types for the money-flow pipeline

pub mod record;
pub mod signal;
pub mod source;

pub use record::{
    DailyRecord, EnrichedRecord, GroupIndicators, OutputRecord, RowIndicators, NUMERIC_COLUMNS,
    VOLUME_COLUMNS,
};
pub use signal::{FinalSignal, FlowDirection, ForeignFlow, MfiSignal, ParseLabelError, Signal};
pub use source::{RawRow, SourceDocument};

/// Sector label used when a stock code has no reference entry.
pub const DEFAULT_SECTOR: &str = "Others";
