//! Source ingestion: enumeration, reading, date normalization and merge

pub mod dates;
pub mod enumerate;
pub mod local;
pub mod merge;
pub mod provider;
pub mod reader;
pub mod retry;
pub mod sector;

pub use dates::{DateNormalizer, DateStrategy};
pub use enumerate::{enumerate_sources, Completeness, Enumeration};
pub use local::{local_document, CsvSheetSource, DirectoryCatalog};
pub use merge::{coerce_numeric, coerce_row, merge_sources, MergeReport, MergedTable};
pub use provider::{
    ArtifactSink, CatalogPage, LogProgress, NoProgress, ReadProgress, SheetSource,
    SnapshotSource, SourceCatalog, SourceError,
};
pub use reader::{ReadOutcome, SheetReader, SourceRead};
pub use retry::{Exhausted, RetryPolicy};
pub use sector::{join_sectors, SectorReference};
