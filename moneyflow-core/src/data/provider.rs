//! Backend traits and structured error types.
//!
//! The catalog, sheet and sink traits abstract over the spreadsheet and
//! object-storage services so the pipeline can run against a local directory,
//! an HTTP endpoint, or an in-memory fake in tests. Transport details live in
//! the implementations; retry policy lives above them.

use crate::domain::SourceDocument;
use std::path::Path;
use thiserror::Error;

/// Transport-level failure of an external source or sink.
///
/// These are the "transient IO" errors the reader and publisher retry.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by service")]
    RateLimited,

    #[error("document not found: {id}")]
    NotFound { id: String },

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("source error: {0}")]
    Other(String),
}

/// One page of a collection listing.
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    pub documents: Vec<SourceDocument>,
    /// Token for the following page; `None` on the last page.
    pub next_page_token: Option<String>,
}

/// Lists the tabular documents inside a collection, one page at a time.
pub trait SourceCatalog {
    /// Human-readable name of this catalog.
    fn name(&self) -> &str;

    fn list_page(
        &self,
        collection: &str,
        page_token: Option<&str>,
    ) -> Result<CatalogPage, SourceError>;
}

/// Fetches the full rectangular cell range of one document.
///
/// The first row is the header. Rows may be ragged.
pub trait SheetSource {
    fn name(&self) -> &str;

    fn fetch_values(&self, document: &SourceDocument) -> Result<Vec<Vec<String>>, SourceError>;
}

/// Durable destination for the published artifact. Each write fully
/// replaces the previous artifact.
pub trait ArtifactSink {
    fn name(&self) -> &str;

    fn write(&self, bytes: &[u8]) -> Result<(), SourceError>;

    /// Local path the artifact lands at, when the sink writes to disk.
    fn local_path(&self) -> Option<&Path> {
        None
    }
}

/// Read side of the published artifact, used by downstream viewers.
pub trait SnapshotSource {
    fn name(&self) -> &str;

    fn fetch(&self) -> Result<Vec<u8>, SourceError>;
}

impl<T: SnapshotSource + ?Sized> SnapshotSource for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self) -> Result<Vec<u8>, SourceError> {
        (**self).fetch()
    }
}

/// Progress callback for the sequential per-source read stage.
pub trait ReadProgress {
    /// Called before a document is read.
    fn on_start(&self, document: &SourceDocument, index: usize, total: usize);

    /// Called after a document read settles (rows, empty, or exhausted).
    fn on_complete(&self, document: &SourceDocument, index: usize, total: usize, rows: Option<usize>);

    /// Called when all documents have been visited.
    fn on_batch_complete(&self, read: usize, skipped: usize, total: usize);
}

/// Progress reporter that forwards to `tracing`.
pub struct LogProgress;

impl ReadProgress for LogProgress {
    fn on_start(&self, document: &SourceDocument, index: usize, total: usize) {
        tracing::debug!(document = %document.name, "[{}/{}] reading", index + 1, total);
    }

    fn on_complete(&self, document: &SourceDocument, _index: usize, _total: usize, rows: Option<usize>) {
        match rows {
            Some(n) => tracing::info!(document = %document.name, rows = n, "read"),
            None => tracing::warn!(document = %document.name, "skipped"),
        }
    }

    fn on_batch_complete(&self, read: usize, skipped: usize, total: usize) {
        tracing::info!(read, skipped, total, "read stage complete");
    }
}

/// Progress reporter that does nothing.
pub struct NoProgress;

impl ReadProgress for NoProgress {
    fn on_start(&self, _: &SourceDocument, _: usize, _: usize) {}
    fn on_complete(&self, _: &SourceDocument, _: usize, _: usize, _: Option<usize>) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize) {}
}
