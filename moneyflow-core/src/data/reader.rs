//! Sheet reader: fetches one document's cell range with bounded retry.
//!
//! Three outcomes are kept apart: rows were read, the document legitimately
//! had no data rows, or every attempt failed. Callers may skip the last two
//! alike, but the distinction survives into the run report.

use super::provider::{ReadProgress, SheetSource};
use super::retry::RetryPolicy;
use crate::domain::{RawRow, SourceDocument};

/// Result of reading one document.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    Rows(Vec<RawRow>),
    Empty,
    RetryExhausted { attempts: u32, error: String },
}

impl ReadOutcome {
    pub fn row_count(&self) -> Option<usize> {
        match self {
            ReadOutcome::Rows(rows) => Some(rows.len()),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReadOutcome::Rows(_) => "rows",
            ReadOutcome::Empty => "empty",
            ReadOutcome::RetryExhausted { .. } => "retry_exhausted",
        }
    }
}

/// A document paired with what reading it produced.
#[derive(Debug, Clone)]
pub struct SourceRead {
    pub document: SourceDocument,
    pub outcome: ReadOutcome,
}

pub struct SheetReader<'a> {
    source: &'a dyn SheetSource,
    policy: RetryPolicy,
}

impl<'a> SheetReader<'a> {
    pub fn new(source: &'a dyn SheetSource, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    /// Read a single document. Never fails; see `ReadOutcome`.
    pub fn read(&self, document: &SourceDocument) -> ReadOutcome {
        let label = format!("{}:{}", self.source.name(), document.name);
        let fetched = self
            .policy
            .run(&label, |_| self.source.fetch_values(document));

        match fetched {
            Ok((values, attempts)) => {
                if attempts > 1 {
                    tracing::info!(document = %document.name, attempts, "read after retry");
                }
                rows_from_values(values, &document.name)
            }
            Err(exhausted) => {
                tracing::warn!(
                    document = %document.name,
                    attempts = exhausted.attempts,
                    error = %exhausted.last_error,
                    "giving up on document"
                );
                ReadOutcome::RetryExhausted {
                    attempts: exhausted.attempts,
                    error: exhausted.last_error.to_string(),
                }
            }
        }
    }

    /// Read documents one at a time, in order.
    pub fn read_all(
        &self,
        documents: &[SourceDocument],
        progress: &dyn ReadProgress,
    ) -> Vec<SourceRead> {
        let total = documents.len();
        let mut reads = Vec::with_capacity(total);
        let mut read = 0;

        for (i, document) in documents.iter().enumerate() {
            progress.on_start(document, i, total);
            let outcome = self.read(document);
            progress.on_complete(document, i, total, outcome.row_count());
            if outcome.row_count().is_some() {
                read += 1;
            }
            reads.push(SourceRead {
                document: document.clone(),
                outcome,
            });
        }

        progress.on_batch_complete(read, total - read, total);
        reads
    }
}

/// Turn a raw cell range into rows: first row is the header, blank rows drop.
fn rows_from_values(values: Vec<Vec<String>>, source_file: &str) -> ReadOutcome {
    let mut iter = values.into_iter();
    let header = match iter.next() {
        Some(h) if h.iter().any(|c| !c.trim().is_empty()) => h,
        _ => return ReadOutcome::Empty,
    };

    let rows: Vec<RawRow> = iter
        .map(|values| RawRow::from_values(&header, &values, source_file))
        .filter(|row| !row.is_blank())
        .collect();

    if rows.is_empty() {
        ReadOutcome::Empty
    } else {
        ReadOutcome::Rows(rows)
    }
}
