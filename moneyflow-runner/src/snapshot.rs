//! Read-side snapshot cache for downstream viewers.
//!
//! The published artifact is fetched and parsed once, then served from
//! memory until the TTL runs out. Every caller inside that window gets the
//! same `Arc<Snapshot>`. `invalidate` drops the cached copy so the next read
//! refetches.

use moneyflow_core::data::{SnapshotSource, SourceError};
use moneyflow_core::domain::OutputRecord;
use moneyflow_core::publish::{content_hash, read_artifact, ArtifactError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to fetch snapshot: {0}")]
    Fetch(#[from] SourceError),

    #[error("failed to parse snapshot: {0}")]
    Parse(#[from] ArtifactError),
}

/// One parsed copy of the published artifact.
#[derive(Debug)]
pub struct Snapshot {
    pub records: Vec<OutputRecord>,
    pub content_hash: String,
    pub fetched_at: Instant,
}

pub struct SnapshotCache<S> {
    source: S,
    ttl: Duration,
    cached: Mutex<Option<Arc<Snapshot>>>,
}

impl<S: SnapshotSource> SnapshotCache<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            cached: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached snapshot, fetching when empty or expired.
    pub fn get(&self) -> Result<Arc<Snapshot>, SnapshotError> {
        self.get_at(Instant::now())
    }

    /// Drop the cached snapshot and fetch a fresh one.
    pub fn refresh(&self) -> Result<Arc<Snapshot>, SnapshotError> {
        self.invalidate();
        self.get()
    }

    pub fn invalidate(&self) {
        let mut guard = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        if guard.take().is_some() {
            tracing::info!(source = self.source.name(), "snapshot invalidated");
        }
    }

    pub fn is_cached(&self) -> bool {
        self.cached
            .lock()
            .map(|g| g.is_some())
            .unwrap_or(false)
    }

    fn get_at(&self, now: Instant) -> Result<Arc<Snapshot>, SnapshotError> {
        let mut guard = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(snapshot) = guard.as_ref() {
            if now.saturating_duration_since(snapshot.fetched_at) < self.ttl {
                return Ok(Arc::clone(snapshot));
            }
            tracing::debug!(source = self.source.name(), "snapshot expired");
        }

        let bytes = self.source.fetch()?;
        let snapshot = Arc::new(Snapshot {
            records: read_artifact(&bytes)?,
            content_hash: content_hash(&bytes),
            fetched_at: now,
        });
        tracing::info!(
            source = self.source.name(),
            rows = snapshot.records.len(),
            hash = %snapshot.content_hash,
            "snapshot loaded"
        );
        *guard = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }
}
