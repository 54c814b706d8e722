//! Staged batch run:
//! `Enumerate → Read → Normalize/Coerce/Merge → Indicators → Join → Publish`.
//!
//! Each stage consumes the previous stage's output by value and hands a new
//! value to the next. The only fatal outcome is a publish that exhausts its
//! retries; it is reported through the run report rather than an `Err`.

use crate::config::{ConfigError, PartialPolicy, PipelineConfig, PublishTarget};
use crate::ranking::latest_date;
use crate::report::{RunReport, SourceSummary, SCHEMA_VERSION};
use moneyflow_core::data::{
    enumerate_sources, join_sectors, local_document, merge_sources, ArtifactSink, Completeness,
    CsvSheetSource, DirectoryCatalog, ReadProgress, SectorReference, SheetReader, SheetSource,
    SourceCatalog, SourceError,
};
use moneyflow_core::domain::{OutputRecord, SourceDocument};
use moneyflow_core::indicators::IndicatorEngine;
use moneyflow_core::publish::{ArtifactError, FileSink, HttpSink, Publisher};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("source listing incomplete after {pages_fetched} page(s): {error}")]
    PartialEnumeration { pages_fetched: usize, error: String },

    #[error("failed to serialize artifact: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("backend setup failed: {0}")]
    Backend(#[from] SourceError),

    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
}

/// The external services a run talks to.
pub struct Backends {
    pub catalog: Box<dyn SourceCatalog>,
    pub sheets: Box<dyn SheetSource>,
    /// Sector reference document, read through `sheets`.
    pub sector_document: Option<SourceDocument>,
    pub sink: Box<dyn ArtifactSink>,
}

impl Backends {
    /// Document ids that are pipeline inputs or outputs of their own and must
    /// not be merged as daily data: the sector table and a local artifact.
    fn reserved_ids(&self) -> Vec<String> {
        self.sector_document
            .iter()
            .map(|doc| doc.id.clone())
            .chain(self.sink.local_path().map(|p| p.display().to_string()))
            .collect()
    }

    /// Local directory of CSV exports, published to a file or HTTP target.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let target = config
            .publish_target()
            .ok_or_else(|| ConfigError::Invalid("no publish target".into()))?;
        let sink: Box<dyn ArtifactSink> = match target {
            PublishTarget::File(path) => Box::new(FileSink::new(path)),
            PublishTarget::Http(url) => Box::new(HttpSink::new(url)?),
        };
        Ok(Self {
            catalog: Box::new(DirectoryCatalog::new(
                &config.source.dir,
                &config.source.pattern,
                config.source.page_size,
            )),
            sheets: Box::new(CsvSheetSource),
            sector_document: config.sector.path.as_deref().map(local_document),
            sink,
        })
    }
}

/// Report plus the published dataset, for callers that render views
/// without re-reading the artifact.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub report: RunReport,
    pub records: Vec<OutputRecord>,
}

pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    pub fn run(
        &self,
        backends: &Backends,
        progress: &dyn ReadProgress,
    ) -> Result<PipelineRun, PipelineError> {
        let started_at = chrono::Utc::now();
        let collection = &self.config.source.collection;

        // Enumerate
        let enumeration = enumerate_sources(backends.catalog.as_ref(), collection);
        if let Completeness::Partial {
            pages_fetched,
            error,
        } = &enumeration.completeness
        {
            match self.config.on_partial_enumeration {
                PartialPolicy::Abort => {
                    tracing::error!(pages_fetched, %error, "aborting on partial enumeration");
                    return Err(PipelineError::PartialEnumeration {
                        pages_fetched: *pages_fetched,
                        error: error.clone(),
                    });
                }
                PartialPolicy::Proceed => {
                    tracing::warn!(
                        pages_fetched,
                        documents = enumeration.documents.len(),
                        %error,
                        "proceeding with partial enumeration"
                    );
                }
            }
        }

        let reserved = backends.reserved_ids();
        let mut documents = enumeration.documents;
        documents.retain(|doc| {
            let keep = !reserved.iter().any(|id| same_location(id, &doc.id));
            if !keep {
                tracing::info!(
                    document = %doc.id,
                    "skipping sector table or artifact in source listing"
                );
            }
            keep
        });

        // Read
        let reader = SheetReader::new(backends.sheets.as_ref(), self.config.read_policy());
        let reads = reader.read_all(&documents, progress);
        let sources: Vec<SourceSummary> = reads.iter().map(SourceSummary::from_read).collect();

        // Normalize, coerce, merge
        let merged = merge_sources(&reads);
        drop(reads);

        // Indicators
        let engine = IndicatorEngine::new(self.config.indicators.engine);
        let run = engine.run(merged.records);

        // Sector join
        let sectors = match &backends.sector_document {
            Some(doc) => SectorReference::load(backends.sheets.as_ref(), doc, self.config.read_policy()),
            None => {
                tracing::info!("no sector reference configured");
                SectorReference::empty()
            }
        };
        let output = join_sectors(run.records, &sectors);
        let unmatched_sectors = output
            .iter()
            .filter(|r| !sectors.contains(r.stock_code()))
            .count();

        // Publish
        let publisher = Publisher::new(backends.sink.as_ref(), self.config.publish_policy());
        let publish = publisher.publish(&output)?;

        let report = RunReport {
            schema_version: SCHEMA_VERSION,
            started_at: started_at.to_rfc3339(),
            finished_at: chrono::Utc::now().to_rfc3339(),
            collection: collection.clone(),
            enumeration: enumeration.completeness,
            documents: documents.len(),
            sources,
            merge: merged.report,
            median_volume: run.median_volume,
            stocks: run.stocks,
            rows_published: output.len(),
            sector_entries: sectors.len(),
            unmatched_sectors,
            latest_date: latest_date(&output),
            publish,
        };
        Ok(PipelineRun {
            report,
            records: output,
        })
    }
}

/// Equal ids, or ids naming the same existing file.
fn same_location(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    match (Path::new(a).canonicalize(), Path::new(b).canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
