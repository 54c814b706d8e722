//! Run report: JSON and Markdown summaries of a pipeline run.
//!
//! The report records what each stage saw: enumeration completeness, the
//! per-source read outcome, merge counters, the run-wide median volume, and
//! the publish outcome with the artifact's content hash. The JSON form
//! carries a `schema_version`; unknown versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use moneyflow_core::data::{Completeness, MergeReport, ReadOutcome, SourceRead};
use moneyflow_core::publish::PublishOutcome;
use serde::{Deserialize, Serialize};

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Read outcome of one source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub name: String,
    pub outcome: String,
    pub rows: Option<usize>,
    pub attempts: Option<u32>,
    pub error: Option<String>,
}

impl SourceSummary {
    pub fn from_read(read: &SourceRead) -> Self {
        let (attempts, error) = match &read.outcome {
            ReadOutcome::RetryExhausted { attempts, error } => (Some(*attempts), Some(error.clone())),
            _ => (None, None),
        };
        Self {
            name: read.document.name.clone(),
            outcome: read.outcome.label().to_string(),
            rows: read.outcome.row_count(),
            attempts,
            error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub started_at: String,
    pub finished_at: String,
    pub collection: String,
    pub enumeration: Completeness,
    pub documents: usize,
    pub sources: Vec<SourceSummary>,
    pub merge: MergeReport,
    pub median_volume: Option<f64>,
    pub stocks: usize,
    pub rows_published: usize,
    pub sector_entries: usize,
    /// Rows whose stock code had no sector entry.
    pub unmatched_sectors: usize,
    pub latest_date: Option<NaiveDate>,
    pub publish: PublishOutcome,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl RunReport {
    /// True when the artifact was published.
    pub fn is_success(&self) -> bool {
        self.publish.is_success()
    }

    pub fn is_partial_enumeration(&self) -> bool {
        matches!(self.enumeration, Completeness::Partial { .. })
    }

    pub fn sources_skipped(&self) -> usize {
        self.sources.iter().filter(|s| s.rows.is_none()).count()
    }
}

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize RunReport to JSON")
}

pub fn import_json(json: &str) -> Result<RunReport> {
    let report: RunReport =
        serde_json::from_str(json).context("failed to deserialize RunReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── Markdown ───────────────────────────────────────────────────────

pub fn generate_report(report: &RunReport) -> String {
    let mut md = String::new();

    md.push_str("# Pipeline Run Report\n\n");

    md.push_str("## Run\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Started | {} |\n", report.started_at));
    md.push_str(&format!("| Finished | {} |\n", report.finished_at));
    let collection = if report.collection.is_empty() {
        "(root)"
    } else {
        report.collection.as_str()
    };
    md.push_str(&format!("| Collection | {collection} |\n"));
    match &report.enumeration {
        Completeness::Complete => md.push_str("| Enumeration | complete |\n"),
        Completeness::Partial {
            pages_fetched,
            error,
        } => md.push_str(&format!(
            "| Enumeration | **PARTIAL** after {pages_fetched} page(s): {error} |\n"
        )),
    }
    md.push_str(&format!("| Documents | {} |\n", report.documents));
    md.push_str(&format!(
        "| Latest date | {} |\n",
        report
            .latest_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".into())
    ));
    md.push('\n');

    md.push_str("## Merge\n\n");
    md.push_str("| Counter | Value |\n");
    md.push_str("| --- | --- |\n");
    let m = &report.merge;
    for (name, value) in [
        ("Sources with rows", m.sources_with_rows),
        ("Sources empty", m.sources_empty),
        ("Sources exhausted", m.sources_exhausted),
        ("Rows in", m.rows_in),
        ("Rows merged", m.rows_merged),
        ("Rows without stock code", m.rows_without_stock_code),
        ("Cells coerced to missing", m.coerced_to_missing),
        ("Undated rows", m.undated_rows),
    ] {
        md.push_str(&format!("| {name} | {value} |\n"));
    }
    for (strategy, count) in &m.date_strategies {
        md.push_str(&format!("| Dates via {strategy} | {count} |\n"));
    }
    md.push('\n');

    md.push_str("## Indicators\n\n");
    md.push_str(&format!(
        "- Median volume (all stocks, all dates): {}\n",
        report
            .median_volume
            .map(|v| format!("{v:.0}"))
            .unwrap_or_else(|| "-".into())
    ));
    md.push_str(&format!("- Stocks: {}\n", report.stocks));
    md.push_str(&format!(
        "- Sector entries: {} ({} rows defaulted to Others)\n\n",
        report.sector_entries, report.unmatched_sectors
    ));

    let skipped: Vec<&SourceSummary> = report.sources.iter().filter(|s| s.rows.is_none()).collect();
    if !skipped.is_empty() {
        md.push_str("## Skipped Sources\n\n");
        md.push_str("| Document | Outcome | Detail |\n");
        md.push_str("| --- | --- | --- |\n");
        for s in skipped {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                s.name,
                s.outcome,
                s.error.as_deref().unwrap_or("")
            ));
        }
        md.push('\n');
    }

    md.push_str("## Publish\n\n");
    match &report.publish {
        PublishOutcome::Published {
            attempts,
            bytes,
            content_hash,
        } => {
            md.push_str(&format!(
                "Published {} rows ({bytes} bytes) in {attempts} attempt(s).\n\n",
                report.rows_published
            ));
            md.push_str(&format!("Content hash (blake3): `{content_hash}`\n"));
        }
        PublishOutcome::Failed { attempts, error } => {
            md.push_str(&format!(
                "**FAILED** after {attempts} attempt(s): {error}\n"
            ));
        }
    }

    md
}

// ─── Bundle ─────────────────────────────────────────────────────────

/// Write `report.json` and `report.md` under `output_dir`.
///
/// Returns the path of the JSON file.
pub fn save_report(report: &RunReport, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create report dir: {}", output_dir.display()))?;

    let json_path = output_dir.join("report.json");
    std::fs::write(&json_path, export_json(report)?)
        .with_context(|| format!("failed to write {}", json_path.display()))?;

    let md_path = output_dir.join("report.md");
    std::fs::write(&md_path, generate_report(report))
        .with_context(|| format!("failed to write {}", md_path.display()))?;

    Ok(json_path)
}

pub fn load_report(path: &Path) -> Result<RunReport> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
