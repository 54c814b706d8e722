//! MoneyFlow CLI — run the aggregation pipeline and inspect its output.
//!
//! Commands:
//! - `run`: enumerate, read, merge, compute indicators and publish the artifact
//! - `rank`: top picks, alerts, daily summary or one stock's history from a
//!   published artifact
//! - `normalize-date`: show how a raw date cell would be normalized

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use moneyflow_core::data::{DateNormalizer, LogProgress, SnapshotSource};
use moneyflow_core::domain::OutputRecord;
use moneyflow_core::publish::{FileSnapshot, HttpSnapshot};
use moneyflow_runner::{
    alerts, daily_summary, export_top_picks_csv, save_report, stock_history, top_picks, Backends,
    PartialPolicy, Pipeline, PipelineConfig, PublishTarget, SnapshotCache,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "moneyflow",
    about = "MoneyFlow CLI — daily money-flow aggregation and ranking"
)]
struct Cli {
    /// Log filter (e.g. `debug`, `moneyflow_core=trace`). `RUST_LOG` wins when set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the batch pipeline and publish the merged dataset.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Root directory of the document collections.
        #[arg(long)]
        source_dir: Option<PathBuf>,

        /// Collection (sub-directory) holding the daily exports.
        #[arg(long)]
        collection: Option<String>,

        /// Sector reference table (`Stock Code`, `Sector`).
        #[arg(long)]
        sector: Option<PathBuf>,

        /// Publish location: a file path or an http(s) URL.
        #[arg(long)]
        publish: Option<String>,

        /// Abort when the source listing stops early.
        #[arg(long, default_value_t = false)]
        abort_on_partial: bool,

        /// Write report.json and report.md here.
        #[arg(long)]
        report_dir: Option<PathBuf>,
    },
    /// Ranking views over a published artifact.
    Rank {
        /// Artifact location (file path or URL). Defaults to the config's target.
        #[arg(long)]
        location: Option<String>,

        /// Config file used to resolve the location when `--location` is absent.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of top picks.
        #[arg(long)]
        top: Option<usize>,

        /// Show unusual-volume alerts with foreign inflow.
        #[arg(long, default_value_t = false)]
        alerts: bool,

        /// Show the latest date's market summary.
        #[arg(long, default_value_t = false)]
        summary: bool,

        /// Show one stock's history instead of the ranking.
        #[arg(long)]
        stock: Option<String>,

        /// History start (YYYY-MM-DD).
        #[arg(long, requires = "stock")]
        from: Option<String>,

        /// History end (YYYY-MM-DD).
        #[arg(long, requires = "stock")]
        to: Option<String>,

        /// Write the top picks to this CSV file.
        #[arg(long)]
        export: Option<PathBuf>,

        /// Print JSON instead of tables.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Normalize a raw date cell to YYYY-MM-DD.
    NormalizeDate {
        raw: String,

        /// Source file name used as the last-resort date.
        #[arg(long, default_value = "")]
        source_file: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Run {
            config,
            source_dir,
            collection,
            sector,
            publish,
            abort_on_partial,
            report_dir,
        } => {
            let mut cfg = load_config(config.as_ref())?;
            if let Some(dir) = source_dir {
                cfg.source.dir = dir;
            }
            if let Some(c) = collection {
                cfg.source.collection = c;
            }
            if let Some(path) = sector {
                cfg.sector.path = Some(path);
            }
            if let Some(location) = publish {
                match PublishTarget::parse(&location) {
                    PublishTarget::File(path) => {
                        cfg.publish.path = Some(path);
                        cfg.publish.url = None;
                    }
                    PublishTarget::Http(url) => cfg.publish.url = Some(url),
                }
            }
            if abort_on_partial {
                cfg.on_partial_enumeration = PartialPolicy::Abort;
            }
            run_pipeline(&cfg, report_dir)
        }
        Commands::Rank {
            location,
            config,
            top,
            alerts,
            summary,
            stock,
            from,
            to,
            export,
            json,
        } => {
            let cfg = load_config(config.as_ref())?;
            let target = match location {
                Some(loc) => PublishTarget::parse(&loc),
                None => cfg
                    .snapshot_target()
                    .context("no artifact location: pass --location or set publish.path")?,
            };
            let view = RankView {
                top: top.unwrap_or(cfg.indicators.top_n),
                alerts,
                summary,
                stock,
                range: parse_range(from.as_deref(), to.as_deref())?,
                export,
                json,
            };
            run_rank(&target, cfg.snapshot_ttl(), &view)
        }
        Commands::NormalizeDate { raw, source_file } => {
            match DateNormalizer::resolve(&raw, &source_file) {
                Some((date, strategy)) => println!("{date} ({strategy:?})"),
                None => {
                    eprintln!("could not normalize '{raw}'");
                    std::process::exit(1);
                }
            }
            Ok(())
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<PipelineConfig> {
    match path {
        Some(p) => PipelineConfig::from_file(p)
            .with_context(|| format!("failed to load config {}", p.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn run_pipeline(cfg: &PipelineConfig, report_dir: Option<PathBuf>) -> Result<()> {
    let backends = Backends::from_config(cfg)?;
    if let Some(target) = cfg.publish_target() {
        tracing::info!(source = %cfg.source.dir.display(), %target, "starting run");
    }
    let run = Pipeline::new(cfg).run(&backends, &LogProgress)?;
    let report = &run.report;

    println!();
    println!("=== Pipeline Run ===");
    println!("Documents:      {}", report.documents);
    if report.is_partial_enumeration() {
        println!("WARNING: source listing was incomplete");
    }
    println!(
        "Sources:        {} read, {} skipped",
        report.merge.sources_with_rows,
        report.sources_skipped()
    );
    println!("Rows:           {}", report.rows_published);
    println!("Stocks:         {}", report.stocks);
    println!("Coerced cells:  {}", report.merge.coerced_to_missing);
    if let Some(median) = report.median_volume {
        println!("Median volume:  {median:.0}");
    }
    if let Some(date) = report.latest_date {
        println!("Latest date:    {date}");
    }

    if let Some(dir) = report_dir {
        let path = save_report(report, &dir)?;
        println!("Report saved to: {}", path.display());
    }

    if !report.is_success() {
        eprintln!(
            "Publish failed after {} attempt(s)",
            report.publish.attempts()
        );
        std::process::exit(1);
    }
    println!("Published after {} attempt(s)", report.publish.attempts());
    Ok(())
}

fn parse_range(from: Option<&str>, to: Option<&str>) -> Result<Option<(NaiveDate, NaiveDate)>> {
    let parse = |s: &str| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("bad date '{s}'"))
    };
    match (from, to) {
        (None, None) => Ok(None),
        (from, to) => {
            let from = from.map(parse).transpose()?.unwrap_or(NaiveDate::MIN);
            let to = to.map(parse).transpose()?.unwrap_or(NaiveDate::MAX);
            if from > to {
                bail!("--from {from} is after --to {to}");
            }
            Ok(Some((from, to)))
        }
    }
}

struct RankView {
    top: usize,
    alerts: bool,
    summary: bool,
    stock: Option<String>,
    range: Option<(NaiveDate, NaiveDate)>,
    export: Option<PathBuf>,
    json: bool,
}

fn run_rank(target: &PublishTarget, ttl: Duration, view: &RankView) -> Result<()> {
    let source: Box<dyn SnapshotSource> = match target {
        PublishTarget::File(path) => Box::new(FileSnapshot::new(path)),
        PublishTarget::Http(url) => Box::new(HttpSnapshot::new(url)?),
    };
    let cache = SnapshotCache::new(source, ttl);
    let snapshot = cache
        .get()
        .with_context(|| format!("failed to load artifact from {target}"))?;
    let records = &snapshot.records;

    if let Some(code) = &view.stock {
        let history = stock_history(records, code, view.range);
        if history.is_empty() {
            bail!("no dated rows for stock '{code}'");
        }
        if view.json {
            println!("{}", serde_json::to_string_pretty(&history)?);
        } else {
            println!(
                "{:<12} {:>10} {:>14} {:>14} {:>18} {:>8}",
                "Date", "Close", "Volume", "Foreign Buy", "Money Flow", "MFI14"
            );
            println!("{}", "-".repeat(81));
            for p in &history {
                println!(
                    "{:<12} {:>10} {:>14} {:>14} {:>18} {:>8}",
                    p.date,
                    opt(p.close, 2),
                    opt(p.volume, 0),
                    opt(p.foreign_buy, 0),
                    opt(p.money_flow, 0),
                    opt(p.mfi14, 2)
                );
            }
        }
        return Ok(());
    }

    if view.summary {
        match daily_summary(records) {
            Some(s) if view.json => println!("{}", serde_json::to_string_pretty(&s)?),
            Some(s) => {
                println!("=== {} ===", s.date);
                println!("Total volume:   {:.0}", s.total_volume);
                println!("Advancers:      {}", s.advancers);
                println!("Decliners:      {}", s.decliners);
                println!("Stocks:         {}", s.rows);
                println!();
            }
            None => println!("No dated rows in artifact."),
        }
    }

    let picks = top_picks(records, view.top);
    print_rows("Top picks", &picks, view.json)?;

    if view.alerts {
        print_rows("Alerts", &alerts(records), view.json)?;
    }

    if let Some(path) = &view.export {
        let csv = export_top_picks_csv(&picks)?;
        std::fs::write(path, csv)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Top picks saved to: {}", path.display());
    }
    Ok(())
}

fn print_rows(title: &str, rows: &[&OutputRecord], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(rows)?);
        return Ok(());
    }
    println!("--- {title} ({}) ---", rows.len());
    println!(
        "{:<8} {:>5} {:<18} {:<10} {:>8} {:<20}",
        "Code", "Score", "Final Signal", "Foreign", "MFI14", "Sector"
    );
    for r in rows {
        println!(
            "{:<8} {:>5} {:<18} {:<10} {:>8} {:<20}",
            r.stock_code(),
            r.score,
            r.row.final_signal.label(),
            r.row.foreign_flow.label(),
            opt(r.group.mfi14, 2),
            r.sector
        );
    }
    println!();
    Ok(())
}

fn opt(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{v:.decimals$}"))
        .unwrap_or_else(|| "-".into())
}
