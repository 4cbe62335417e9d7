use anyhow::Result;
use clap::Parser;
use serde_json::json;
use std::path::Path;
use tracing_subscriber::EnvFilter;
use ttfx_ingest::cli::{self, SourceArgs};
use ttfx_ingest::config::Config;
use ttfx_ingest::ingest::assemble::AssembleOptions;
use ttfx_ingest::ingest::store::{FsLogStore, GitLogStore, LogStore};
use ttfx_ingest::model::IngestReport;
use ttfx_ingest::{Dataset, DatasetBuilder, aggregate, normalize, table};

const DEFAULT_LOG_FILTER: &str = "info";

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TTFX_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn assemble_options(config: &Config, source: &SourceArgs) -> AssembleOptions {
    let mut options = AssembleOptions::from(config);
    if let Some(anchor) = &source.anchor {
        options.anchor = anchor.clone();
    }
    if let Some(policy) = source.path_policy {
        options.path_policy = policy;
    }
    options
}

fn build_dataset(config: &Config, source: &SourceArgs) -> Result<(Dataset, IngestReport)> {
    let store: Box<dyn LogStore> = match &source.git_rev {
        Some(rev) => Box::new(GitLogStore::new(&source.logs, rev.clone())),
        None => Box::new(FsLogStore::new(&source.logs)),
    };
    DatasetBuilder::with_options(&*store, assemble_options(config, source)).build()
}

fn main() -> Result<()> {
    let args = cli::Args::parse();
    init_tracing();
    let config = Config::get();

    match args.command {
        cli::Command::Ingest { source, out } => {
            let (dataset, report) = build_dataset(config, &source)?;
            table::write_dataset(&out, &dataset)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        cli::Command::Normalize { input, out } => {
            let dataset = table::read_dataset(&input)?;
            let normalized = normalize::normalize(dataset);
            table::write_normalized(&out, &normalized)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "rows": normalized.len() }))?
            );
            Ok(())
        }
        cli::Command::Summarize { input, out } => {
            let normalized = table::read_normalized(&input)?;
            let summary = aggregate::summarize(&normalized);
            table::write_summary(&out, &summary)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "rows": normalized.len(),
                    "groups": summary.len(),
                }))?
            );
            Ok(())
        }
        cli::Command::Pipeline { source, out_dir } => {
            let (dataset, report) = build_dataset(config, &source)?;
            write_pipeline(&out_dir, dataset)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

fn write_pipeline(out_dir: &Path, dataset: Dataset) -> Result<()> {
    table::write_dataset(&out_dir.join("dataset.csv"), &dataset)?;
    let normalized = normalize::normalize(dataset);
    table::write_normalized(&out_dir.join("normalized.csv"), &normalized)?;
    let summary = aggregate::summarize(&normalized);
    table::write_summary(&out_dir.join("summary.csv"), &summary)?;
    tracing::info!(
        rows = normalized.len(),
        groups = summary.len(),
        out_dir = %out_dir.display(),
        "tables written"
    );
    Ok(())
}
