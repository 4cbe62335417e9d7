use crate::config::{PathPolicy, parse_anchor};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ttfx",
    version,
    about = "Benchmark log ingestion and cross-version aggregation",
    after_help = r#"Examples:
  ttfx ingest --logs ./logs --out dataset.csv
  ttfx ingest --logs ./bench-repo --git-rev origin/main --out dataset.csv
  ttfx normalize --input dataset.csv --out normalized.csv
  ttfx summarize --input normalized.csv --out summary.csv
  ttfx pipeline --logs ./logs --out-dir ./tables --path-policy reject
"#
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SourceArgs {
    /// Directory (or git repository with --git-rev) holding the logs.
    #[arg(long)]
    pub logs: PathBuf,
    /// Read logs from this git revision instead of the working tree.
    #[arg(long, value_name = "REV")]
    pub git_rev: Option<String>,
    /// Path segment under which <package>/<task>/ directories live.
    #[arg(long, value_parser = parse_anchor)]
    pub anchor: Option<String>,
    /// Handling of runs whose path does not resolve to package/task.
    #[arg(long, value_enum)]
    pub path_policy: Option<PathPolicy>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build the dataset table from benchmark logs.
    Ingest {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long)]
        out: PathBuf,
    },
    /// Normalize a dataset table against each package/task baseline.
    Normalize {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Aggregate a normalized table into per version/date geometric means.
    Summarize {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Ingest, normalize and summarize in one pass.
    Pipeline {
        #[command(flatten)]
        source: SourceArgs,
        /// Receives dataset.csv, normalized.csv and summary.csv.
        #[arg(long)]
        out_dir: PathBuf,
    },
}
