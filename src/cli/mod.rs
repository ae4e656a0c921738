pub mod analyze;
pub mod classify;
pub mod schema;

use crate::config::{Config, FailedChunkPolicy};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DEFAULT_CONFIG: &str = "revmap.yaml";

#[derive(Parser)]
#[command(name = "revmap")]
#[command(
    author,
    version,
    about = "Map-reduce sentiment and category analysis of user reviews"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Summarize a review dataset into one comprehensive report
    Analyze(AnalyzeArgs),

    /// Classify reviews one by one
    Classify(ClassifyArgs),

    /// Print JSON Schema for the config file or the summary report
    Schema(SchemaArgs),
}

#[derive(Args, Clone)]
pub struct ConfigArgs {
    /// Path to config file (defaults apply when revmap.yaml is absent)
    #[arg(short, long, env = "REVMAP_CONFIG")]
    pub config: Option<PathBuf>,
}

impl ConfigArgs {
    /// Load the config file. An explicitly named file must exist; the
    /// default one may be missing.
    pub fn load(&self) -> anyhow::Result<Config> {
        match &self.config {
            Some(path) => {
                info!("Loading config from {:?}", path);
                Ok(Config::load(path)?)
            }
            None if Path::new(DEFAULT_CONFIG).exists() => {
                info!("Loading config from {}", DEFAULT_CONFIG);
                Ok(Config::load(Path::new(DEFAULT_CONFIG))?)
            }
            None => {
                debug!("No {} found, using defaults", DEFAULT_CONFIG);
                Ok(Config::default())
            }
        }
    }
}

#[derive(Parser, Clone)]
pub struct AnalyzeArgs {
    /// Reviews file (JSON array or one record per line)
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Override the number of chunks to aim for
    #[arg(long)]
    pub chunks: Option<usize>,

    /// Cap every chunk at this many reviews instead of targeting a chunk count
    #[arg(long, conflicts_with = "chunks")]
    pub max_per_chunk: Option<usize>,

    /// Override max chunk summaries in flight
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Override output directory
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Summarize chunks one at a time
    #[arg(long)]
    pub sequential: bool,

    /// Summarize every review on its own instead of in chunks
    #[arg(long, conflicts_with_all = ["chunks", "max_per_chunk"])]
    pub per_review: bool,

    /// What to do with failed chunks: drop, retry-individually, split
    #[arg(long)]
    pub policy: Option<FailedChunkPolicy>,

    /// Do not classify reviews that have no sentiment
    #[arg(long)]
    pub no_label: bool,

    /// Show the chunk plan without calling a model
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Parser, Clone)]
pub struct ClassifyArgs {
    /// Reviews file (JSON array or one record per line)
    #[arg(value_name = "FILE", required_unless_present = "text")]
    pub input: Option<PathBuf>,

    /// Classify a single review given on the command line
    #[arg(long, conflicts_with = "input")]
    pub text: Option<String>,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Override max classifications in flight
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Write classifications.json and classifications.md here
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum SchemaTarget {
    /// The revmap.yaml config file
    #[default]
    Config,
    /// The summary.json report
    Summary,
}

#[derive(Parser, Clone)]
pub struct SchemaArgs {
    #[arg(value_enum, default_value_t = SchemaTarget::Config)]
    pub target: SchemaTarget,
}
