use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod classifier;
mod cli;
mod config;
mod error;
mod input;
mod output;
mod pipeline;
mod provider;
mod review;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Progress at info; --verbose adds per-chunk detail
    let filter = if cli.verbose {
        EnvFilter::new("revmap=debug")
    } else {
        EnvFilter::new("revmap=info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Analyze(args) => cli::analyze::execute(args).await,
        Commands::Classify(args) => cli::classify::execute(args).await,
        Commands::Schema(args) => cli::schema::execute(args),
    }
}
