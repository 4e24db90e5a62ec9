pub mod combine;
pub mod report;

use std::io::stderr;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "spendsort",
    version,
    about = "Categorize bank CSV exports and report monthly income and spending."
)]
pub struct Cli {
    /// Number of days the exports cover; totals are scaled to 30 days
    #[arg(default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..))]
    pub days: u32,
}

#[derive(Parser)]
#[command(
    name = "spendsort-combine",
    version,
    about = "Merge several summary.json files into one."
)]
pub struct CombineCli {
    /// Summary documents to merge
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    /// Output path
    #[arg(short, long, default_value = "combined_summary.json")]
    pub output: PathBuf,
}

/// Log to stderr so stdout carries only the report. `RUST_LOG` overrides
/// the default `info` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(stderr)
        .init();
}
