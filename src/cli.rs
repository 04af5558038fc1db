use crate::io::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dupscan")]
#[command(about = "Semantic duplicate pattern detector", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect duplicate logic patterns in a parsed corpus
    Analyze {
        /// Parsed corpus as JSON, or `-` for stdin
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Similarity required for two patterns to group
        #[arg(long)]
        threshold: Option<f64>,

        /// Minimum node count for an extracted pattern
        #[arg(long = "min-pattern-size")]
        min_pattern_size: Option<usize>,

        /// Weight of the structural sub-score
        #[arg(long = "structural-weight")]
        structural_weight: Option<f64>,

        /// Weight of the token sub-score
        #[arg(long = "token-weight")]
        token_weight: Option<f64>,

        /// Largest allowed node-count ratio between compared patterns
        #[arg(long = "max-size-ratio")]
        max_size_ratio: Option<f64>,

        /// Shard categories larger than this into size buckets
        #[arg(long = "shard-cap")]
        shard_cap: Option<usize>,

        /// Disable parallel extraction and comparison
        #[arg(long = "no-parallel")]
        no_parallel: bool,
    },
}
