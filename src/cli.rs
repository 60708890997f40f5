use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::layout::Signal;

#[derive(Parser, Debug)]
#[command(
    name = "table-eval",
    version,
    about = "Evaluation tooling for semantic table search result trees"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score every configuration against ground truth and render the report.
    Evaluate(EvaluateArgs),
    /// Rewrite a top-K result tree as a top-k tree.
    Truncate(TruncateArgs),
    /// Split linking results into coverage bands.
    Bucket(BucketArgs),
    /// Print per-query runtimes in seconds for each LSH configuration.
    Runtime(ConfigStatsArgs),
    /// Print per-query search-space reduction in percent for each LSH configuration.
    Reduction(ConfigStatsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    #[arg(long, default_value = "results")]
    pub results_root: PathBuf,

    #[arg(long, default_value = "queries")]
    pub queries_dir: PathBuf,

    #[arg(long)]
    pub ground_truth_dir: PathBuf,

    #[arg(long)]
    pub corpus_dir: PathBuf,

    #[arg(long)]
    pub mapping_path: PathBuf,

    #[arg(long, default_value_t = 100)]
    pub k: usize,

    #[arg(long = "tuple")]
    pub tuples: Vec<u32>,

    #[arg(long, default_value_t = 3)]
    pub votes: u32,

    #[arg(long)]
    pub sweep_config: Option<PathBuf>,

    #[arg(long, default_value = "reports")]
    pub output_dir: PathBuf,

    #[arg(long, default_value_t = false)]
    pub skip_plots: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TruncateArgs {
    /// Top-K directory such as results/vote_3/types/vectors_128/bandsize_8/100.
    #[arg(long = "source-dir", required = true)]
    pub source_dirs: Vec<PathBuf>,

    #[arg(long, default_value_t = 10)]
    pub k: usize,
}

#[derive(Args, Debug, Clone)]
pub struct BucketArgs {
    /// Linking results for one vote count, such as results_linking/vote_3.
    #[arg(long)]
    pub results_root: PathBuf,

    #[arg(long)]
    pub coverage_path: PathBuf,

    /// Coverage thresholds in percent.
    #[arg(long = "threshold", default_values_t = [40_u32, 60, 80])]
    pub thresholds: Vec<u32>,

    #[arg(long = "signal", value_enum, default_values_t = [Signal::Types, Signal::Embeddings])]
    pub signals: Vec<Signal>,

    #[arg(long = "tuple", default_values_t = [1_u32, 5])]
    pub tuples: Vec<u32>,

    #[arg(long, default_value_t = 30)]
    pub vectors: u32,

    #[arg(long, default_value_t = 10)]
    pub band_size: u32,

    #[arg(long, default_value_t = 1000)]
    pub source_k: usize,

    #[arg(long, default_value_t = 10)]
    pub k: usize,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigStatsArgs {
    #[arg(long, default_value = "results")]
    pub results_root: PathBuf,

    #[arg(long, default_value_t = 3)]
    pub votes: u32,

    #[arg(long, value_enum, default_value_t = Signal::Types)]
    pub signal: Signal,

    #[arg(long, default_value_t = false)]
    pub column_aggregation: bool,

    #[arg(long, default_value_t = 10)]
    pub k: usize,

    #[arg(long, default_value_t = 1)]
    pub tuple: u32,

    /// Print values with a decimal comma for spreadsheet import.
    #[arg(long, default_value_t = false)]
    pub decimal_comma: bool,
}
