use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use remarx_lib::config::{DEFAULT_MODEL_NAME, DEFAULT_N_TREES, DEFAULT_SCORE_CUTOFF};

#[derive(Parser, Debug)]
#[command(
    name = "remarx",
    about = "Find sentences in a reuse corpus that quote an original corpus"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Match reuse sentences against original sentences and save quote pairs.
    #[command(name = "find-quotes")]
    FindQuotes(FindQuotesArgs),

    /// Manage the embedding model.
    Model {
        #[command(subcommand)]
        model_command: ModelCommand,
    },

    /// Score a quote-pairs table against hand-labeled pairs.
    Evaluate {
        /// Quote-pairs CSV written by `find-quotes`.
        pairs: PathBuf,
        /// CSV with `reuse_id` and `original_id` columns, or `-` for stdin.
        ground_truth: PathBuf,
        /// Count pairs scoring at least this value as retrieved.
        #[arg(long, default_value_t = DEFAULT_SCORE_CUTOFF)]
        cutoff: f32,
    },
}

#[derive(Args, Debug)]
pub struct FindQuotesArgs {
    /// `[ORIGINAL] REUSE OUTPUT`: an optional original corpus file or
    /// directory, the reuse corpus, and the output CSV path. Without
    /// ORIGINAL the default original-corpus directory is searched.
    #[arg(value_name = "PATH", num_args = 2..=3, required = true)]
    pub paths: Vec<PathBuf>,

    /// Minimum similarity a match must exceed.
    #[arg(long, default_value_t = DEFAULT_SCORE_CUTOFF, allow_hyphen_values = true)]
    pub cutoff: f32,

    /// Trees in the nearest-neighbor forest.
    #[arg(long, default_value_t = DEFAULT_N_TREES)]
    pub n_trees: usize,

    /// Candidates inspected per query; a negative value searches the default
    /// budget.
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    pub search_k: i64,

    /// Seed for reproducible index construction.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Embedding model directory name, or `hash` for the offline encoder.
    #[arg(long, default_value = DEFAULT_MODEL_NAME)]
    pub model: String,

    /// Write one row per sentence pair instead of merging passages.
    #[arg(long)]
    pub no_consolidate: bool,

    /// Do not read or write the embedding cache.
    #[arg(long)]
    pub no_cache: bool,

    /// Log how long each pipeline stage took.
    #[arg(long)]
    pub benchmark: bool,

    /// Log debug messages.
    #[arg(short, long)]
    pub verbose: bool,

    /// Write logs to this file instead of stderr.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Positional paths of `find-quotes`, split by role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusPaths {
    pub original: Option<PathBuf>,
    pub reuse: PathBuf,
    pub output: PathBuf,
}

impl FindQuotesArgs {
    pub fn corpus_paths(&self) -> anyhow::Result<CorpusPaths> {
        match self.paths.as_slice() {
            [reuse, output] => Ok(CorpusPaths {
                original: None,
                reuse: reuse.clone(),
                output: output.clone(),
            }),
            [original, reuse, output] => Ok(CorpusPaths {
                original: Some(original.clone()),
                reuse: reuse.clone(),
                output: output.clone(),
            }),
            _ => anyhow::bail!(
                "expected [ORIGINAL] REUSE OUTPUT, got {} paths",
                self.paths.len()
            ),
        }
    }

    /// `--search-k` as an optional positive budget.
    pub fn search_k(&self) -> Option<usize> {
        usize::try_from(self.search_k).ok()
    }
}

#[derive(Subcommand, Debug)]
pub enum ModelCommand {
    /// Download the embedding model files from Hugging Face.
    Download {
        /// Force re-download even if files already exist.
        #[arg(long)]
        force: bool,
    },
}
