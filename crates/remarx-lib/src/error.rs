use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the quotation pipeline.
///
/// Each variant belongs to one failure category so callers can tell input
/// problems apart from model, configuration and cache problems. A search that
/// finds nothing is not an error; it yields an empty result.
#[derive(Error, Debug)]
pub enum RemarxError {
    #[error("Sentence corpus not found: {}", path.display())]
    CorpusNotFound { path: PathBuf },

    #[error("Malformed sentence corpus {}: {reason}", path.display())]
    MalformedCorpus { path: PathBuf, reason: String },

    #[error("No sentences found in corpus {}", path.display())]
    EmptyCorpus { path: PathBuf },

    #[error("Malformed table {}: {reason}", path.display())]
    MalformedTable { path: PathBuf, reason: String },

    #[error("Embedding model unavailable: {0:#}")]
    Model(anyhow::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Embedding cache error: {0:#}")]
    Cache(anyhow::Error),

    #[error("Vector dimension mismatch: index has {expected} dimensions, query has {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Candidate refers to {side} sentence {index}, but that corpus has {len} sentences")]
    InvalidCandidate {
        side: &'static str,
        index: usize,
        len: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, RemarxError>;
