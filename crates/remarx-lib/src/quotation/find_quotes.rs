use std::path::{Path, PathBuf};

use tracing::info;

use super::consolidate::consolidate_quotes;
use super::pairs::{StageTimings, find_quote_pairs};
use super::writer::{write_passages, write_quote_pairs};
use crate::ann::AnnIndexBuilder;
use crate::config::MatchParams;
use crate::corpus::{load_corpora, load_corpus, resolve_corpus_paths};
use crate::embedding::cache::EmbeddingCache;
use crate::embedding::encoder::SentenceEncoder;
use crate::embedding::provider::EmbeddingProvider;
use crate::error::{RemarxError, Result};

/// Everything needed for one corpus-to-corpus quote search.
#[derive(Debug, Clone)]
pub struct FindQuotesRequest {
    /// Original sentence tables or directories of them.
    pub original_inputs: Vec<PathBuf>,
    pub reuse_corpus: PathBuf,
    pub output: PathBuf,
    pub params: MatchParams,
    /// Merge pairs that are sequential in both corpora.
    pub consolidate: bool,
}

impl FindQuotesRequest {
    /// Check the parameters, the corpus inputs and the output directory,
    /// returning the original sentence tables in load order.
    ///
    /// Only touches the file system, so it runs before any model is loaded.
    pub fn prepare(&self) -> Result<Vec<PathBuf>> {
        self.params.validate()?;
        let parent = self
            .output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        if !parent.is_dir() {
            return Err(RemarxError::InvalidConfig(format!(
                "output directory {} does not exist",
                parent.display()
            )));
        }
        let original_files = resolve_corpus_paths(&self.original_inputs)?;
        if !self.reuse_corpus.is_file() {
            return Err(RemarxError::CorpusNotFound {
                path: self.reuse_corpus.clone(),
            });
        }
        Ok(original_files)
    }
}

/// Summary of a finished search.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteReport {
    pub original_files: Vec<PathBuf>,
    pub original_sentences: usize,
    pub reuse_sentences: usize,
    /// Pairs found before consolidation.
    pub quote_pairs: usize,
    /// Rows written to the output table.
    pub rows_written: usize,
    pub output: PathBuf,
    pub timings: StageTimings,
}

/// Load both corpora, detect quotations and write the result table.
///
/// The request is prepared before any corpus is read or embedded, and nothing
/// is written unless detection succeeds.
pub fn run_find_quotes<E, C>(
    request: &FindQuotesRequest,
    provider: &mut EmbeddingProvider<E, C>,
    builder: &dyn AnnIndexBuilder,
) -> Result<QuoteReport>
where
    E: SentenceEncoder,
    C: EmbeddingCache,
{
    let original_files = request.prepare()?;
    let original = load_corpora(&original_files)?;
    let reuse = load_corpus(&request.reuse_corpus)?;

    let detection = find_quote_pairs(&original, &reuse, provider, builder, &request.params)?;
    let rows_written = if request.consolidate {
        let passages = consolidate_quotes(&detection.pairs);
        write_passages(&request.output, &passages)?
    } else {
        write_quote_pairs(&request.output, &detection.pairs)?
    };

    info!(
        quote_pairs = detection.pairs.len(),
        rows = rows_written,
        consolidate = request.consolidate,
        "Quote search finished"
    );
    Ok(QuoteReport {
        original_files,
        original_sentences: original.len(),
        reuse_sentences: reuse.len(),
        quote_pairs: detection.pairs.len(),
        rows_written,
        output: request.output.clone(),
        timings: detection.timings,
    })
}
