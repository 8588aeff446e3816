use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::ann::{AnnIndexBuilder, NearestNeighbors};
use crate::config::MatchParams;
use crate::corpus::{Corpus, Sentence};
use crate::embedding::cache::EmbeddingCache;
use crate::embedding::encoder::SentenceEncoder;
use crate::embedding::matrix::EmbeddingMatrix;
use crate::embedding::provider::EmbeddingProvider;
use crate::error::{RemarxError, Result};

/// A reuse sentence together with its nearest original sentence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateMatch {
    pub reuse_index: usize,
    pub original_index: usize,
    /// Dot product of the two unit vectors. Approximate search and rounding
    /// can push it slightly outside `[-1, 1]`.
    pub match_score: f32,
}

/// A candidate match joined with the metadata of both sentences.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotePair {
    pub reuse_index: usize,
    pub reuse_id: String,
    pub reuse_file: String,
    pub reuse_text: String,
    pub original_index: usize,
    pub original_id: String,
    pub original_file: String,
    pub original_text: String,
    pub match_score: f32,
}

/// Wall-clock time spent in each pipeline stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageTimings {
    pub embedding: Duration,
    pub index: Duration,
    pub matching: Duration,
}

impl StageTimings {
    pub fn total(&self) -> Duration {
        self.embedding + self.index + self.matching
    }
}

/// Matcher output before metadata is attached.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SentencePairs {
    pub candidates: Vec<CandidateMatch>,
    pub timings: StageTimings,
}

/// Compiled quote pairs plus how long detection took.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteDetection {
    pub pairs: Vec<QuotePair>,
    pub timings: StageTimings,
}

/// Query `index` once per reuse vector and keep the nearest original
/// sentence when its score is strictly above the cutoff.
///
/// `index` must be built over the original corpus; every reuse sentence
/// yields at most one candidate.
pub fn find_candidates(
    index: &dyn NearestNeighbors,
    reuse: &EmbeddingMatrix,
    params: &MatchParams,
) -> Result<Vec<CandidateMatch>> {
    if index.is_empty() || reuse.is_empty() {
        return Ok(Vec::new());
    }
    if index.dims() != reuse.dims() {
        return Err(RemarxError::DimensionMismatch {
            expected: index.dims(),
            found: reuse.dims(),
        });
    }

    let mut candidates = Vec::new();
    for (reuse_index, vector) in reuse.iter_rows().enumerate() {
        let Some(&(original_index, match_score)) =
            index.query_nearest(vector, 1, params.search_k).first()
        else {
            continue;
        };
        if match_score > params.score_cutoff {
            candidates.push(CandidateMatch {
                reuse_index,
                original_index,
                match_score,
            });
        }
    }

    debug!(
        queries = reuse.rows(),
        matches = candidates.len(),
        score_cutoff = params.score_cutoff,
        "Matched reuse sentences"
    );
    Ok(candidates)
}

/// Find likely quotation pairs between two ordered sentence lists.
///
/// Both lists are embedded, an index is built over the original embeddings
/// only, and each reuse sentence is matched against it. Parameters are
/// validated before any embedding work. An empty list on either side yields
/// no pairs.
pub fn get_sentence_pairs<E, C>(
    provider: &mut EmbeddingProvider<E, C>,
    builder: &dyn AnnIndexBuilder,
    original_sentences: &[&str],
    reuse_sentences: &[&str],
    params: &MatchParams,
) -> Result<SentencePairs>
where
    E: SentenceEncoder,
    C: EmbeddingCache,
{
    params.validate()?;
    if original_sentences.is_empty() || reuse_sentences.is_empty() {
        debug!(
            original = original_sentences.len(),
            reuse = reuse_sentences.len(),
            "Nothing to match"
        );
        return Ok(SentencePairs::default());
    }

    let start = Instant::now();
    let original_vecs = provider.embed(original_sentences)?;
    let reuse_vecs = provider.embed(reuse_sentences)?;
    let embedding = start.elapsed();
    info!(
        original = original_vecs.rows(),
        reuse = reuse_vecs.rows(),
        seconds = embedding.as_secs_f64(),
        "Generated sentence embeddings"
    );

    let start = Instant::now();
    let index = builder.build(&original_vecs, params.n_trees, params.random_seed);
    let index_time = start.elapsed();
    info!(
        n_trees = params.n_trees,
        seconds = index_time.as_secs_f64(),
        "Built nearest-neighbor index"
    );

    let start = Instant::now();
    let candidates = find_candidates(index.as_ref(), &reuse_vecs, params)?;
    let matching = start.elapsed();

    Ok(SentencePairs {
        candidates,
        timings: StageTimings {
            embedding,
            index: index_time,
            matching,
        },
    })
}

/// Attach sentence metadata to each candidate.
///
/// Produces exactly one quote pair per candidate, in candidate order.
pub fn compile_quote_pairs(
    original: &Corpus,
    reuse: &Corpus,
    candidates: &[CandidateMatch],
) -> Result<Vec<QuotePair>> {
    candidates
        .iter()
        .map(|candidate| {
            let reuse_sentence = lookup(reuse, "reuse", candidate.reuse_index)?;
            let original_sentence = lookup(original, "original", candidate.original_index)?;
            Ok(QuotePair {
                reuse_index: candidate.reuse_index,
                reuse_id: reuse_sentence.id.clone(),
                reuse_file: reuse_sentence.file.clone(),
                reuse_text: reuse_sentence.text.clone(),
                original_index: candidate.original_index,
                original_id: original_sentence.id.clone(),
                original_file: original_sentence.file.clone(),
                original_text: original_sentence.text.clone(),
                match_score: candidate.match_score,
            })
        })
        .collect()
}

fn lookup<'a>(corpus: &'a Corpus, side: &'static str, index: usize) -> Result<&'a Sentence> {
    corpus.get(index).ok_or(RemarxError::InvalidCandidate {
        side,
        index,
        len: corpus.len(),
    })
}

/// Detect quote pairs between two loaded corpora.
pub fn find_quote_pairs<E, C>(
    original: &Corpus,
    reuse: &Corpus,
    provider: &mut EmbeddingProvider<E, C>,
    builder: &dyn AnnIndexBuilder,
    params: &MatchParams,
) -> Result<QuoteDetection>
where
    E: SentenceEncoder,
    C: EmbeddingCache,
{
    let sentence_pairs = get_sentence_pairs(
        provider,
        builder,
        &original.texts(),
        &reuse.texts(),
        params,
    )?;
    let pairs = compile_quote_pairs(original, reuse, &sentence_pairs.candidates)?;
    info!(quote_pairs = pairs.len(), "Identified quote pairs");
    Ok(QuoteDetection {
        pairs,
        timings: sentence_pairs.timings,
    })
}
