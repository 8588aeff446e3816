//! Offline evaluation of quote pairs against a hand-labeled ground truth.
//!
//! Ranks are 1-based. Every metric returns `0.0` instead of dividing by zero.

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::config::ID_SEPARATOR;
use crate::error::{RemarxError, Result};
use crate::quotation::pairs::QuotePair;

/// A retrieved pair as seen by the metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedPair {
    /// Position among the pairs retrieved for the same reuse sentence.
    pub rank: usize,
    /// `1 - match_score`.
    pub distance: f32,
    pub is_match: bool,
}

/// The identifying part of a quote pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPair {
    pub reuse_id: String,
    pub original_id: String,
    pub match_score: f32,
}

impl From<&QuotePair> for ScoredPair {
    fn from(pair: &QuotePair) -> Self {
        Self {
            reuse_id: pair.reuse_id.clone(),
            original_id: pair.original_id.clone(),
            match_score: pair.match_score,
        }
    }
}

/// Known `(reuse_id, original_id)` quotations.
pub type GroundTruth = HashSet<(String, String)>;

/// Fraction of true matches retrieved at rank `k` or better.
///
/// `n_matches` is the total number of true matches; pass it when the
/// retrieved pairs may not contain all of them. Otherwise the matches among
/// `pairs` are counted.
pub fn recall_at_k(pairs: &[RankedPair], k: usize, n_matches: Option<usize>) -> f64 {
    let total = n_matches.unwrap_or_else(|| pairs.iter().filter(|p| p.is_match).count());
    let found = pairs.iter().filter(|p| p.is_match && p.rank <= k).count();
    ratio(found, total)
}

/// Fraction of pairs at most `distance` apart that are true matches.
pub fn precision_at_distance(pairs: &[RankedPair], distance: f32) -> f64 {
    let retrieved: Vec<&RankedPair> = pairs.iter().filter(|p| p.distance <= distance).collect();
    let found = retrieved.iter().filter(|p| p.is_match).count();
    ratio(found, retrieved.len())
}

/// Fraction of true matches that are at most `distance` apart.
pub fn recall_at_distance(pairs: &[RankedPair], distance: f32, n_matches: Option<usize>) -> f64 {
    let total = n_matches.unwrap_or_else(|| pairs.iter().filter(|p| p.is_match).count());
    let found = pairs
        .iter()
        .filter(|p| p.is_match && p.distance <= distance)
        .count();
    ratio(found, total)
}

#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Rank and label retrieved pairs.
///
/// Pairs sharing a reuse id are ranked by descending score. A pair is a
/// match when its ids appear in `ground_truth`. The result is parallel to
/// `pairs`.
pub fn label_quote_pairs(pairs: &[ScoredPair], ground_truth: &GroundTruth) -> Vec<RankedPair> {
    let mut by_reuse: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, pair) in pairs.iter().enumerate() {
        by_reuse.entry(pair.reuse_id.as_str()).or_default().push(i);
    }

    let mut ranks = vec![0; pairs.len()];
    for members in by_reuse.values_mut() {
        members.sort_by(|&a, &b| {
            pairs[b]
                .match_score
                .total_cmp(&pairs[a].match_score)
                .then(a.cmp(&b))
        });
        for (position, &i) in members.iter().enumerate() {
            ranks[i] = position + 1;
        }
    }

    pairs
        .iter()
        .zip(ranks)
        .map(|(pair, rank)| RankedPair {
            rank,
            distance: 1.0 - pair.match_score,
            is_match: ground_truth.contains(&(pair.reuse_id.clone(), pair.original_id.clone())),
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct GroundTruthRow {
    reuse_id: String,
    original_id: String,
}

/// Read ground-truth pairs from CSV with `reuse_id` and `original_id` columns.
///
/// `source` only names the input in error messages.
pub fn read_ground_truth<R: Read>(reader: R, source: &Path) -> Result<GroundTruth> {
    let malformed = |reason: String| RemarxError::MalformedTable {
        path: source.to_path_buf(),
        reason,
    };
    let mut reader = csv::Reader::from_reader(reader);
    let mut truth = GroundTruth::new();
    for row in reader.deserialize::<GroundTruthRow>() {
        let row = row.map_err(|e| malformed(e.to_string()))?;
        truth.insert((row.reuse_id, row.original_id));
    }
    Ok(truth)
}

/// Load ground-truth pairs from a CSV file.
pub fn load_ground_truth(path: &Path) -> Result<GroundTruth> {
    let file = open_table(path)?;
    read_ground_truth(file, path)
}

/// Load a quote-pairs table written by `find-quotes`.
///
/// Consolidated tables are expanded back into their constituent sentence
/// pairs, each carrying the passage score.
pub fn load_scored_pairs(path: &Path) -> Result<Vec<ScoredPair>> {
    let malformed = |reason: String| RemarxError::MalformedTable {
        path: path.to_path_buf(),
        reason,
    };
    let mut reader = csv::Reader::from_reader(open_table(path)?);
    let headers = reader
        .headers()
        .map_err(|e| malformed(format!("unreadable header: {e}")))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h == name);
    let (Some(reuse_col), Some(original_col), Some(score_col)) = (
        column("reuse_id"),
        column("original_id"),
        column("match_score"),
    ) else {
        return Err(malformed(
            "expected reuse_id, original_id and match_score columns".to_string(),
        ));
    };
    let passage_cols = column("reuse_ids").zip(column("original_ids"));

    let mut pairs = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| malformed(e.to_string()))?;
        let field = |i: usize| record.get(i).unwrap_or_default();
        let match_score: f32 = field(score_col)
            .parse()
            .map_err(|e| malformed(format!("row {}: invalid match_score: {e}", line + 1)))?;

        if let Some((reuse_ids_col, original_ids_col)) = passage_cols {
            let reuse_ids: Vec<&str> = field(reuse_ids_col).split(ID_SEPARATOR).collect();
            let original_ids: Vec<&str> = field(original_ids_col).split(ID_SEPARATOR).collect();
            if reuse_ids.len() != original_ids.len() {
                return Err(malformed(format!(
                    "row {}: {} reuse ids but {} original ids",
                    line + 1,
                    reuse_ids.len(),
                    original_ids.len()
                )));
            }
            for (reuse_id, original_id) in reuse_ids.into_iter().zip(original_ids) {
                pairs.push(ScoredPair {
                    reuse_id: reuse_id.to_string(),
                    original_id: original_id.to_string(),
                    match_score,
                });
            }
        } else {
            pairs.push(ScoredPair {
                reuse_id: field(reuse_col).to_string(),
                original_id: field(original_col).to_string(),
                match_score,
            });
        }
    }
    Ok(pairs)
}

fn open_table(path: &Path) -> Result<std::fs::File> {
    std::fs::File::open(path).map_err(|e| RemarxError::MalformedTable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Precision and recall of a result table at one score cutoff.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalReport {
    pub retrieved: usize,
    pub ground_truth: usize,
    pub true_positives: usize,
    pub precision: f64,
    pub recall: f64,
}

/// Score retrieved pairs against the ground truth, counting pairs with a
/// score of at least `score_cutoff`.
pub fn evaluate_pairs(
    pairs: &[ScoredPair],
    ground_truth: &GroundTruth,
    score_cutoff: f32,
) -> EvalReport {
    let ranked = label_quote_pairs(pairs, ground_truth);
    let distance = 1.0 - score_cutoff;
    let report = EvalReport {
        retrieved: ranked.iter().filter(|p| p.distance <= distance).count(),
        ground_truth: ground_truth.len(),
        true_positives: ranked
            .iter()
            .filter(|p| p.is_match && p.distance <= distance)
            .count(),
        precision: precision_at_distance(&ranked, distance),
        recall: recall_at_distance(&ranked, distance, Some(ground_truth.len())),
    };
    info!(
        retrieved = report.retrieved,
        true_positives = report.true_positives,
        precision = report.precision,
        recall = report.recall,
        "Evaluated quote pairs"
    );
    report
}
