use std::path::Path;

use csv::Writer;
use tracing::info;

use super::consolidate::QuotePassage;
use super::pairs::QuotePair;
use crate::config::ID_SEPARATOR;
use crate::error::Result;

/// Columns of every quote-pairs table.
pub const QUOTE_PAIR_COLUMNS: [&str; 5] = [
    "reuse_id",
    "reuse_text",
    "original_id",
    "original_text",
    "match_score",
];

/// Columns appended when passages are consolidated.
pub const PASSAGE_COLUMNS: [&str; 3] = ["num_sentences", "reuse_ids", "original_ids"];

/// Write one row per quote pair to `path`. The header is always written.
pub fn write_quote_pairs(path: &Path, pairs: &[QuotePair]) -> Result<usize> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(QUOTE_PAIR_COLUMNS)?;
    for pair in pairs {
        let score = pair.match_score.to_string();
        writer.write_record([
            pair.reuse_id.as_str(),
            pair.reuse_text.as_str(),
            pair.original_id.as_str(),
            pair.original_text.as_str(),
            score.as_str(),
        ])?;
    }
    writer.flush()?;
    info!(rows = pairs.len(), path = %path.display(), "Saved quote pairs");
    Ok(pairs.len())
}

/// Write one row per consolidated passage to `path`, keeping every
/// constituent sentence id in the trailing columns.
pub fn write_passages(path: &Path, passages: &[QuotePassage]) -> Result<usize> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(QUOTE_PAIR_COLUMNS.iter().chain(PASSAGE_COLUMNS.iter()))?;
    for passage in passages {
        writer.write_record([
            passage.reuse_id.clone(),
            passage.reuse_text.clone(),
            passage.original_id.clone(),
            passage.original_text.clone(),
            passage.match_score.to_string(),
            passage.num_sentences.to_string(),
            passage.reuse_ids.join(ID_SEPARATOR),
            passage.original_ids.join(ID_SEPARATOR),
        ])?;
    }
    writer.flush()?;
    info!(rows = passages.len(), path = %path.display(), "Saved consolidated quote passages");
    Ok(passages.len())
}
