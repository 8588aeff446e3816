use std::collections::HashMap;

use tracing::debug;

use super::pairs::QuotePair;

/// Sequence membership of one value within an ordered column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceLabel {
    /// Value of the first row of the run this row belongs to.
    pub group: usize,
    /// Whether the row has a consecutive neighbor before or after it.
    pub sequential: bool,
}

/// Label runs of consecutive integers in `values`, taken in the given order.
///
/// A value is sequential when it equals the previous value plus one or the
/// next value minus one. Each value's group is the first value of its run;
/// a value that does not continue the previous one starts a new group.
pub fn identify_sequences(values: &[usize]) -> Vec<SequenceLabel> {
    let mut labels = Vec::with_capacity(values.len());
    let mut group = 0;
    for (i, &value) in values.iter().enumerate() {
        let follows = i > 0 && values[i - 1].checked_add(1) == Some(value);
        let precedes = values.get(i + 1).is_some_and(|&next| value.checked_add(1) == Some(next));
        if !follows {
            group = value;
        }
        labels.push(SequenceLabel {
            group,
            sequential: follows || precedes,
        });
    }
    labels
}

/// Sequence labels of one quote pair on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceAssignment {
    pub reuse: SequenceLabel,
    /// Only computed for pairs that are sequential on the reuse side.
    pub original: Option<SequenceLabel>,
}

impl SequenceAssignment {
    /// Whether the pair continues a passage in both corpora.
    pub fn is_passage_member(&self) -> bool {
        self.reuse.sequential && self.original.is_some_and(|o| o.sequential)
    }
}

/// Label each quote pair with its reuse-side and original-side sequence.
///
/// Pairs are ordered by reuse index; the original side is labeled over the
/// reuse-sequential pairs in that same order, so a passage only forms when
/// both indices ascend together. The result is parallel to `pairs`.
pub fn label_sequences(pairs: &[QuotePair]) -> Vec<SequenceAssignment> {
    let order = reuse_order(pairs);

    let reuse_values: Vec<usize> = order.iter().map(|&i| pairs[i].reuse_index).collect();
    let reuse_labels = identify_sequences(&reuse_values);

    let sequential_rows: Vec<usize> = order
        .iter()
        .zip(&reuse_labels)
        .filter(|(_, label)| label.sequential)
        .map(|(&i, _)| i)
        .collect();
    let original_values: Vec<usize> = sequential_rows
        .iter()
        .map(|&i| pairs[i].original_index)
        .collect();
    let original_labels = identify_sequences(&original_values);

    let mut assignments: Vec<Option<SequenceAssignment>> = vec![None; pairs.len()];
    for (&i, &reuse) in order.iter().zip(&reuse_labels) {
        assignments[i] = Some(SequenceAssignment {
            reuse,
            original: None,
        });
    }
    for (&i, &original) in sequential_rows.iter().zip(&original_labels) {
        if let Some(assignment) = assignments[i].as_mut() {
            assignment.original = Some(original);
        }
    }
    assignments.into_iter().flatten().collect()
}

fn reuse_order(pairs: &[QuotePair]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..pairs.len()).collect();
    order.sort_by_key(|&i| pairs[i].reuse_index);
    order
}

/// One or more quote pairs merged into a continuous passage.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotePassage {
    /// Reuse index of the first sentence.
    pub reuse_index: usize,
    pub reuse_id: String,
    pub reuse_text: String,
    /// Original index of the first sentence.
    pub original_index: usize,
    pub original_id: String,
    pub original_text: String,
    /// Mean score of the merged pairs.
    pub match_score: f32,
    pub num_sentences: usize,
    /// Every constituent reuse id, in passage order.
    pub reuse_ids: Vec<String>,
    /// Every constituent original id, in passage order.
    pub original_ids: Vec<String>,
}

impl From<&QuotePair> for QuotePassage {
    fn from(pair: &QuotePair) -> Self {
        Self {
            reuse_index: pair.reuse_index,
            reuse_id: pair.reuse_id.clone(),
            reuse_text: pair.reuse_text.clone(),
            original_index: pair.original_index,
            original_id: pair.original_id.clone(),
            original_text: pair.original_text.clone(),
            match_score: pair.match_score,
            num_sentences: 1,
            reuse_ids: vec![pair.reuse_id.clone()],
            original_ids: vec![pair.original_id.clone()],
        }
    }
}

impl QuotePassage {
    fn extend(&mut self, pair: &QuotePair) {
        self.reuse_text.push(' ');
        self.reuse_text.push_str(&pair.reuse_text);
        self.original_text.push(' ');
        self.original_text.push_str(&pair.original_text);
        self.reuse_ids.push(pair.reuse_id.clone());
        self.original_ids.push(pair.original_id.clone());
        self.num_sentences += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum GroupKey {
    Passage { reuse: usize, original: usize },
    Single(usize),
}

/// Merge quote pairs that are sequential in both corpora into passages.
///
/// Pairs that do not belong to any two-sided run pass through as
/// one-sentence passages. The result is sorted by reuse index.
#[allow(clippy::cast_precision_loss)]
pub fn consolidate_quotes(pairs: &[QuotePair]) -> Vec<QuotePassage> {
    let assignments = label_sequences(pairs);

    let mut passages: Vec<QuotePassage> = Vec::new();
    let mut score_sums: Vec<f32> = Vec::new();
    let mut slots: HashMap<GroupKey, usize> = HashMap::new();
    for i in reuse_order(pairs) {
        let pair = &pairs[i];
        let assignment = assignments[i];
        let key = match assignment.original {
            Some(original) if assignment.is_passage_member() => GroupKey::Passage {
                reuse: assignment.reuse.group,
                original: original.group,
            },
            _ => GroupKey::Single(i),
        };

        if let Some(&slot) = slots.get(&key) {
            passages[slot].extend(pair);
            score_sums[slot] += pair.match_score;
        } else {
            slots.insert(key, passages.len());
            passages.push(QuotePassage::from(pair));
            score_sums.push(pair.match_score);
        }
    }

    for (passage, sum) in passages.iter_mut().zip(score_sums) {
        passage.match_score = sum / passage.num_sentences as f32;
    }
    passages.sort_by_key(|p| p.reuse_index);

    debug!(
        quote_pairs = pairs.len(),
        passages = passages.len(),
        multi_sentence = passages.iter().filter(|p| p.num_sentences > 1).count(),
        "Consolidated quote pairs"
    );
    passages
}
