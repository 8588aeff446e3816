use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::config::{FILE_COLUMN, ID_COLUMN, ID_SEPARATOR, TEXT_COLUMN};
use crate::error::{RemarxError, Result};

/// One sentence of a corpus.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Sentence {
    /// Stable identifier, unique within the corpus.
    #[serde(rename = "sent_id")]
    pub id: String,
    /// Source document the sentence was extracted from.
    pub file: String,
    pub text: String,
}

/// Ordered sentences. The position of a sentence is its index into the
/// corpus embedding matrix, so the order must never change after loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    sentences: Vec<Sentence>,
}

impl Corpus {
    pub fn new(sentences: Vec<Sentence>) -> Self {
        Self { sentences }
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Sentence> {
        self.sentences.get(index)
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    /// Sentence texts in positional order, ready for embedding.
    pub fn texts(&self) -> Vec<&str> {
        self.sentences.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Load a sentence table from a CSV file.
///
/// The file must contain `sent_id`, `file` and `text` columns; any other
/// columns are ignored. A missing file, missing columns, unparsable rows,
/// duplicate ids, or a table without data rows are all errors.
pub fn load_corpus(path: &Path) -> Result<Corpus> {
    let mut corpus = Corpus::default();
    let mut seen = HashSet::new();
    append_corpus(path, &mut corpus, &mut seen)?;
    info!(path = %path.display(), sentences = corpus.len(), "Loaded sentence corpus");
    Ok(corpus)
}

/// Load several sentence tables and concatenate them, in the given order,
/// into a single corpus. Ids must be unique across all files.
pub fn load_corpora(paths: &[PathBuf]) -> Result<Corpus> {
    let mut corpus = Corpus::default();
    let mut seen = HashSet::new();
    for path in paths {
        let before = corpus.len();
        append_corpus(path, &mut corpus, &mut seen)?;
        debug!(
            path = %path.display(),
            sentences = corpus.len() - before,
            "Appended sentence corpus"
        );
    }
    info!(
        files = paths.len(),
        sentences = corpus.len(),
        "Loaded sentence corpora"
    );
    Ok(corpus)
}

fn append_corpus(path: &Path, corpus: &mut Corpus, seen: &mut HashSet<String>) -> Result<()> {
    if !path.is_file() {
        return Err(RemarxError::CorpusNotFound {
            path: path.to_path_buf(),
        });
    }

    let malformed = |reason: String| RemarxError::MalformedCorpus {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = csv::Reader::from_reader(File::open(path)?);
    let headers = reader
        .headers()
        .map_err(|e| malformed(format!("unreadable header: {e}")))?
        .clone();
    let missing: Vec<&str> = [ID_COLUMN, FILE_COLUMN, TEXT_COLUMN]
        .into_iter()
        .filter(|required| !headers.iter().any(|h| h == *required))
        .collect();
    if !missing.is_empty() {
        return Err(malformed(format!(
            "missing required columns {missing:?}; found {:?}",
            headers.iter().collect::<Vec<_>>()
        )));
    }

    let mut rows = 0usize;
    for record in reader.deserialize::<Sentence>() {
        let sentence = record.map_err(|e| malformed(e.to_string()))?;
        if sentence.id.contains(ID_SEPARATOR) {
            return Err(malformed(format!(
                "sentence id {:?} contains the reserved separator {ID_SEPARATOR:?}",
                sentence.id
            )));
        }
        if !seen.insert(sentence.id.clone()) {
            return Err(malformed(format!("duplicate sentence id {:?}", sentence.id)));
        }
        corpus.sentences.push(sentence);
        rows += 1;
    }

    if rows == 0 {
        return Err(RemarxError::EmptyCorpus {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Expand corpus inputs into a list of sentence-table files.
///
/// Files are kept as given. Directories contribute every `.csv` file they
/// contain, in natural sort order. Missing inputs, directories without CSV
/// files, and an empty input list are errors.
pub fn resolve_corpus_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut resolved = Vec::new();
    for input in inputs {
        if !input.exists() {
            return Err(RemarxError::CorpusNotFound {
                path: input.clone(),
            });
        }
        if input.is_dir() {
            let mut csv_files: Vec<PathBuf> = std::fs::read_dir(input)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| {
                    p.is_file()
                        && p.extension()
                            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
                })
                .collect();
            if csv_files.is_empty() {
                return Err(RemarxError::MalformedCorpus {
                    path: input.clone(),
                    reason: "directory does not contain any CSV files".to_string(),
                });
            }
            csv_files.sort_by(|a, b| natord::compare(&a.to_string_lossy(), &b.to_string_lossy()));
            resolved.extend(csv_files);
        } else {
            resolved.push(input.clone());
        }
    }

    if resolved.is_empty() {
        return Err(RemarxError::InvalidConfig(
            "no original corpora were provided".to_string(),
        ));
    }
    Ok(resolved)
}
