use tracing::{debug, info};

use super::cache::{EmbeddingCache, Fingerprint};
use super::encoder::SentenceEncoder;
use super::matrix::EmbeddingMatrix;
use crate::config::EMBEDDING_BATCH_SIZE;
use crate::error::{RemarxError, Result};

/// Turns ordered sentence lists into unit-length embedding matrices,
/// consulting a content-addressed cache before running the model.
pub struct EmbeddingProvider<E, C> {
    encoder: E,
    cache: C,
    batch_size: usize,
}

impl<E, C> EmbeddingProvider<E, C>
where
    E: SentenceEncoder,
    C: EmbeddingCache,
{
    pub fn new(encoder: E, cache: C) -> Self {
        Self {
            encoder,
            cache,
            batch_size: EMBEDDING_BATCH_SIZE,
        }
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn model_name(&self) -> &str {
        self.encoder.model_name()
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Embed `sentences`, row `i` of the result belonging to `sentences[i]`.
    ///
    /// A cached matrix for the same model and sentence list is returned
    /// unchanged. Model failures are fatal; there is no fallback embedding.
    pub fn embed(&mut self, sentences: &[&str]) -> Result<EmbeddingMatrix> {
        let key = Fingerprint::new(self.encoder.model_name(), sentences);

        if let Some(matrix) = self.cache.get(&key).map_err(RemarxError::Cache)? {
            if matrix.rows() == sentences.len() {
                debug!(fingerprint = %key, rows = matrix.rows(), "Embedding cache hit");
                return Ok(matrix);
            }
            debug!(
                fingerprint = %key,
                cached_rows = matrix.rows(),
                expected_rows = sentences.len(),
                "Ignoring cache entry with wrong row count"
            );
        }

        info!(
            model = self.encoder.model_name(),
            sentences = sentences.len(),
            "Generating sentence embeddings"
        );
        let mut vectors = Vec::with_capacity(sentences.len());
        for batch in sentences.chunks(self.batch_size) {
            let embedded = self.encoder.encode(batch).map_err(RemarxError::Model)?;
            if embedded.len() != batch.len() {
                return Err(RemarxError::Model(anyhow::anyhow!(
                    "model returned {} embeddings for {} sentences",
                    embedded.len(),
                    batch.len()
                )));
            }
            vectors.extend(embedded);
        }
        let matrix = EmbeddingMatrix::from_rows(vectors).map_err(RemarxError::Model)?;

        self.cache.put(&key, &matrix).map_err(RemarxError::Cache)?;
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::cache::{MemoryCache, NoCache};
    use crate::embedding::encoder::HashEncoder;

    /// Encoder wrapper counting how many times the model runs.
    struct CountingEncoder {
        inner: HashEncoder,
        calls: usize,
        sentences: usize,
    }

    impl CountingEncoder {
        fn new() -> Self {
            Self {
                inner: HashEncoder::new(32),
                calls: 0,
                sentences: 0,
            }
        }
    }

    impl SentenceEncoder for CountingEncoder {
        fn model_name(&self) -> &str {
            "counting"
        }

        fn encode(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
            self.calls += 1;
            self.sentences += texts.len();
            self.inner.encode(texts)
        }
    }

    struct FailingEncoder;

    impl SentenceEncoder for FailingEncoder {
        fn model_name(&self) -> &str {
            "missing"
        }

        fn encode(&mut self, _texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
            anyhow::bail!("weights not found")
        }
    }

    #[test]
    fn second_call_is_served_from_cache() {
        let mut provider = EmbeddingProvider::new(CountingEncoder::new(), MemoryCache::new());
        let sentences = ["Die Ware ist ein Ding.", "Geld ist eine Ware."];

        let first = provider.embed(&sentences).unwrap();
        let second = provider.embed(&sentences).unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.encoder().calls, 1);
        assert_eq!(provider.cache().len(), 1);
    }

    #[test]
    fn cached_result_matches_fresh_computation() {
        let sentences = ["eins zwei", "drei vier", "fünf"];
        let mut cached = EmbeddingProvider::new(CountingEncoder::new(), MemoryCache::new());
        cached.embed(&sentences).unwrap();
        let hit = cached.embed(&sentences).unwrap();

        let mut fresh = EmbeddingProvider::new(CountingEncoder::new(), NoCache);
        assert_eq!(hit, fresh.embed(&sentences).unwrap());
    }

    #[test]
    fn changed_order_is_a_cache_miss() {
        let mut provider = EmbeddingProvider::new(CountingEncoder::new(), MemoryCache::new());
        provider.embed(&["a", "b"]).unwrap();
        provider.embed(&["b", "a"]).unwrap();
        assert_eq!(provider.encoder().calls, 2);
    }

    #[test]
    fn rows_are_unit_length_and_aligned() {
        let mut provider =
            EmbeddingProvider::new(CountingEncoder::new(), NoCache).with_batch_size(2);
        let sentences = ["alpha beta", "gamma", "alpha beta", "delta"];
        let matrix = provider.embed(&sentences).unwrap();

        assert_eq!(matrix.rows(), 4);
        assert_eq!(provider.encoder().calls, 2);
        assert_eq!(provider.encoder().sentences, 4);
        assert_eq!(matrix.row(0), matrix.row(2));
        for row in matrix.iter_rows() {
            let norm: f32 = row.iter().map(|x| x * x).sum();
            assert!((norm - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn model_failure_propagates() {
        let mut provider = EmbeddingProvider::new(FailingEncoder, MemoryCache::new());
        let err = provider.embed(&["x"]).unwrap_err();
        assert!(matches!(err, RemarxError::Model(_)));
        assert!(provider.cache().is_empty());
    }

    #[test]
    fn empty_input_yields_empty_matrix() {
        let mut provider = EmbeddingProvider::new(CountingEncoder::new(), NoCache);
        let matrix = provider.embed(&[]).unwrap();
        assert!(matrix.is_empty());
        assert_eq!(provider.encoder().calls, 0);
    }
}
