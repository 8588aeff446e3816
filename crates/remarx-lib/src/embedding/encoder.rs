use crate::config::{HASH_EMBEDDING_DIMENSION, HASH_MODEL_NAME};

/// A frozen sentence-embedding model.
///
/// Implementations must be deterministic: the same texts always produce the
/// same vectors. Output vectors need not be normalized; the provider does that.
pub trait SentenceEncoder {
    /// Identity of the model, part of every cache fingerprint.
    fn model_name(&self) -> &str;

    /// Embed a batch of texts, one vector per input in input order.
    fn encode(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>>;
}

impl SentenceEncoder for Box<dyn SentenceEncoder> {
    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn encode(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        (**self).encode(texts)
    }
}

/// Bag-of-words encoder hashing lowercase word tokens into a fixed number
/// of buckets. Needs no model files; identical texts map to identical vectors
/// and texts without shared words are (almost) orthogonal.
#[derive(Debug, Clone)]
pub struct HashEncoder {
    dim: usize,
}

impl HashEncoder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(8) }
    }
}

impl Default for HashEncoder {
    fn default() -> Self {
        Self::new(HASH_EMBEDDING_DIMENSION)
    }
}

impl SentenceEncoder for HashEncoder {
    fn model_name(&self) -> &str {
        HASH_MODEL_NAME
    }

    fn encode(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.encode_one(text)).collect())
    }
}

impl HashEncoder {
    #[allow(clippy::cast_possible_truncation)]
    fn encode_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dim];
        let lowered = text.to_lowercase();
        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            // FNV-1a
            let mut h: u64 = 0xcbf2_9ce4_8422_2325;
            for b in token.as_bytes() {
                h ^= u64::from(*b);
                h = h.wrapping_mul(0x0100_0000_01b3);
            }
            v[(h % self.dim as u64) as usize] += 1.0;
        }
        v
    }
}
