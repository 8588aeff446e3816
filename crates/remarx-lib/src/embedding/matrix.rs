#![allow(clippy::cast_possible_truncation)]

use anyhow::{Context, bail};

/// Dense row-major matrix of sentence embeddings, one row per sentence.
///
/// Rows built through [`EmbeddingMatrix::from_rows`] are L2-normalized, so a
/// dot product between two rows is their cosine similarity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EmbeddingMatrix {
    rows: usize,
    dims: usize,
    data: Vec<f32>,
}

impl EmbeddingMatrix {
    /// Build a matrix from raw vectors, normalizing each row to unit length.
    /// Zero vectors are kept as zeros.
    pub fn from_rows(vectors: Vec<Vec<f32>>) -> anyhow::Result<Self> {
        let rows = vectors.len();
        let dims = vectors.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows * dims);
        for (i, mut vector) in vectors.into_iter().enumerate() {
            if vector.len() != dims {
                bail!(
                    "embedding {i} has {} dimensions, expected {dims}",
                    vector.len()
                );
            }
            normalize(&mut vector);
            data.extend(vector);
        }
        Ok(Self { rows, dims, data })
    }

    /// Number of embedded sentences.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn row(&self, index: usize) -> &[f32] {
        &self.data[index * self.dims..(index + 1) * self.dims]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        // `chunks_exact(0)` panics, and a zero-width matrix has no rows anyway.
        self.data.chunks_exact(self.dims.max(1)).take(self.rows)
    }

    /// Serialize the values as little-endian `f32` bytes.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.data.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    /// Rebuild a matrix from [`EmbeddingMatrix::to_le_bytes`] output.
    ///
    /// Values are restored bit for bit; no normalization is applied.
    pub fn from_le_bytes(rows: usize, dims: usize, bytes: &[u8]) -> anyhow::Result<Self> {
        let expected = rows
            .checked_mul(dims)
            .and_then(|n| n.checked_mul(4))
            .context("embedding matrix size overflows")?;
        if bytes.len() != expected {
            bail!(
                "embedding blob has {} bytes, expected {expected} for {rows}x{dims}",
                bytes.len()
            );
        }
        let data = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Ok(Self { rows, dims, data })
    }
}

/// Dot product of two equal-length vectors.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector {
            *x /= norm;
        }
    }
}
