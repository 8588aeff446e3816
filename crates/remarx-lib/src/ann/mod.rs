pub mod forest;

use crate::embedding::matrix::EmbeddingMatrix;

/// A similarity index over a fixed set of vectors.
pub trait NearestNeighbors {
    /// Number of indexed items.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimension of the indexed vectors.
    fn dims(&self) -> usize;

    /// Up to `k` items most similar to `vector`, as `(item_index, score)`
    /// sorted by descending score. `search_k` bounds how many candidates are
    /// inspected; `None` lets the index pick its default.
    fn query_nearest(&self, vector: &[f32], k: usize, search_k: Option<usize>) -> Vec<(usize, f32)>;
}

/// Builds a [`NearestNeighbors`] index over an embedding matrix.
pub trait AnnIndexBuilder {
    fn build(
        &self,
        embeddings: &EmbeddingMatrix,
        n_trees: usize,
        random_seed: Option<u64>,
    ) -> Box<dyn NearestNeighbors>;
}
