use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::{AnnIndexBuilder, NearestNeighbors};
use crate::config::DEFAULT_LEAF_SIZE;
use crate::embedding::matrix::{EmbeddingMatrix, dot};

/// Approximate nearest-neighbor index made of random projection trees,
/// ranking candidates by dot product.
///
/// Every tree splits the item set recursively with the hyperplane halfway
/// between two randomly picked items until a node holds at most `leaf_size`
/// items. A query walks all trees best-first, preferring branches whose
/// hyperplane is far on the query's side, gathers leaf items until the
/// candidate budget is met, then scores the candidates exactly.
///
/// Without an explicit budget a query gathers `n_trees * k * leaf_size`
/// candidates, roughly one leaf per tree and neighbor, so more trees buy
/// recall at query time as well as build time.
pub struct RandomProjectionForest {
    vectors: EmbeddingMatrix,
    trees: Vec<Tree>,
    leaf_size: usize,
}

struct Tree {
    nodes: Vec<Node>,
    root: usize,
}

enum Node {
    Leaf(Vec<usize>),
    Split {
        normal: Vec<f32>,
        offset: f32,
        left: usize,
        right: usize,
    },
}

impl RandomProjectionForest {
    pub fn build(
        embeddings: &EmbeddingMatrix,
        n_trees: usize,
        leaf_size: usize,
        random_seed: Option<u64>,
    ) -> Self {
        let mut rng = random_seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        let leaf_size = leaf_size.max(1);
        let trees = if embeddings.is_empty() {
            Vec::new()
        } else {
            (0..n_trees)
                .map(|_| {
                    let mut nodes = Vec::new();
                    let items = (0..embeddings.rows()).collect();
                    let root = build_node(embeddings, items, leaf_size, &mut nodes, &mut rng);
                    Tree { nodes, root }
                })
                .collect()
        };
        debug!(
            items = embeddings.rows(),
            dims = embeddings.dims(),
            n_trees = trees.len(),
            nodes = trees.iter().map(|t| t.nodes.len()).sum::<usize>(),
            "Built random projection forest"
        );
        Self {
            vectors: embeddings.clone(),
            trees,
            leaf_size,
        }
    }

    fn default_search_k(&self, k: usize) -> usize {
        self.trees.len() * k * self.leaf_size
    }
}

fn build_node(
    embeddings: &EmbeddingMatrix,
    items: Vec<usize>,
    leaf_size: usize,
    nodes: &mut Vec<Node>,
    rng: &mut StdRng,
) -> usize {
    if items.len() <= leaf_size {
        nodes.push(Node::Leaf(items));
        return nodes.len() - 1;
    }

    let (normal, offset) = pick_hyperplane(embeddings, &items, rng);
    let (mut left, mut right): (Vec<usize>, Vec<usize>) = items
        .iter()
        .copied()
        .partition(|&i| margin(&normal, offset, embeddings.row(i)) <= 0.0);

    // Duplicate or collinear items can put everything on one side; fall back
    // to a random partition so that recursion always shrinks the node.
    if left.is_empty() || right.is_empty() {
        left.clear();
        right.clear();
        for &i in &items {
            if rng.random::<bool>() {
                right.push(i);
            } else {
                left.push(i);
            }
        }
        if left.is_empty() || right.is_empty() {
            let mut all = items;
            right = all.split_off(all.len() / 2);
            left = all;
        }
    }

    let left = build_node(embeddings, left, leaf_size, nodes, rng);
    let right = build_node(embeddings, right, leaf_size, nodes, rng);
    nodes.push(Node::Split {
        normal,
        offset,
        left,
        right,
    });
    nodes.len() - 1
}

/// Hyperplane bisecting two randomly chosen items: normal `a - b`, passing
/// through their midpoint.
fn pick_hyperplane(embeddings: &EmbeddingMatrix, items: &[usize], rng: &mut StdRng) -> (Vec<f32>, f32) {
    let first = items[rng.random_range(0..items.len())];
    let mut second = items[rng.random_range(0..items.len())];
    // A few retries to avoid picking the same item twice.
    for _ in 0..3 {
        if second != first {
            break;
        }
        second = items[rng.random_range(0..items.len())];
    }

    let a = embeddings.row(first);
    let b = embeddings.row(second);
    let normal: Vec<f32> = a.iter().zip(b).map(|(x, y)| x - y).collect();
    let midpoint: Vec<f32> = a.iter().zip(b).map(|(x, y)| (x + y) / 2.0).collect();
    let offset = -dot(&normal, &midpoint);
    (normal, offset)
}

fn margin(normal: &[f32], offset: f32, vector: &[f32]) -> f32 {
    dot(normal, vector) + offset
}

/// A pending node in the best-first traversal. Higher priority is explored
/// first; the priority is the smallest margin seen on the way down.
struct Frontier {
    priority: f32,
    tree: usize,
    node: usize,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then_with(|| other.tree.cmp(&self.tree))
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl NearestNeighbors for RandomProjectionForest {
    fn len(&self) -> usize {
        self.vectors.rows()
    }

    fn dims(&self) -> usize {
        self.vectors.dims()
    }

    fn query_nearest(&self, vector: &[f32], k: usize, search_k: Option<usize>) -> Vec<(usize, f32)> {
        if k == 0 || self.trees.is_empty() {
            return Vec::new();
        }
        let search_k = search_k.unwrap_or_else(|| self.default_search_k(k));

        let mut heap: BinaryHeap<Frontier> = self
            .trees
            .iter()
            .enumerate()
            .map(|(tree, t)| Frontier {
                priority: f32::INFINITY,
                tree,
                node: t.root,
            })
            .collect();

        let mut seen = vec![false; self.len()];
        let mut candidates = Vec::new();
        while candidates.len() < search_k {
            let Some(Frontier {
                priority,
                tree,
                node,
            }) = heap.pop()
            else {
                break;
            };
            match &self.trees[tree].nodes[node] {
                Node::Leaf(items) => {
                    for &item in items {
                        if !seen[item] {
                            seen[item] = true;
                            candidates.push(item);
                        }
                    }
                }
                Node::Split {
                    normal,
                    offset,
                    left,
                    right,
                } => {
                    let m = margin(normal, *offset, vector);
                    heap.push(Frontier {
                        priority: priority.min(m),
                        tree,
                        node: *right,
                    });
                    heap.push(Frontier {
                        priority: priority.min(-m),
                        tree,
                        node: *left,
                    });
                }
            }
        }

        let mut scored: Vec<(usize, f32)> = candidates
            .into_iter()
            .map(|item| (item, dot(self.vectors.row(item), vector)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(k);
        scored
    }
}

/// [`AnnIndexBuilder`] producing [`RandomProjectionForest`] indexes.
#[derive(Debug, Clone, Copy)]
pub struct ForestBuilder {
    pub leaf_size: usize,
}

impl Default for ForestBuilder {
    fn default() -> Self {
        Self {
            leaf_size: DEFAULT_LEAF_SIZE,
        }
    }
}

impl AnnIndexBuilder for ForestBuilder {
    fn build(
        &self,
        embeddings: &EmbeddingMatrix,
        n_trees: usize,
        random_seed: Option<u64>,
    ) -> Box<dyn NearestNeighbors> {
        Box::new(RandomProjectionForest::build(
            embeddings,
            n_trees,
            self.leaf_size,
            random_seed,
        ))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::cast_precision_loss)]

    use super::*;

    /// Deterministic pseudo-random unit vectors.
    fn random_matrix(rows: usize, dims: usize, seed: u64) -> EmbeddingMatrix {
        let mut rng = StdRng::seed_from_u64(seed);
        let vectors = (0..rows)
            .map(|_| (0..dims).map(|_| rng.random_range(-1.0..1.0)).collect())
            .collect();
        EmbeddingMatrix::from_rows(vectors).unwrap()
    }

    fn exact_nearest(m: &EmbeddingMatrix, query: &[f32]) -> usize {
        (0..m.rows())
            .max_by(|&a, &b| dot(m.row(a), query).total_cmp(&dot(m.row(b), query)))
            .unwrap()
    }

    #[test]
    fn small_index_is_exact() {
        let m = random_matrix(20, 8, 1);
        let forest = RandomProjectionForest::build(&m, 3, DEFAULT_LEAF_SIZE, Some(7));
        for i in 0..m.rows() {
            let result = forest.query_nearest(m.row(i), 1, None);
            assert_eq!(result[0].0, i);
            assert!((result[0].1 - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn finds_indexed_items_in_a_split_forest() {
        let m = random_matrix(400, 16, 2);
        let forest = RandomProjectionForest::build(&m, 10, 8, Some(11));
        let found = (0..m.rows())
            .filter(|&i| forest.query_nearest(m.row(i), 1, None)[0].0 == i)
            .count();
        assert!(found as f64 / m.rows() as f64 > 0.95, "found {found}");
    }

    fn recall_at_one(m: &EmbeddingMatrix, queries: &EmbeddingMatrix, n_trees: usize) -> f64 {
        let forest = RandomProjectionForest::build(m, n_trees, DEFAULT_LEAF_SIZE, Some(17));
        let hits = queries
            .iter_rows()
            .filter(|query| forest.query_nearest(query, 1, None)[0].0 == exact_nearest(m, query))
            .count();
        hits as f64 / queries.rows() as f64
    }

    #[test]
    fn default_budget_grows_recall_with_trees() {
        let m = random_matrix(2000, 16, 12);
        let queries = random_matrix(100, 16, 13);

        let one_tree = recall_at_one(&m, &queries, 1);
        let many_trees = recall_at_one(&m, &queries, 20);
        assert!(many_trees > one_tree, "1 tree {one_tree}, 20 trees {many_trees}");
        assert!(many_trees >= 0.9, "20 trees {many_trees}");
    }

    #[test]
    fn default_budget_covers_one_leaf_per_tree() {
        let m = random_matrix(300, 8, 14);
        let forest = RandomProjectionForest::build(&m, 4, 8, Some(2));
        assert_eq!(forest.default_search_k(1), 32);
        assert_eq!(forest.default_search_k(3), 96);
    }

    #[test]
    fn full_search_budget_is_exact() {
        let m = random_matrix(300, 12, 3);
        let queries = random_matrix(25, 12, 4);
        let forest = RandomProjectionForest::build(&m, 4, 8, Some(5));
        for query in queries.iter_rows() {
            let result = forest.query_nearest(query, 1, Some(m.rows()));
            assert_eq!(result[0].0, exact_nearest(&m, query));
        }
    }

    #[test]
    fn results_are_sorted_and_bounded_by_k() {
        let m = random_matrix(50, 6, 6);
        let forest = RandomProjectionForest::build(&m, 5, 4, Some(1));
        let result = forest.query_nearest(m.row(0), 5, Some(50));
        assert_eq!(result.len(), 5);
        assert!(result.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn same_seed_reproduces_results() {
        let m = random_matrix(200, 10, 8);
        let queries = random_matrix(30, 10, 9);
        let a = RandomProjectionForest::build(&m, 3, 4, Some(42));
        let b = RandomProjectionForest::build(&m, 3, 4, Some(42));
        for query in queries.iter_rows() {
            assert_eq!(a.query_nearest(query, 3, None), b.query_nearest(query, 3, None));
        }
    }

    #[test]
    fn duplicate_vectors_still_build() {
        let m = EmbeddingMatrix::from_rows(vec![vec![1.0, 0.0]; 50]).unwrap();
        let forest = RandomProjectionForest::build(&m, 2, 4, Some(3));
        let result = forest.query_nearest(&[1.0, 0.0], 1, None);
        assert_eq!(result.len(), 1);
        assert!((result[0].1 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn empty_index_returns_nothing() {
        let forest = ForestBuilder::default().build(&EmbeddingMatrix::default(), 10, Some(1));
        assert!(forest.is_empty());
        assert!(forest.query_nearest(&[1.0, 0.0], 1, None).is_empty());
    }

    #[test]
    fn zero_k_returns_nothing() {
        let m = random_matrix(5, 4, 10);
        let forest = RandomProjectionForest::build(&m, 2, 4, Some(1));
        assert!(forest.query_nearest(m.row(0), 0, None).is_empty());
    }
}
