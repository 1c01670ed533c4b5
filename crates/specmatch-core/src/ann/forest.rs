//! Random Projection Tree Forest — the sole ANN backend.
//!
//! Pure Rust implementation of the Random Projection Tree Forest algorithm
//! (popularized by Spotify as "Annoy").
//!
//! **Technical Name**: Random Projection Tree Forest
//! **Vendor Name**: Annoy (Spotify)
//!
//! Algorithm:
//! - Forest of independent random projection trees
//! - Random hyperplane splits at each node
//! - Multiple trees improve recall through ensemble search
//! - Thread-safe search (read-only once built)
//!
//! # References
//!
//! - Dasgupta & Freund (2008): "Random projection trees and low dimensional manifolds"
//! - Spotify Engineering Blog: "Annoy: Approximate Nearest Neighbors in C++/Python"

use crate::error::SearchError;
use crate::simd;
use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Random Projection Tree Forest index over one charge state's library vectors.
#[derive(Serialize, Deserialize)]
pub struct RPForest {
    pub(crate) vectors: Vec<f32>,
    pub(crate) dimension: usize,
    pub(crate) num_vectors: usize,
    params: RPForestParams,
    built: bool,
    pub(crate) trees: Vec<RPTree>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RPForestParams {
    /// Number of trees in the forest. Index-affecting (`config.num_trees`).
    pub num_trees: usize,
    pub tree_params: RPTreeParams,
    /// RNG seed. The search driver always seeds `0` for build-time determinism.
    pub seed: u64,
}

impl Default for RPForestParams {
    fn default() -> Self {
        Self {
            num_trees: 10,
            tree_params: RPTreeParams::default(),
            seed: 0,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub(crate) struct RPTree {
    root: Option<TreeNode>,
}

#[derive(Serialize, Deserialize)]
enum TreeNode {
    Leaf { indices: Vec<u32> },
    Internal {
        hyperplane: Vec<f32>,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RPTreeParams {
    pub max_leaf_size: usize,
}

impl Default for RPTreeParams {
    fn default() -> Self {
        Self { max_leaf_size: 10 }
    }
}

impl RPForest {
    pub fn new(dimension: usize, params: RPForestParams) -> Result<Self, SearchError> {
        if dimension == 0 {
            return Err(SearchError::BadArgument("ANN dimension must be positive".into()));
        }
        Ok(Self {
            vectors: Vec::new(),
            dimension,
            num_vectors: 0,
            params,
            built: false,
            trees: Vec::new(),
        })
    }

    pub fn add(&mut self, vector: &[f32]) -> Result<(), SearchError> {
        if self.built {
            return Err(SearchError::BackendFailure(
                "cannot add vectors after the index is built".into(),
            ));
        }
        if vector.len() != self.dimension {
            return Err(SearchError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.vectors.extend_from_slice(vector);
        self.num_vectors += 1;
        Ok(())
    }

    /// Build `params.num_trees` independent trees, seeded for determinism. The RNG is
    /// threaded sequentially across all trees so a given `(seed, vectors, num_trees)`
    /// triple always produces the same forest.
    pub fn build(&mut self) -> Result<(), SearchError> {
        if self.built {
            return Ok(());
        }
        if self.num_vectors == 0 {
            return Err(SearchError::BackendFailure("cannot build an empty index".into()));
        }
        let mut rng = ChaCha8Rng::seed_from_u64(self.params.seed);
        self.trees = Vec::with_capacity(self.params.num_trees);
        for _ in 0..self.params.num_trees {
            let tree = self.build_tree(&mut rng);
            self.trees.push(tree);
        }
        self.built = true;
        Ok(())
    }

    fn random_hyperplane(&self, rng: &mut ChaCha8Rng) -> Vec<f32> {
        let mut hyperplane = Vec::with_capacity(self.dimension);
        let mut norm = 0.0f32;
        for _ in 0..self.dimension {
            let val = rng.gen::<f32>() * 2.0 - 1.0;
            norm += val * val;
            hyperplane.push(val);
        }
        let norm = norm.sqrt();
        if norm > 0.0 {
            for val in &mut hyperplane {
                *val /= norm;
            }
        }
        hyperplane
    }

    fn build_tree(&self, rng: &mut ChaCha8Rng) -> RPTree {
        let indices: Vec<u32> = (0..self.num_vectors as u32).collect();
        let root = self.build_tree_recursive(&indices, rng);
        RPTree { root }
    }

    fn build_tree_recursive(&self, indices: &[u32], rng: &mut ChaCha8Rng) -> Option<TreeNode> {
        if indices.is_empty() {
            return None;
        }
        if indices.len() <= self.params.tree_params.max_leaf_size {
            return Some(TreeNode::Leaf { indices: indices.to_vec() });
        }

        let hyperplane = self.random_hyperplane(rng);
        let mut left_indices = Vec::new();
        let mut right_indices = Vec::new();
        for &idx in indices {
            let vec = self.get_vector(idx as usize);
            if simd::dot(vec, &hyperplane) < 0.0 {
                left_indices.push(idx);
            } else {
                right_indices.push(idx);
            }
        }

        // A degenerate split (everything on one side) would recurse forever; fall back
        // to a leaf rather than looping on an ever-shrinking single branch.
        if left_indices.is_empty() || right_indices.is_empty() {
            return Some(TreeNode::Leaf { indices: indices.to_vec() });
        }

        let left = self
            .build_tree_recursive(&left_indices, rng)
            .unwrap_or(TreeNode::Leaf { indices: Vec::new() });
        let right = self
            .build_tree_recursive(&right_indices, rng)
            .unwrap_or(TreeNode::Leaf { indices: Vec::new() });

        Some(TreeNode::Internal {
            hyperplane,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Union of candidate local indices across every tree, exact-reranked by cosine
    /// distance (`1 - dot(query, vector)`), and truncated to `k`.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(u32, f32)>, SearchError> {
        if !self.built {
            return Err(SearchError::BackendFailure("index must be built before search".into()));
        }
        if query.len() != self.dimension {
            return Err(SearchError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut candidate_set = std::collections::HashSet::new();
        for tree in &self.trees {
            if let Some(ref root) = tree.root {
                for idx in self.search_tree(root, query) {
                    candidate_set.insert(idx);
                }
            }
        }

        let mut results: Vec<(u32, f32)> = candidate_set
            .iter()
            .map(|&idx| {
                let vec = self.get_vector(idx as usize);
                (idx, 1.0 - simd::dot(query, vec))
            })
            .collect();
        results.sort_unstable_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(k);
        Ok(results)
    }

    fn search_tree(&self, node: &TreeNode, query: &[f32]) -> Vec<u32> {
        match node {
            TreeNode::Leaf { indices } => indices.clone(),
            TreeNode::Internal { hyperplane, left, right } => {
                if simd::dot(query, hyperplane) < 0.0 {
                    self.search_tree(left, query)
                } else {
                    self.search_tree(right, query)
                }
            }
        }
    }

    fn get_vector(&self, idx: usize) -> &[f32] {
        let start = idx * self.dimension;
        &self.vectors[start..start + self.dimension]
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn num_vectors(&self) -> usize {
        self.num_vectors
    }

    pub fn size_bytes(&self) -> usize {
        self.vectors.len() * std::mem::size_of::<f32>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_forest(vectors: &[Vec<f32>], seed: u64) -> RPForest {
        let dim = vectors[0].len();
        let params = RPForestParams {
            num_trees: 4,
            tree_params: RPTreeParams { max_leaf_size: 2 },
            seed,
        };
        let mut forest = RPForest::new(dim, params).unwrap();
        for v in vectors {
            forest.add(v).unwrap();
        }
        forest.build().unwrap();
        forest
    }

    #[test]
    fn same_seed_yields_identical_results() {
        let vectors: Vec<Vec<f32>> = (0..50)
            .map(|i| vec![(i as f32).sin(), (i as f32).cos(), i as f32 * 0.1])
            .collect();
        let f1 = build_forest(&vectors, 0);
        let f2 = build_forest(&vectors, 0);
        let query = vec![0.5, 0.5, 0.5];
        assert_eq!(f1.search(&query, 5).unwrap(), f2.search(&query, 5).unwrap());
    }

    #[test]
    fn search_rejects_wrong_dimension() {
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let forest = build_forest(&vectors, 0);
        assert!(forest.search(&[1.0, 0.0, 0.0], 1).is_err());
    }

    #[test]
    fn finds_self_as_nearest() {
        let vectors: Vec<Vec<f32>> = (0..30)
            .map(|i| vec![(i as f32) / 30.0, 1.0 - (i as f32) / 30.0])
            .collect();
        let forest = build_forest(&vectors, 0);
        let query = vectors[10].clone();
        let results = forest.search(&query, 1).unwrap();
        assert_eq!(results[0].0, 10);
    }
}
