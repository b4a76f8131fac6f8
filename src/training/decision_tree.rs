//! Regression tree

use crate::error::{PricerError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Decision tree node.
///
/// Nodes live in a flat arena owned by the tree; `left` and `right` are
/// indices into it, so the serialized form has constant nesting depth
/// however deep the tree grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf { value: f64, n_samples: usize },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: usize,
        right: usize,
        n_samples: usize,
        impurity: f64,
    },
}

/// Best split found for a node
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// CART regression tree with the squared error criterion.
///
/// At every node `max_features` candidate features are drawn without
/// replacement. If none of them separates the node, the remaining features
/// are tried as well, so a node only becomes a leaf when no feature can split it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Node arena; index 0 is the root, empty until fitted
    nodes: Vec<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: Option<usize>,
    pub seed: u64,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 0,
            n_features: 0,
            feature_importances: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fit the tree to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(PricerError::ShapeMismatch {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 || n_features == 0 {
            return Err(PricerError::TrainingError(
                "cannot fit a tree on empty data".to_string(),
            ));
        }

        self.n_features = n_features;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut importances = vec![0.0; n_features];

        let indices: Vec<usize> = (0..n_samples).collect();
        let mut nodes = Vec::new();
        self.build_tree(x, y, &indices, 0, &mut nodes, &mut importances, &mut rng);
        self.nodes = nodes;

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    /// Grow the subtree for `indices` into `nodes` and return its index
    #[allow(clippy::too_many_arguments)]
    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        nodes: &mut Vec<TreeNode>,
        importances: &mut [f64],
        rng: &mut ChaCha8Rng,
    ) -> usize {
        let node_idx = nodes.len();
        let n_samples = indices.len();
        let (sum, sq_sum) = indices
            .iter()
            .fold((0.0, 0.0), |(s, sq), &i| (s + y[i], sq + y[i] * y[i]));
        let value = sum / n_samples as f64;
        let impurity = variance(n_samples, sum, sq_sum);

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || is_pure(y, indices);

        let split = if should_stop {
            None
        } else {
            self.find_best_split(x, y, indices, impurity, rng)
        };
        let split = match split {
            Some(split) => split,
            None => {
                nodes.push(TreeNode::Leaf { value, n_samples });
                return node_idx;
            }
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, split.feature_idx]] <= split.threshold);

        importances[split.feature_idx] += n_samples as f64 * split.gain;

        // Reserve the slot so the parent precedes its children
        nodes.push(TreeNode::Leaf { value, n_samples });
        let left = self.build_tree(x, y, &left_indices, depth + 1, nodes, importances, rng);
        let right = self.build_tree(x, y, &right_indices, depth + 1, nodes, importances, rng);

        nodes[node_idx] = TreeNode::Split {
            feature_idx: split.feature_idx,
            threshold: split.threshold,
            left,
            right,
            n_samples,
            impurity,
        };
        node_idx
    }

    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<SplitCandidate> {
        let n_features = x.ncols();
        let n_candidates = self.max_features.unwrap_or(n_features).clamp(1, n_features);

        let mut features: Vec<usize> = (0..n_features).collect();
        features.shuffle(rng);

        let mut best: Option<SplitCandidate> = None;
        for (tried, &feature_idx) in features.iter().enumerate() {
            if tried >= n_candidates && best.is_some() {
                break;
            }
            if let Some(candidate) = self.best_split_on(x, y, indices, feature_idx, parent_impurity) {
                if best.as_ref().map_or(true, |b| candidate.gain > b.gain) {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    /// Sweep the sorted values of one feature, tracking running sums
    fn best_split_on(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        feature_idx: usize,
        parent_impurity: f64,
    ) -> Option<SplitCandidate> {
        let mut sorted: Vec<(f64, f64)> = indices.iter().map(|&i| (x[[i, feature_idx]], y[i])).collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = sorted.len();
        let (total_sum, total_sq) = sorted
            .iter()
            .fold((0.0, 0.0), |(s, sq), &(_, yi)| (s + yi, sq + yi * yi));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        let mut best: Option<SplitCandidate> = None;

        for k in 0..n - 1 {
            let (xk, yk) = sorted[k];
            left_sum += yk;
            left_sq += yk * yk;

            let next = sorted[k + 1].0;
            if next <= xk {
                continue;
            }
            let left_count = k + 1;
            let right_count = n - left_count;
            if left_count < self.min_samples_leaf || right_count < self.min_samples_leaf {
                continue;
            }

            let weighted = (left_count as f64 * variance(left_count, left_sum, left_sq)
                + right_count as f64
                    * variance(right_count, total_sum - left_sum, total_sq - left_sq))
                / n as f64;
            let gain = parent_impurity - weighted;

            if gain > 0.0 && best.as_ref().map_or(true, |b| gain > b.gain) {
                let mut threshold = xk + (next - xk) / 2.0;
                // Midpoint can round up to the right value for adjacent floats
                if threshold >= next {
                    threshold = xk;
                }
                best = Some(SplitCandidate {
                    feature_idx,
                    threshold,
                    gain,
                });
            }
        }
        best
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.nodes.is_empty() {
            return Err(PricerError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(PricerError::ShapeMismatch {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(x.rows().into_iter().map(|row| predict_row(&self.nodes, row)).collect())
    }

    /// Predict a single row without a shape check
    pub(crate) fn predict_one(&self, row: ArrayView1<f64>) -> Option<f64> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(predict_row(&self.nodes, row))
        }
    }

    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Number of levels on the longest root-to-leaf path
    pub fn get_depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 1usize)];
        while let Some((idx, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let TreeNode::Split { left, right, .. } = self.nodes[idx] {
                stack.push((left, depth + 1));
                stack.push((right, depth + 1));
            }
        }
        max_depth
    }

    pub fn get_n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, TreeNode::Leaf { .. }))
            .count()
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }
}

/// Population variance from count, sum and sum of squares
fn variance(count: usize, sum: f64, sq_sum: f64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let n = count as f64;
    (sq_sum / n - (sum / n).powi(2)).max(0.0)
}

fn is_pure(y: &Array1<f64>, indices: &[usize]) -> bool {
    match indices.first() {
        None => true,
        Some(&first) => indices.iter().all(|&i| (y[i] - y[first]).abs() < 1e-10),
    }
}

fn predict_row(nodes: &[TreeNode], row: ArrayView1<f64>) -> f64 {
    let mut idx = 0;
    loop {
        match &nodes[idx] {
            TreeNode::Leaf { value, .. } => return *value,
            TreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
                ..
            } => {
                idx = if row[*feature_idx] <= *threshold { *left } else { *right };
            }
        }
    }
}
