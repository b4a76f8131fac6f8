//! Random forest regressor

use super::decision_tree::DecisionTree;
use crate::error::{PricerError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Strategy for the number of features sampled per split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Fixed number, clamped to the feature count
    Fixed(usize),
    /// All features
    All,
}

/// Bagged ensemble of regression trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    /// Fraction of rows drawn for each bootstrap sample
    pub max_samples: f64,
    pub bootstrap: bool,
    pub oob_score: bool,
    pub random_state: Option<u64>,
    oob_score_value: Option<f64>,
    feature_importances: Option<Array1<f64>>,
    n_features: usize,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RandomForest {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            max_samples: 1.0,
            bootstrap: true,
            oob_score: false,
            random_state: None,
            oob_score_value: None,
            feature_importances: None,
            n_features: 0,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_max_samples(mut self, fraction: f64) -> Self {
        self.max_samples = fraction;
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn with_oob_score(mut self, oob_score: bool) -> Self {
        self.oob_score = oob_score;
        self
    }

    fn compute_max_features(&self, n_features: usize) -> usize {
        match self.max_features {
            MaxFeatures::Fixed(n) => n.min(n_features),
            MaxFeatures::All => n_features,
        }
        .max(1)
    }

    /// Rows drawn per tree: `round(max_samples * n)`, at least one
    fn bootstrap_size(&self, n_samples: usize) -> usize {
        ((n_samples as f64 * self.max_samples).round() as usize).clamp(1, n_samples)
    }

    /// Fit the forest to training data
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
            return Err(PricerError::TrainingError(format!(
                "cannot fit a forest on a {}x{} matrix",
                n_samples, n_features
            )));
        }
        if self.n_estimators == 0 {
            return Err(PricerError::TrainingError("n_estimators must be at least 1".to_string()));
        }
        if !(self.max_samples > 0.0 && self.max_samples <= 1.0) {
            return Err(PricerError::TrainingError(format!(
                "max_samples must be in (0, 1], got {}",
                self.max_samples
            )));
        }

        self.n_features = n_features;
        let max_features = self.compute_max_features(n_features);
        let sample_size = self.bootstrap_size(n_samples);
        let base_seed = self.random_state.unwrap_or(42);

        // Each tree derives everything from its own seed, so the result does
        // not depend on how rayon schedules the work.
        let fitted: Vec<(DecisionTree, Vec<usize>)> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(tree_idx as u64));

                let sample_indices: Vec<usize> = if self.bootstrap {
                    (0..sample_size).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };

                let x_boot = x.select(Axis(0), &sample_indices);
                let y_boot = y.select(Axis(0), &sample_indices);

                let mut tree = DecisionTree::new()
                    .with_min_samples_split(self.min_samples_split)
                    .with_min_samples_leaf(self.min_samples_leaf)
                    .with_max_features(max_features)
                    .with_seed(rng.next_u64());
                if let Some(d) = self.max_depth {
                    tree = tree.with_max_depth(d);
                }
                tree.fit(&x_boot, &y_boot)?;

                Ok((tree, sample_indices))
            })
            .collect::<Result<Vec<_>>>()?;

        self.oob_score_value = if self.oob_score && self.bootstrap {
            compute_oob_score(&fitted, x, y)
        } else {
            None
        };
        self.trees = fitted.into_iter().map(|(tree, _)| tree).collect();
        self.compute_feature_importances();

        Ok(self)
    }

    fn compute_feature_importances(&mut self) {
        if self.trees.is_empty() {
            return;
        }

        let mut total = vec![0.0; self.n_features];
        for tree in &self.trees {
            if let Some(imp) = tree.feature_importances() {
                for (acc, &val) in total.iter_mut().zip(imp.iter()) {
                    *acc += val;
                }
            }
        }

        let sum: f64 = total.iter().sum();
        if sum > 0.0 {
            for imp in &mut total {
                *imp /= sum;
            }
        }
        self.feature_importances = Some(Array1::from_vec(total));
    }

    /// Mean of the per-tree predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(PricerError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(PricerError::ShapeMismatch {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        let all_predictions: Vec<Array1<f64>> = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<Vec<_>>>()?;

        let mut sum = Array1::<f64>::zeros(x.nrows());
        for preds in &all_predictions {
            sum += preds;
        }
        Ok(sum / all_predictions.len() as f64)
    }

    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Out-of-bag R², when it was requested and computable
    pub fn oob_score_value(&self) -> Option<f64> {
        self.oob_score_value
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

/// R² of each row's mean prediction over the trees that did not see it
fn compute_oob_score(fitted: &[(DecisionTree, Vec<usize>)], x: &Array2<f64>, y: &Array1<f64>) -> Option<f64> {
    let n_samples = x.nrows();
    let mut sums = vec![0.0; n_samples];
    let mut counts = vec![0usize; n_samples];

    for (tree, sample_indices) in fitted {
        let mut in_bag = vec![false; n_samples];
        for &i in sample_indices {
            in_bag[i] = true;
        }
        for (i, row) in x.rows().into_iter().enumerate() {
            if in_bag[i] {
                continue;
            }
            if let Some(pred) = tree.predict_one(row) {
                sums[i] += pred;
                counts[i] += 1;
            }
        }
    }

    let scored: Vec<(f64, f64)> = (0..n_samples)
        .filter(|&i| counts[i] > 0)
        .map(|i| (y[i], sums[i] / counts[i] as f64))
        .collect();
    if scored.len() < n_samples {
        tracing::warn!(
            without_oob = n_samples - scored.len(),
            "Some rows were never out of bag; OOB score uses the remaining rows"
        );
    }
    if scored.len() < 2 {
        return None;
    }

    let mean = scored.iter().map(|(t, _)| t).sum::<f64>() / scored.len() as f64;
    let ss_tot: f64 = scored.iter().map(|(t, _)| (t - mean).powi(2)).sum();
    let ss_res: f64 = scored.iter().map(|(t, p)| (t - p).powi(2)).sum();
    if ss_tot == 0.0 {
        return None;
    }
    Some(1.0 - ss_res / ss_tot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_regressor() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0];

        let mut rf = RandomForest::new(10).with_random_state(42);
        rf.fit(&x, &y).unwrap();

        let predictions = rf.predict(&x).unwrap();
        let mse: f64 = predictions
            .iter()
            .zip(y.iter())
            .map(|(p, a)| (p - a).powi(2))
            .sum::<f64>()
            / y.len() as f64;

        assert!(mse < 2.0, "MSE too high: {}", mse);
        assert_eq!(rf.n_trees(), 10);
    }

    #[test]
    fn test_no_bootstrap_fits_exactly() {
        let x = array![[1.0, 0.5], [2.0, 0.1], [3.0, 0.9]];
        let y = array![100.0, 250.0, 175.0];

        let mut rf = RandomForest::new(5).with_bootstrap(false).with_random_state(7);
        rf.fit(&x, &y).unwrap();

        let predictions = rf.predict(&x).unwrap();
        for (p, a) in predictions.iter().zip(y.iter()) {
            assert!((p - a).abs() < 1e-9);
        }
    }

    #[test]
    fn test_deterministic_given_seed() {
        let x = Array2::from_shape_fn((40, 3), |(i, j)| ((i * 7 + j * 13) % 11) as f64);
        let y = Array1::from_shape_fn(40, |i| (i % 5) as f64 * 10.0);

        let fit = || {
            let mut rf = RandomForest::new(8)
                .with_max_features(MaxFeatures::Fixed(2))
                .with_max_samples(0.7)
                .with_random_state(3);
            rf.fit(&x, &y).unwrap();
            rf.predict(&x).unwrap()
        };
        assert_eq!(fit(), fit());
    }

    #[test]
    fn test_oob_score_computed() {
        let x = Array2::from_shape_fn((60, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(60, |i| 2.0 * i as f64);

        let mut rf = RandomForest::new(30)
            .with_max_samples(0.7)
            .with_oob_score(true)
            .with_random_state(42);
        rf.fit(&x, &y).unwrap();

        let oob = rf.oob_score_value().unwrap();
        assert!(oob > 0.8, "OOB R² too low: {}", oob);
    }

    #[test]
    fn test_feature_importances() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![1.0, 2.0, 3.0, 4.0];

        let mut rf = RandomForest::new(10).with_random_state(42);
        rf.fit(&x, &y).unwrap();

        let importances = rf.feature_importances().unwrap();
        assert_eq!(importances.len(), 2);
        assert!(importances[0] >= importances[1]);
    }

    #[test]
    fn test_rejects_bad_max_samples() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 2.0];
        let mut rf = RandomForest::new(2).with_max_samples(0.0);
        assert!(matches!(rf.fit(&x, &y), Err(PricerError::TrainingError(_))));
    }
}
