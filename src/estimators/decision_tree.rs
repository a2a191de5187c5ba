//! Decision tree classifier

use super::Estimator;
use crate::error::{EnsembleError, Result};
use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with a normalized class distribution
    Leaf {
        distribution: Vec<f64>,
        n_samples: usize,
    },
    /// Internal node with a split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// Decision tree classifier with gini splits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Number of features considered per split (all when None)
    pub max_features: Option<usize>,
    /// Random state for feature subsampling
    pub random_state: Option<u64>,
    classes: Vec<f64>,
    n_features: usize,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    /// Create a new classifier tree
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_state: None,
            classes: Vec::new(),
            n_features: 0,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Set features considered per split
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fit against a fixed class list, so trees trained on resampled data
    /// (bootstrap samples may miss a class) still emit full-width
    /// probability rows.
    pub(crate) fn fit_with_classes(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        classes: Vec<f64>,
    ) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(EnsembleError::Shape {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(EnsembleError::Validation(
                "cannot fit a tree on zero samples".to_string(),
            ));
        }

        self.n_features = x.ncols();
        self.classes = classes;

        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state.unwrap_or(0));
        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_tree(x, y, &indices, 0, &mut rng));
        Ok(())
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let distribution = self.class_distribution(y, indices);

        let should_stop = n_samples < self.min_samples_split
            || self.max_depth.is_some_and(|d| depth >= d)
            || Self::is_pure(&distribution);

        if should_stop {
            return TreeNode::Leaf {
                distribution,
                n_samples,
            };
        }

        if let Some((feature_idx, threshold)) = self.find_best_split(x, y, indices, rng) {
            let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| x[[i, feature_idx]] <= threshold);

            if left_indices.len() < self.min_samples_leaf
                || right_indices.len() < self.min_samples_leaf
            {
                return TreeNode::Leaf {
                    distribution,
                    n_samples,
                };
            }

            let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, rng));
            let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1, rng));

            TreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
            }
        } else {
            TreeNode::Leaf {
                distribution,
                n_samples,
            }
        }
    }

    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64)> {
        let n_features = x.ncols();
        let features: Vec<usize> = match self.max_features {
            Some(m) if m < n_features => rand::seq::index::sample(rng, n_features, m).into_vec(),
            _ => (0..n_features).collect(),
        };

        let parent_impurity = Self::gini(&self.class_distribution(y, indices));
        let mut best: Option<(usize, f64, f64)> = None;

        for &feature_idx in &features {
            let mut values: Vec<f64> = indices.iter().map(|&i| x[[i, feature_idx]]).collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            values.dedup();

            for pair in values.windows(2) {
                let threshold = (pair[0] + pair[1]) / 2.0;
                let (left, right): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| x[[i, feature_idx]] <= threshold);
                if left.is_empty() || right.is_empty() {
                    continue;
                }

                let weighted = (left.len() as f64
                    * Self::gini(&self.class_distribution(y, &left))
                    + right.len() as f64 * Self::gini(&self.class_distribution(y, &right)))
                    / indices.len() as f64;
                let gain = parent_impurity - weighted;

                if gain > 1e-12 && best.map_or(true, |(_, _, g)| gain > g) {
                    best = Some((feature_idx, threshold, gain));
                }
            }
        }

        best.map(|(f, t, _)| (f, t))
    }

    fn class_distribution(&self, y: &Array1<f64>, indices: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0; self.classes.len()];
        for &i in indices {
            if let Some(pos) = self
                .classes
                .iter()
                .position(|&c| (c - y[i]).abs() < f64::EPSILON)
            {
                counts[pos] += 1.0;
            }
        }
        let total: f64 = counts.iter().sum();
        if total > 0.0 {
            for c in &mut counts {
                *c /= total;
            }
        }
        counts
    }

    fn gini(distribution: &[f64]) -> f64 {
        1.0 - distribution.iter().map(|p| p * p).sum::<f64>()
    }

    fn is_pure(distribution: &[f64]) -> bool {
        distribution.iter().any(|&p| (p - 1.0).abs() < 1e-12)
    }

    fn leaf_for_row(&self, x: &Array2<f64>, row: usize) -> Result<&[f64]> {
        let mut node = self.root.as_ref().ok_or(EnsembleError::NotFitted {
            component: "decision tree",
        })?;
        loop {
            match node {
                TreeNode::Leaf { distribution, .. } => return Ok(distribution),
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[[row, *feature_idx]] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

impl Estimator for DecisionTree {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let mut classes: Vec<f64> = y.iter().copied().collect();
        classes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        classes.dedup();
        self.fit_with_classes(x, y, classes)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(Array1::from_iter((0..proba.nrows()).map(|i| {
            let row = proba.row(i);
            let arg = row
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(j, _)| j)
                .unwrap_or(0);
            self.classes[arg]
        })))
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let n_classes = self.classes.len();
        let mut proba = Array2::zeros((x.nrows(), n_classes));
        for i in 0..x.nrows() {
            let distribution = self.leaf_for_row(x, i)?;
            for (j, &p) in distribution.iter().enumerate() {
                proba[[i, j]] = p;
            }
        }
        Ok(proba)
    }
}
