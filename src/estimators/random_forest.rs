//! Random forest classifier

use super::decision_tree::DecisionTree;
use super::Estimator;
use crate::error::{EnsembleError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Random forest of gini decision trees, fitted in parallel on bootstrap
/// samples with sqrt feature subsampling. Default ruler for the stacking
/// combiner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth per tree
    pub max_depth: Option<usize>,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Random state
    pub random_state: Option<u64>,
    classes: Vec<f64>,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RandomForest {
    /// Create a new forest
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_leaf: 1,
            random_state: None,
            classes: Vec::new(),
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Number of fitted trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn check_fitted(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(EnsembleError::NotFitted {
                component: "random forest",
            });
        }
        Ok(())
    }
}

impl Estimator for RandomForest {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(EnsembleError::Shape {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if x.nrows() == 0 {
            return Err(EnsembleError::Validation(
                "cannot fit a forest on zero samples".to_string(),
            ));
        }

        let mut classes: Vec<f64> = y.iter().copied().collect();
        classes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        classes.dedup();

        let n_samples = x.nrows();
        let n_features = x.ncols();
        let max_features = (n_features as f64).sqrt().ceil() as usize;
        let base_seed = self.random_state.unwrap_or(42);

        let trees: Result<Vec<DecisionTree>> = (0..self.n_estimators)
            .into_par_iter()
            .map(|t| {
                let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(t as u64));
                let indices: Vec<usize> =
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();

                let xb = x.select(Axis(0), &indices);
                let yb = y.select(Axis(0), &indices);

                let mut tree = DecisionTree::new()
                    .with_min_samples_leaf(self.min_samples_leaf)
                    .with_max_features(max_features)
                    .with_random_state(base_seed.wrapping_add(t as u64));
                if let Some(depth) = self.max_depth {
                    tree = tree.with_max_depth(depth);
                }
                tree.fit_with_classes(&xb, &yb, classes.clone())?;
                Ok(tree)
            })
            .collect();

        self.trees = trees?;
        self.classes = classes;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(Array1::from_iter((0..proba.nrows()).map(|i| {
            let arg = proba
                .row(i)
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(j, _)| j)
                .unwrap_or(0);
            self.classes[arg]
        })))
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_fitted()?;

        let mut proba = Array2::zeros((x.nrows(), self.classes.len()));
        for tree in &self.trees {
            proba = proba + tree.predict_proba(x)?;
        }
        proba /= self.trees.len() as f64;
        Ok(proba)
    }
}
