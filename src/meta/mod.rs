//! Meta-models: combination strategies over the estimator pool
//!
//! Two concrete strategies share the [`MetaModel`] facade:
//! [`DemocraticModel`] (hard/soft voting) and [`OneRulerForAll`]
//! (stacking through a secondary "ruler" model).

mod democratic;
mod orfa;

pub use democratic::DemocraticModel;
pub use orfa::OneRulerForAll;

use crate::data::{FeatureSchema, LabelEncoder};
use crate::error::Result;
use ndarray::{Array1, Array2};
use polars::prelude::{DataFrame, Series};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Voting mode, fixed at construction. Switching modes afterwards is not
/// supported; capability gating dispatches on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Voting {
    /// Majority vote over discrete predictions
    Hard,
    /// Average of per-class probability estimates
    Soft,
}

impl Voting {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Voting::Hard => "hard",
            Voting::Soft => "soft",
        }
    }
}

impl fmt::Display for Voting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared configuration for meta-models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaModelConfig {
    /// Let every candidate model type compete for each pool slot
    pub comprehensive_search: bool,
    /// Run randomized hyperparameter search before committing each slot
    pub parameter_tuning: bool,
    /// Metric comparing search candidates
    pub scoring: crate::model_selection::Scoring,
    /// Cross-validation fold count (clamped to the dataset size)
    pub n_splits: usize,
    /// Parameter candidates sampled per kind during tuning
    pub n_iter: usize,
    /// Seed for search sampling and fold shuffling
    pub random_seed: Option<u64>,
}

impl Default for MetaModelConfig {
    fn default() -> Self {
        Self {
            comprehensive_search: true,
            parameter_tuning: true,
            scoring: crate::model_selection::Scoring::Accuracy,
            n_splits: 10,
            n_iter: 20,
            random_seed: None,
        }
    }
}

impl MetaModelConfig {
    /// Disable both search layers; slots fit with default parameters
    pub fn without_tuning(mut self) -> Self {
        self.comprehensive_search = false;
        self.parameter_tuning = false;
        self
    }

    /// Set the scoring metric
    pub fn with_scoring(mut self, scoring: crate::model_selection::Scoring) -> Self {
        self.scoring = scoring;
        self
    }

    /// Set the fold count
    pub fn with_n_splits(mut self, n_splits: usize) -> Self {
        self.n_splits = n_splits;
        self
    }

    /// Set the per-kind candidate count
    pub fn with_n_iter(mut self, n_iter: usize) -> Self {
        self.n_iter = n_iter;
        self
    }

    /// Set the random seed
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }
}

/// State captured by a successful fit: the feature schema and the label
/// mapping. Predict-family calls are defined only when this exists.
#[derive(Debug, Clone)]
pub(crate) struct FittedState {
    pub(crate) schema: FeatureSchema,
    pub(crate) labels: LabelEncoder,
}

/// Public facade shared by all combination strategies.
///
/// `predict` returns class indices into the alphabetically ordered class
/// list captured at fit time; `transform` is an identity pass-through for
/// pipeline composition.
pub trait MetaModel: fmt::Display {
    /// Fit the bound pool (and any secondary model) on the dataset.
    fn fit(&mut self, x: &DataFrame, y: &Series) -> Result<()>;

    /// Predict class indices for every row.
    fn predict(&self, x: &DataFrame) -> Result<Array1<f64>>;

    /// Predict per-class probabilities for every row.
    fn predict_proba(&self, x: &DataFrame) -> Result<Array2<f64>>;

    /// Identity pass-through, kept for pipeline-composition contracts.
    fn transform<'a>(&self, x: &'a DataFrame) -> &'a DataFrame {
        x
    }
}

/// Row-wise argmax as class indices. Ties resolve to the lowest index.
pub(crate) fn argmax_rows(matrix: &Array2<f64>) -> Array1<f64> {
    Array1::from_iter((0..matrix.nrows()).map(|i| {
        let row = matrix.row(i);
        let mut best = 0usize;
        for (j, &v) in row.iter().enumerate() {
            if v > row[best] {
                best = j;
            }
        }
        best as f64
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_argmax_rows() {
        let m = array![[0.1, 0.9], [0.7, 0.3], [0.5, 0.5]];
        let args = argmax_rows(&m);
        assert_eq!(args[0], 1.0);
        assert_eq!(args[1], 0.0);
        // Ties go to the lowest class index
        assert_eq!(args[2], 0.0);
    }

    #[test]
    fn test_voting_display() {
        assert_eq!(Voting::Hard.to_string(), "hard");
        assert_eq!(Voting::Soft.to_string(), "soft");
    }
}
