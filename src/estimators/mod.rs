//! Base-model library: the estimator contract and the candidate model types
//!
//! Every model in the pool (and the stacking ruler) satisfies [`Estimator`]:
//! fit once, predict class indices, predict per-class probabilities.

mod decision_tree;
mod linear;
mod naive_bayes;
mod random_forest;

pub use decision_tree::{DecisionTree, TreeNode};
pub use linear::LogisticRegression;
pub use naive_bayes::GaussianNaiveBayes;
pub use random_forest::RandomForest;

use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Contract shared by pool slots and the stacking ruler.
///
/// `predict` returns class indices as f64; `predict_proba` returns one row
/// per sample with columns in class-index order, each row summing to 1.
pub trait Estimator: Send + Sync {
    /// Fit the model to training data.
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict class indices.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Predict per-class probabilities, shape (n_samples, n_classes).
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>>;
}

/// Candidate base-model types available to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstimatorKind {
    RandomForest,
    LogisticRegression,
    GaussianNaiveBayes,
    DecisionTree,
}

/// Scale on which a hyperparameter is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamScale {
    /// Uniform in [low, high]
    Linear,
    /// Log-uniform in [low, high]
    Log,
    /// Uniform integer in [low, high]
    Integer,
}

/// One dimension of a hyperparameter search space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub low: f64,
    pub high: f64,
    pub scale: ParamScale,
}

impl EstimatorKind {
    /// All candidate types, in the order used by comprehensive search.
    pub const ALL: [EstimatorKind; 4] = [
        EstimatorKind::RandomForest,
        EstimatorKind::LogisticRegression,
        EstimatorKind::GaussianNaiveBayes,
        EstimatorKind::DecisionTree,
    ];

    /// Human-readable name, also used as the default slot name.
    pub fn name(&self) -> &'static str {
        match self {
            EstimatorKind::RandomForest => "random forest classifier",
            EstimatorKind::LogisticRegression => "logistic regression",
            EstimatorKind::GaussianNaiveBayes => "gaussian naive bayes",
            EstimatorKind::DecisionTree => "decision tree classifier",
        }
    }

    /// Randomized search space owned by this model type.
    pub fn search_space(&self) -> Vec<ParamSpec> {
        match self {
            EstimatorKind::RandomForest => vec![
                ParamSpec {
                    name: "n_estimators",
                    low: 10.0,
                    high: 150.0,
                    scale: ParamScale::Integer,
                },
                ParamSpec {
                    name: "max_depth",
                    low: 2.0,
                    high: 16.0,
                    scale: ParamScale::Integer,
                },
            ],
            EstimatorKind::LogisticRegression => vec![
                ParamSpec {
                    name: "learning_rate",
                    low: 1e-3,
                    high: 1.0,
                    scale: ParamScale::Log,
                },
                ParamSpec {
                    name: "max_iter",
                    low: 50.0,
                    high: 500.0,
                    scale: ParamScale::Integer,
                },
            ],
            EstimatorKind::GaussianNaiveBayes => vec![ParamSpec {
                name: "var_smoothing",
                low: 1e-12,
                high: 1e-6,
                scale: ParamScale::Log,
            }],
            EstimatorKind::DecisionTree => vec![
                ParamSpec {
                    name: "max_depth",
                    low: 2.0,
                    high: 16.0,
                    scale: ParamScale::Integer,
                },
                ParamSpec {
                    name: "min_samples_split",
                    low: 2.0,
                    high: 10.0,
                    scale: ParamScale::Integer,
                },
            ],
        }
    }

    /// Build an unfit model of this type with the given hyperparameters.
    ///
    /// Missing parameters fall back to the model's defaults.
    pub fn build(&self, params: &HashMap<String, f64>) -> Box<dyn Estimator> {
        match self {
            EstimatorKind::RandomForest => {
                let mut model = RandomForest::new(
                    params.get("n_estimators").map(|v| *v as usize).unwrap_or(100),
                );
                if let Some(depth) = params.get("max_depth") {
                    model = model.with_max_depth(*depth as usize);
                }
                Box::new(model)
            }
            EstimatorKind::LogisticRegression => {
                let mut model = LogisticRegression::new();
                if let Some(lr) = params.get("learning_rate") {
                    model = model.with_learning_rate(*lr);
                }
                if let Some(iter) = params.get("max_iter") {
                    model = model.with_max_iter(*iter as usize);
                }
                Box::new(model)
            }
            EstimatorKind::GaussianNaiveBayes => {
                let mut model = GaussianNaiveBayes::new();
                if let Some(vs) = params.get("var_smoothing") {
                    model = model.with_var_smoothing(*vs);
                }
                Box::new(model)
            }
            EstimatorKind::DecisionTree => {
                let mut model = DecisionTree::new();
                if let Some(depth) = params.get("max_depth") {
                    model = model.with_max_depth(*depth as usize);
                }
                if let Some(mss) = params.get("min_samples_split") {
                    model = model.with_min_samples_split(*mss as usize);
                }
                Box::new(model)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_build_with_params() {
        let mut params = HashMap::new();
        params.insert("max_depth".to_string(), 3.0);
        let mut model = EstimatorKind::DecisionTree.build(&params);

        let x = array![[0.0], [0.1], [0.9], [1.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        model.fit(&x, &y).unwrap();
        let pred = model.predict(&x).unwrap();
        assert_eq!(pred, y);
    }

    #[test]
    fn test_search_space_nonempty() {
        for kind in EstimatorKind::ALL {
            assert!(!kind.search_space().is_empty());
        }
    }
}
