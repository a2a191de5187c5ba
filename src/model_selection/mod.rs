//! Cross-validation, scoring metrics and randomized hyperparameter search

mod cross_validation;
mod search;

pub use cross_validation::{adapted_cross_validator, CVSplit, CVStrategy, CrossValidator};
pub use search::{RandomizedSearch, SearchOutcome};

use crate::error::{EnsembleError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scoring metric used to compare search candidates.
///
/// Precision, recall and F1 are macro-averaged over the classes present
/// in the true labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scoring {
    Accuracy,
    Precision,
    Recall,
    F1,
}

impl Default for Scoring {
    fn default() -> Self {
        Scoring::Accuracy
    }
}

impl Scoring {
    /// Score predictions against true labels; higher is better.
    pub fn score(&self, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        match self {
            Scoring::Accuracy => accuracy(y_true, y_pred),
            Scoring::Precision => macro_average(y_true, y_pred, |tp, fp, _| safe_div(tp, tp + fp)),
            Scoring::Recall => macro_average(y_true, y_pred, |tp, _, fn_| safe_div(tp, tp + fn_)),
            Scoring::F1 => macro_average(y_true, y_pred, |tp, fp, fn_| {
                let p = safe_div(tp, tp + fp);
                let r = safe_div(tp, tp + fn_);
                if p + r > 0.0 {
                    2.0 * p * r / (p + r)
                } else {
                    0.0
                }
            }),
        }
    }
}

impl FromStr for Scoring {
    type Err = EnsembleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "accuracy" => Ok(Scoring::Accuracy),
            "precision" => Ok(Scoring::Precision),
            "recall" => Ok(Scoring::Recall),
            "f1" => Ok(Scoring::F1),
            other => Err(EnsembleError::Validation(format!(
                "unknown scoring metric '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Scoring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scoring::Accuracy => "accuracy",
            Scoring::Precision => "precision",
            Scoring::Recall => "recall",
            Scoring::F1 => "f1",
        };
        write!(f, "{name}")
    }
}

fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| (**t - **p).abs() < 0.5)
        .count();
    correct as f64 / y_true.len() as f64
}

fn safe_div(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

fn macro_average(
    y_true: &Array1<f64>,
    y_pred: &Array1<f64>,
    per_class: impl Fn(f64, f64, f64) -> f64,
) -> f64 {
    let mut classes: Vec<f64> = y_true.iter().copied().collect();
    classes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    classes.dedup();
    if classes.is_empty() {
        return 0.0;
    }

    let mut total = 0.0;
    for &class in &classes {
        let mut tp = 0.0;
        let mut fp = 0.0;
        let mut fn_ = 0.0;
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            let t_is = (t - class).abs() < 0.5;
            let p_is = (p - class).abs() < 0.5;
            match (t_is, p_is) {
                (true, true) => tp += 1.0,
                (false, true) => fp += 1.0,
                (true, false) => fn_ += 1.0,
                (false, false) => {}
            }
        }
        total += per_class(tp, fp, fn_);
    }
    total / classes.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_accuracy() {
        let y_true = array![0.0, 1.0, 1.0, 0.0];
        let y_pred = array![0.0, 1.0, 0.0, 0.0];
        assert!((Scoring::Accuracy.score(&y_true, &y_pred) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_f1_perfect() {
        let y = array![0.0, 1.0, 1.0, 0.0];
        assert!((Scoring::F1.score(&y, &y) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_scoring_from_str() {
        assert_eq!("accuracy".parse::<Scoring>().unwrap(), Scoring::Accuracy);
        assert_eq!("f1".parse::<Scoring>().unwrap(), Scoring::F1);
        assert!("auc".parse::<Scoring>().is_err());
    }
}
