//! Logistic regression classifier

use super::Estimator;
use crate::error::{EnsembleError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Logistic regression trained by gradient descent.
///
/// Binary problems use a single sigmoid model; multiclass problems fall
/// back to one-vs-rest with normalized per-class scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Gradient descent step size
    pub learning_rate: f64,
    /// Number of gradient descent iterations
    pub max_iter: usize,
    /// L2 penalty strength
    pub l2: f64,
    weights: Vec<Array1<f64>>,
    intercepts: Vec<f64>,
    classes: Vec<f64>,
    is_fitted: bool,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    /// Create a new model with default hyperparameters
    pub fn new() -> Self {
        Self {
            learning_rate: 0.1,
            max_iter: 200,
            l2: 0.0,
            weights: Vec::new(),
            intercepts: Vec::new(),
            classes: Vec::new(),
            is_fitted: false,
        }
    }

    /// Set the learning rate
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Set the iteration count
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the L2 penalty
    pub fn with_l2(mut self, l2: f64) -> Self {
        self.l2 = l2;
        self
    }

    fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
        z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
    }

    /// Fit one sigmoid model against a binary 0/1 target.
    fn fit_binary(&self, x: &Array2<f64>, target: &Array1<f64>) -> (Array1<f64>, f64) {
        let n = x.nrows() as f64;
        let mut w = Array1::zeros(x.ncols());
        let mut b = 0.0;

        for _ in 0..self.max_iter {
            let linear = x.dot(&w) + b;
            let residual = Self::sigmoid(&linear) - target;
            let grad_w = x.t().dot(&residual) / n + self.l2 * &w;
            let grad_b = residual.sum() / n;
            w = w - self.learning_rate * grad_w;
            b -= self.learning_rate * grad_b;
        }

        (w, b)
    }

    fn check_fitted(&self) -> Result<()> {
        if !self.is_fitted {
            return Err(EnsembleError::NotFitted {
                component: "logistic regression",
            });
        }
        Ok(())
    }
}

impl Estimator for LogisticRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(EnsembleError::Shape {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }

        let mut classes: Vec<f64> = y.iter().copied().collect();
        classes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        classes.dedup();
        if classes.len() < 2 {
            return Err(EnsembleError::Training(
                "logistic regression needs at least two classes".to_string(),
            ));
        }

        self.weights.clear();
        self.intercepts.clear();

        if classes.len() == 2 {
            let target = y.mapv(|v| if (v - classes[1]).abs() < f64::EPSILON { 1.0 } else { 0.0 });
            let (w, b) = self.fit_binary(x, &target);
            self.weights.push(w);
            self.intercepts.push(b);
        } else {
            for &class in &classes {
                let target = y.mapv(|v| if (v - class).abs() < f64::EPSILON { 1.0 } else { 0.0 });
                let (w, b) = self.fit_binary(x, &target);
                self.weights.push(w);
                self.intercepts.push(b);
            }
        }

        self.classes = classes;
        self.is_fitted = true;
        Ok(())
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
        self.check_fitted()?;

        if self.classes.len() == 2 {
            let linear = x.dot(&self.weights[0]) + self.intercepts[0];
            let p = Self::sigmoid(&linear);
            let mut proba = Array2::zeros((x.nrows(), 2));
            for (i, &pi) in p.iter().enumerate() {
                proba[[i, 0]] = 1.0 - pi;
                proba[[i, 1]] = pi;
            }
            return Ok(proba);
        }

        // One-vs-rest scores normalized per row
        let mut proba = Array2::zeros((x.nrows(), self.classes.len()));
        for (j, (w, &b)) in self.weights.iter().zip(self.intercepts.iter()).enumerate() {
            let p = Self::sigmoid(&(x.dot(w) + b));
            for (i, &pi) in p.iter().enumerate() {
                proba[[i, j]] = pi;
            }
        }
        for mut row in proba.axis_iter_mut(Axis(0)) {
            let sum: f64 = row.sum();
            if sum > 0.0 {
                row.mapv_inplace(|v| v / sum);
            } else {
                let uniform = 1.0 / self.classes.len() as f64;
                row.fill(uniform);
            }
        }
        Ok(proba)
    }
}
