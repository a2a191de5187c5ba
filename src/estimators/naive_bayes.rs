//! Gaussian Naive Bayes classifier

use super::Estimator;
use crate::error::{EnsembleError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Gaussian Naive Bayes with per-class feature means and variances
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianNaiveBayes {
    /// Variance floor added to every feature variance
    pub var_smoothing: f64,
    classes: Vec<f64>,
    priors: Vec<f64>,
    means: Vec<Array1<f64>>,
    variances: Vec<Array1<f64>>,
}

impl Default for GaussianNaiveBayes {
    fn default() -> Self {
        Self::new()
    }
}

impl GaussianNaiveBayes {
    /// Create a new model with the default smoothing
    pub fn new() -> Self {
        Self {
            var_smoothing: 1e-9,
            classes: Vec::new(),
            priors: Vec::new(),
            means: Vec::new(),
            variances: Vec::new(),
        }
    }

    /// Set the variance smoothing floor
    pub fn with_var_smoothing(mut self, var_smoothing: f64) -> Self {
        self.var_smoothing = var_smoothing;
        self
    }

    fn check_fitted(&self) -> Result<()> {
        if self.classes.is_empty() {
            return Err(EnsembleError::NotFitted {
                component: "gaussian naive bayes",
            });
        }
        Ok(())
    }

    fn log_likelihoods(&self, x: &Array2<f64>) -> Array2<f64> {
        let n_samples = x.nrows();
        let n_classes = self.classes.len();
        let mut ll = Array2::zeros((n_samples, n_classes));

        for (k, ((mean, var), &prior)) in self
            .means
            .iter()
            .zip(self.variances.iter())
            .zip(self.priors.iter())
            .enumerate()
        {
            for i in 0..n_samples {
                let mut logp = prior.ln();
                for j in 0..x.ncols() {
                    let v = var[j];
                    let d = x[[i, j]] - mean[j];
                    logp += -0.5 * (2.0 * std::f64::consts::PI * v).ln() - d * d / (2.0 * v);
                }
                ll[[i, k]] = logp;
            }
        }

        ll
    }
}

impl Estimator for GaussianNaiveBayes {
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

        let n_features = x.ncols();
        let mut priors = Vec::with_capacity(classes.len());
        let mut means = Vec::with_capacity(classes.len());
        let mut variances = Vec::with_capacity(classes.len());

        for &class in &classes {
            let indices: Vec<usize> = y
                .iter()
                .enumerate()
                .filter(|(_, &v)| (v - class).abs() < f64::EPSILON)
                .map(|(i, _)| i)
                .collect();
            let count = indices.len() as f64;

            let mut mean = Array1::zeros(n_features);
            for &i in &indices {
                for j in 0..n_features {
                    mean[j] += x[[i, j]];
                }
            }
            mean /= count;

            let mut var = Array1::zeros(n_features);
            for &i in &indices {
                for j in 0..n_features {
                    let d = x[[i, j]] - mean[j];
                    var[j] += d * d;
                }
            }
            var /= count;
            var += self.var_smoothing;

            priors.push(count / y.len() as f64);
            means.push(mean);
            variances.push(var);
        }

        self.classes = classes;
        self.priors = priors;
        self.means = means;
        self.variances = variances;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.check_fitted()?;
        let ll = self.log_likelihoods(x);
        Ok(Array1::from_iter((0..ll.nrows()).map(|i| {
            let arg = ll
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
        let ll = self.log_likelihoods(x);
        let mut proba = Array2::zeros(ll.raw_dim());

        for i in 0..ll.nrows() {
            let row = ll.row(i);
            let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let exps: Vec<f64> = row.iter().map(|&v| (v - max).exp()).collect();
            let sum: f64 = exps.iter().sum();
            for (j, &e) in exps.iter().enumerate() {
                proba[[i, j]] = e / sum;
            }
        }

        Ok(proba)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_nb_separable() {
        let x = array![[0.0, 0.1], [0.1, 0.0], [0.2, 0.1], [5.0, 5.1], [5.1, 5.0], [5.2, 5.1]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut model = GaussianNaiveBayes::new();
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_nb_proba_rows_sum_to_one() {
        let x = array![[0.0], [0.1], [5.0], [5.1]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut model = GaussianNaiveBayes::new();
        model.fit(&x, &y).unwrap();
        let proba = model.predict_proba(&x).unwrap();
        for i in 0..proba.nrows() {
            assert!((proba.row(i).sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_nb_unfit_fails() {
        let model = GaussianNaiveBayes::new();
        let x = array![[0.0]];
        assert!(model.predict(&x).is_err());
    }
}
