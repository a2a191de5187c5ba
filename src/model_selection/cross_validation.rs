//! Cross-validation splitters

use crate::error::{EnsembleError, Result};
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Cross-validation strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CVStrategy {
    /// K-Fold cross-validation
    KFold { n_splits: usize, shuffle: bool },
    /// Stratified K-Fold (maintains class distribution)
    StratifiedKFold { n_splits: usize, shuffle: bool },
}

impl Default for CVStrategy {
    fn default() -> Self {
        CVStrategy::StratifiedKFold {
            n_splits: 10,
            shuffle: true,
        }
    }
}

/// A single train/test split
#[derive(Debug, Clone)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Cross-validation splitter, consumed by the pool as a black box
pub struct CrossValidator {
    strategy: CVStrategy,
    random_state: Option<u64>,
}

impl CrossValidator {
    /// Create a new cross-validator
    pub fn new(strategy: CVStrategy) -> Self {
        Self {
            strategy,
            random_state: None,
        }
    }

    /// Set random state for reproducibility
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Generate train/test splits
    pub fn split(&self, n_samples: usize, y: Option<&Array1<f64>>) -> Result<Vec<CVSplit>> {
        match &self.strategy {
            CVStrategy::KFold { n_splits, shuffle } => {
                self.k_fold_split(n_samples, *n_splits, *shuffle)
            }
            CVStrategy::StratifiedKFold { n_splits, shuffle } => {
                let y = y.ok_or_else(|| {
                    EnsembleError::Validation(
                        "StratifiedKFold requires target array".to_string(),
                    )
                })?;
                self.stratified_k_fold_split(y, *n_splits, *shuffle)
            }
        }
    }

    fn rng(&self) -> ChaCha8Rng {
        match self.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    fn k_fold_split(&self, n_samples: usize, n_splits: usize, shuffle: bool) -> Result<Vec<CVSplit>> {
        if n_splits < 2 {
            return Err(EnsembleError::Validation(
                "n_splits must be at least 2".to_string(),
            ));
        }
        if n_samples < n_splits {
            return Err(EnsembleError::Validation(format!(
                "n_samples ({}) must be >= n_splits ({})",
                n_samples, n_splits
            )));
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        if shuffle {
            indices.shuffle(&mut self.rng());
        }

        let fold_sizes: Vec<usize> = (0..n_splits)
            .map(|i| {
                let base = n_samples / n_splits;
                let remainder = n_samples % n_splits;
                if i < remainder {
                    base + 1
                } else {
                    base
                }
            })
            .collect();

        let mut splits = Vec::with_capacity(n_splits);
        let mut current = 0;

        for (fold_idx, &fold_size) in fold_sizes.iter().enumerate() {
            let test_indices: Vec<usize> = indices[current..current + fold_size].to_vec();
            let train_indices: Vec<usize> = indices[..current]
                .iter()
                .chain(indices[current + fold_size..].iter())
                .copied()
                .collect();

            splits.push(CVSplit {
                train_indices,
                test_indices,
                fold_idx,
            });
            current += fold_size;
        }

        Ok(splits)
    }

    fn stratified_k_fold_split(
        &self,
        y: &Array1<f64>,
        n_splits: usize,
        shuffle: bool,
    ) -> Result<Vec<CVSplit>> {
        if n_splits < 2 {
            return Err(EnsembleError::Validation(
                "n_splits must be at least 2".to_string(),
            ));
        }

        // Group samples by class, preserving class order
        let mut class_values: Vec<i64> = y.iter().map(|&v| v.round() as i64).collect();
        class_values.sort_unstable();
        class_values.dedup();

        let mut rng = self.rng();
        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); n_splits];

        for class in class_values {
            let mut indices: Vec<usize> = y
                .iter()
                .enumerate()
                .filter(|(_, &v)| v.round() as i64 == class)
                .map(|(i, _)| i)
                .collect();
            if shuffle {
                indices.shuffle(&mut rng);
            }
            for (i, idx) in indices.into_iter().enumerate() {
                folds[i % n_splits].push(idx);
            }
        }

        let mut splits = Vec::with_capacity(n_splits);
        for fold_idx in 0..n_splits {
            let test_indices = folds[fold_idx].clone();
            let train_indices: Vec<usize> = folds
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != fold_idx)
                .flat_map(|(_, f)| f.iter().copied())
                .collect();

            splits.push(CVSplit {
                train_indices,
                test_indices,
                fold_idx,
            });
        }

        Ok(splits)
    }
}

/// Build a splitter adapted to the dataset size: stratified k-fold with the
/// fold count clamped so every fold keeps at least two samples. Fold
/// shuffling is seeded by the caller.
pub fn adapted_cross_validator(n_samples: usize, n_splits: usize, seed: u64) -> CrossValidator {
    let clamped = n_splits.min(n_samples / 2).max(2);
    CrossValidator::new(CVStrategy::StratifiedKFold {
        n_splits: clamped,
        shuffle: true,
    })
    .with_random_state(seed)
}
