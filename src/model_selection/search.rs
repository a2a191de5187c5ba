//! Randomized cross-validated hyperparameter search

use super::{CrossValidator, Scoring};
use crate::error::Result;
use crate::estimators::{EstimatorKind, ParamScale};
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Winner of a randomized search: the committed kind, its parameters and
/// the mean cross-validation score that selected it.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub kind: EstimatorKind,
    pub params: HashMap<String, f64>,
    pub score: f64,
}

#[derive(Debug, Clone)]
struct Candidate {
    kind: EstimatorKind,
    params: HashMap<String, f64>,
}

/// Randomized search over one or more estimator kinds.
///
/// Every (candidate, fold) pair is evaluated on the rayon pool; the winner
/// is deterministic for a fixed seed (ties resolve to the earliest
/// candidate).
#[derive(Debug, Clone)]
pub struct RandomizedSearch {
    /// Parameter candidates sampled per kind
    pub n_iter: usize,
    /// Seed for candidate sampling
    pub seed: u64,
}

impl RandomizedSearch {
    /// Create a search drawing `n_iter` candidates per kind
    pub fn new(n_iter: usize) -> Self {
        Self { n_iter, seed: 42 }
    }

    /// Set the sampling seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Run the search and return the cross-validation winner.
    ///
    /// Fit failures inside a candidate are not masked; they propagate.
    pub fn run(
        &self,
        kinds: &[EstimatorKind],
        x: &Array2<f64>,
        y: &Array1<f64>,
        cv: &CrossValidator,
        scoring: Scoring,
    ) -> Result<SearchOutcome> {
        let candidates = self.sample_candidates(kinds);
        let splits = cv.split(x.nrows(), Some(y))?;

        // One task per (candidate, fold) pair
        let pairs: Vec<(usize, usize)> = (0..candidates.len())
            .flat_map(|c| (0..splits.len()).map(move |f| (c, f)))
            .collect();

        let fold_scores: Result<Vec<(usize, f64)>> = pairs
            .par_iter()
            .map(|&(c, f)| {
                let candidate = &candidates[c];
                let split = &splits[f];

                let x_train = x.select(Axis(0), &split.train_indices);
                let y_train = y.select(Axis(0), &split.train_indices);
                let x_test = x.select(Axis(0), &split.test_indices);
                let y_test = y.select(Axis(0), &split.test_indices);

                let mut model = candidate.kind.build(&candidate.params);
                model.fit(&x_train, &y_train)?;
                let y_pred = model.predict(&x_test)?;
                Ok((c, scoring.score(&y_test, &y_pred)))
            })
            .collect();

        let mut sums = vec![0.0; candidates.len()];
        let mut counts = vec![0usize; candidates.len()];
        for (c, score) in fold_scores? {
            sums[c] += score;
            counts[c] += 1;
        }

        let mut best_idx = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (c, (&sum, &count)) in sums.iter().zip(counts.iter()).enumerate() {
            let mean = if count > 0 { sum / count as f64 } else { 0.0 };
            if mean > best_score {
                best_score = mean;
                best_idx = c;
            }
        }

        let winner = &candidates[best_idx];
        debug!(
            kind = winner.kind.name(),
            score = best_score,
            metric = %scoring,
            "search winner selected"
        );

        Ok(SearchOutcome {
            kind: winner.kind,
            params: winner.params.clone(),
            score: best_score,
        })
    }

    fn sample_candidates(&self, kinds: &[EstimatorKind]) -> Vec<Candidate> {
        let mut candidates = Vec::with_capacity(kinds.len() * (self.n_iter + 1));
        for (k, &kind) in kinds.iter().enumerate() {
            // Defaults always compete, so tuning can never do worse than
            // the untuned model on the CV estimate
            candidates.push(Candidate {
                kind,
                params: HashMap::new(),
            });

            let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(k as u64));
            for _ in 0..self.n_iter {
                let mut params = HashMap::new();
                for spec in kind.search_space() {
                    let value = match spec.scale {
                        ParamScale::Linear => rng.gen_range(spec.low..=spec.high),
                        ParamScale::Log => {
                            let (lo, hi) = (spec.low.ln(), spec.high.ln());
                            rng.gen_range(lo..=hi).exp()
                        }
                        ParamScale::Integer => {
                            rng.gen_range(spec.low as i64..=spec.high as i64) as f64
                        }
                    };
                    params.insert(spec.name.to_string(), value);
                }
                candidates.push(Candidate { kind, params });
            }
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_selection::CVStrategy;
    use ndarray::array;

    fn toy_data() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [0.0, 0.1],
            [0.1, 0.0],
            [0.2, 0.2],
            [0.1, 0.3],
            [0.9, 1.0],
            [1.0, 0.9],
            [0.8, 0.8],
            [1.1, 1.0]
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_search_finds_scoring_candidate() {
        let (x, y) = toy_data();
        let cv = CrossValidator::new(CVStrategy::StratifiedKFold {
            n_splits: 2,
            shuffle: true,
        })
        .with_random_state(0);

        let search = RandomizedSearch::new(3).with_seed(1);
        let outcome = search
            .run(&[EstimatorKind::DecisionTree], &x, &y, &cv, Scoring::Accuracy)
            .unwrap();

        assert_eq!(outcome.kind, EstimatorKind::DecisionTree);
        assert!(outcome.score > 0.5, "separable data should score well");
    }

    #[test]
    fn test_search_is_deterministic() {
        let (x, y) = toy_data();
        let cv = CrossValidator::new(CVStrategy::StratifiedKFold {
            n_splits: 2,
            shuffle: true,
        })
        .with_random_state(0);

        let search = RandomizedSearch::new(3).with_seed(9);
        let a = search
            .run(&EstimatorKind::ALL, &x, &y, &cv, Scoring::Accuracy)
            .unwrap();
        let b = search
            .run(&EstimatorKind::ALL, &x, &y, &cv, Scoring::Accuracy)
            .unwrap();

        assert_eq!(a.kind, b.kind);
        assert_eq!(a.score, b.score);
    }
}
