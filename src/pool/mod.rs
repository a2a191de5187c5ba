//! Estimator pool: an ordered collection of base-model slots
//!
//! The pool owns its slots exclusively, fits each exactly once, and hands
//! downstream combiners a prediction matrix whose column order always
//! equals slot insertion order. It never exposes per-model internals
//! beyond that matrix.

use crate::error::{EnsembleError, Result};
use crate::estimators::{Estimator, EstimatorKind};
use crate::model_selection::{CrossValidator, RandomizedSearch, Scoring};
use ndarray::{Array1, Array2};
use std::collections::HashMap;
use tracing::{debug, info};

/// Prediction matrix: rows = samples, columns = one slot prediction each,
/// column order = slot insertion order.
pub type PredictionMatrix = Array2<f64>;

/// One named base-model slot.
///
/// Lifecycle: unfit, optional search, fit, frozen. The committed model is
/// never refit.
pub struct EstimatorSlot {
    name: String,
    kind: EstimatorKind,
    model: Option<Box<dyn Estimator>>,
}

impl EstimatorSlot {
    fn new(kind: EstimatorKind) -> Self {
        Self {
            name: kind.name().to_string(),
            kind,
            model: None,
        }
    }

    /// Slot name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Committed model type
    pub fn kind(&self) -> EstimatorKind {
        self.kind
    }

    fn model(&self) -> Result<&dyn Estimator> {
        self.model.as_deref().ok_or(EnsembleError::NotFitted {
            component: "estimator pool",
        })
    }
}

/// Ordered, fixed-size pool of estimator slots with a fit-once lifecycle.
///
/// `comprehensive_search` is chosen at construction: when set,
/// [`fit_with_tuning`] lets every candidate model type compete for each
/// slot instead of tuning only the slot's own type. Both variants satisfy
/// the same interface.
///
/// A pool instance is mutated only during its single permitted fit;
/// repeat fits are idempotent no-ops, not mutual exclusion.
///
/// [`fit_with_tuning`]: EstimatorPool::fit_with_tuning
pub struct EstimatorPool {
    slots: Vec<EstimatorSlot>,
    comprehensive_search: bool,
    is_fitted: bool,
}

impl std::fmt::Debug for EstimatorPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EstimatorPool")
            .field(
                "slots",
                &self.slots.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("comprehensive_search", &self.comprehensive_search)
            .field("is_fitted", &self.is_fitted)
            .finish()
    }
}

impl EstimatorPool {
    /// Create a pool with the default slot per candidate model type.
    pub fn new(comprehensive_search: bool) -> Self {
        Self::with_slots(&EstimatorKind::ALL, comprehensive_search)
    }

    /// Create a pool with one slot per given kind, in order.
    pub fn with_slots(kinds: &[EstimatorKind], comprehensive_search: bool) -> Self {
        Self {
            slots: kinds.iter().map(|&k| EstimatorSlot::new(k)).collect(),
            comprehensive_search,
            is_fitted: false,
        }
    }

    /// Build an already-fitted pool from named models. Intended for fixed
    /// deterministic pools; the models are treated as frozen.
    ///
    /// An empty model list is rejected, matching the guard on
    /// [`fit`](EstimatorPool::fit).
    pub fn from_fitted(models: Vec<(String, Box<dyn Estimator>)>) -> Result<Self> {
        if models.is_empty() {
            return Err(EnsembleError::Validation(
                "estimator pool has no slots".to_string(),
            ));
        }
        let slots = models
            .into_iter()
            .map(|(name, model)| EstimatorSlot {
                name,
                // Placeholder type tag; the committed model is what counts
                kind: EstimatorKind::DecisionTree,
                model: Some(model),
            })
            .collect();
        Ok(Self {
            slots,
            comprehensive_search: false,
            is_fitted: true,
        })
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when the pool has no slots
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// True once fit has committed every slot
    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Slot names in insertion order
    pub fn slot_names(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.name()).collect()
    }

    /// Fit every slot independently on the full training set.
    ///
    /// Strictly once per instance: a second call is an idempotent no-op.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if self.is_fitted {
            return Ok(());
        }
        self.check_nonempty()?;

        info!(n_slots = self.slots.len(), "fitting estimator pool");
        for slot in &mut self.slots {
            let mut model = slot.kind.build(&HashMap::new());
            model.fit(x, y)?;
            slot.model = Some(model);
        }
        self.is_fitted = true;
        Ok(())
    }

    /// Fit every slot through a randomized cross-validated search, then
    /// commit each slot's winner refit on the full training set.
    ///
    /// Same fit-once lifecycle as [`fit`](EstimatorPool::fit).
    pub fn fit_with_tuning(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        cv: &CrossValidator,
        scoring: Scoring,
        n_iter: usize,
        seed: u64,
    ) -> Result<()> {
        if self.is_fitted {
            return Ok(());
        }
        self.check_nonempty()?;

        info!(
            n_slots = self.slots.len(),
            comprehensive = self.comprehensive_search,
            metric = %scoring,
            "tuning estimator pool"
        );
        let comprehensive = self.comprehensive_search;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let kinds: Vec<EstimatorKind> = if comprehensive {
                EstimatorKind::ALL.to_vec()
            } else {
                vec![slot.kind]
            };

            let search = RandomizedSearch::new(n_iter).with_seed(seed.wrapping_add(i as u64));
            let outcome = search.run(&kinds, x, y, cv, scoring)?;
            debug!(
                slot = slot.name.as_str(),
                winner = outcome.kind.name(),
                score = outcome.score,
                "slot committed"
            );

            let mut model = outcome.kind.build(&outcome.params);
            model.fit(x, y)?;
            slot.kind = outcome.kind;
            slot.model = Some(model);
        }
        self.is_fitted = true;
        Ok(())
    }

    /// Predict one label column per slot.
    ///
    /// Fails with `NotFitted` before fit. Column order equals slot
    /// insertion order, deterministically, across repeated calls.
    pub fn predict(&self, x: &Array2<f64>) -> Result<PredictionMatrix> {
        self.check_fitted()?;

        let mut matrix = Array2::zeros((x.nrows(), self.slots.len()));
        for (j, slot) in self.slots.iter().enumerate() {
            let col = slot.model()?.predict(x)?;
            matrix.column_mut(j).assign(&col);
        }
        Ok(matrix)
    }

    /// Predict one per-class probability matrix per slot, in slot order.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<Array2<f64>>> {
        self.check_fitted()?;

        self.slots
            .iter()
            .map(|slot| slot.model()?.predict_proba(x))
            .collect()
    }

    fn check_fitted(&self) -> Result<()> {
        if !self.is_fitted {
            return Err(EnsembleError::NotFitted {
                component: "estimator pool",
            });
        }
        Ok(())
    }

    fn check_nonempty(&self) -> Result<()> {
        if self.slots.is_empty() {
            return Err(EnsembleError::Validation(
                "estimator pool has no slots".to_string(),
            ));
        }
        Ok(())
    }
}
