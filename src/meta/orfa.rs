//! Stacking meta-model ("one ruler for all")

use super::{FittedState, MetaModel, MetaModelConfig};
use crate::data::{check_class_balance, FeatureSchema, LabelEncoder};
use crate::error::{EnsembleError, Result};
use crate::estimators::{Estimator, RandomForest};
use crate::model_selection::adapted_cross_validator;
use crate::pool::EstimatorPool;
use ndarray::{Array1, Array2};
use polars::prelude::{DataFrame, Series};
use std::fmt;
use tracing::info;

/// Stacking meta-model: a secondary "ruler" model is trained on the
/// pool's prediction matrix to decide which pool member might be right.
///
/// The ruler is any [`Estimator`]; it defaults to a random forest. Both
/// `predict` and `predict_proba` are always available once fitted, and
/// both forward the pool's prediction matrix to the ruler unchanged.
pub struct OneRulerForAll {
    config: MetaModelConfig,
    pool: EstimatorPool,
    ruler: Box<dyn Estimator>,
    ruler_fitted: bool,
    fitted: Option<FittedState>,
}

impl OneRulerForAll {
    /// Create a stacking model with the default ruler and configuration
    pub fn new() -> Self {
        Self::with_config(MetaModelConfig::default())
    }

    /// Create a stacking model with an explicit configuration
    pub fn with_config(config: MetaModelConfig) -> Self {
        let pool = EstimatorPool::new(config.comprehensive_search);
        Self {
            config,
            pool,
            ruler: Box::new(RandomForest::default()),
            ruler_fitted: false,
            fitted: None,
        }
    }

    /// Replace the default ruler
    pub fn with_ruler(mut self, ruler: Box<dyn Estimator>) -> Self {
        self.ruler = ruler;
        self
    }

    /// Replace the bound pool, e.g. with a pre-fitted fixed pool
    pub fn with_pool(mut self, pool: EstimatorPool) -> Self {
        self.pool = pool;
        self
    }

    /// Ordered class names captured at fit time
    pub fn classes(&self) -> Option<&[String]> {
        self.fitted.as_ref().map(|s| s.labels.classes())
    }

    fn state(&self) -> Result<&FittedState> {
        self.fitted.as_ref().ok_or(EnsembleError::NotFitted {
            component: "estimator pool",
        })
    }

    fn check_ruler(&self) -> Result<()> {
        if !self.ruler_fitted {
            return Err(EnsembleError::NotFitted { component: "ruler" });
        }
        Ok(())
    }

    fn pool_outputs(&self, x: &DataFrame) -> Result<Array2<f64>> {
        let state = self.state()?;
        let xm = state.schema.extract(x)?;
        self.pool.predict(&xm)
    }
}

impl Default for OneRulerForAll {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaModel for OneRulerForAll {
    fn fit(&mut self, x: &DataFrame, y: &Series) -> Result<()> {
        let labels = LabelEncoder::fit(y)?;
        let y_enc = labels.encode(y)?;
        check_class_balance(&y_enc, labels.classes())?;

        info!(strategy = %self, "training models");

        let schema = match &self.fitted {
            Some(state) => state.schema.clone(),
            None => FeatureSchema::from_frame(x),
        };
        let xm = schema.extract(x)?;
        let seed = self.config.random_seed.unwrap_or(42);

        if self.config.parameter_tuning {
            let cv = adapted_cross_validator(xm.nrows(), self.config.n_splits, seed);
            self.pool.fit_with_tuning(
                &xm,
                &y_enc,
                &cv,
                self.config.scoring,
                self.config.n_iter,
                seed,
            )?;
        } else {
            self.pool.fit(&xm, &y_enc)?;
        }

        // The ruler learns on the pool's outputs for the training set
        let matrix = self.pool.predict(&xm)?;
        self.ruler.fit(&matrix, &y_enc)?;
        self.ruler_fitted = true;

        if self.fitted.is_none() {
            self.fitted = Some(FittedState { schema, labels });
        }
        Ok(())
    }

    fn predict(&self, x: &DataFrame) -> Result<Array1<f64>> {
        let matrix = self.pool_outputs(x)?;
        self.check_ruler()?;
        self.ruler.predict(&matrix)
    }

    fn predict_proba(&self, x: &DataFrame) -> Result<Array2<f64>> {
        let matrix = self.pool_outputs(x)?;
        self.check_ruler()?;
        self.ruler.predict_proba(&matrix)
    }
}

impl fmt::Display for OneRulerForAll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ORFA")
    }
}
