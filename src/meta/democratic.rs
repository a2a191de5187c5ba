//! Hard/soft voting meta-model

use super::{argmax_rows, FittedState, MetaModel, MetaModelConfig, Voting};
use crate::data::{check_class_balance, FeatureSchema, LabelEncoder};
use crate::error::{EnsembleError, Result};
use crate::model_selection::adapted_cross_validator;
use crate::pool::EstimatorPool;
use ndarray::{Array1, Array2};
use polars::prelude::{DataFrame, Series};
use std::fmt;
use tracing::info;

/// Voting meta-model: the trained pool votes to decide the output.
///
/// The voting mode is fixed at construction. In hard mode the only
/// probability-like output is [`predict_proportion`]; in soft mode it is
/// `predict_proba`. Calling the other one fails with `ModeUnavailable`
/// before any prediction work happens. Classes are assumed to be in
/// alphabetical order.
///
/// [`predict_proportion`]: DemocraticModel::predict_proportion
pub struct DemocraticModel {
    config: MetaModelConfig,
    voting: Voting,
    pool: EstimatorPool,
    fitted: Option<FittedState>,
    n_estimators: usize,
}

impl DemocraticModel {
    /// Create a voting model with the default configuration
    pub fn new(voting: Voting) -> Self {
        Self::with_config(voting, MetaModelConfig::default())
    }

    /// Create a voting model with an explicit configuration
    pub fn with_config(voting: Voting, config: MetaModelConfig) -> Self {
        let pool = EstimatorPool::new(config.comprehensive_search);
        Self {
            config,
            voting,
            pool,
            fitted: None,
            n_estimators: 0,
        }
    }

    /// Replace the bound pool, e.g. with a pre-fitted fixed pool
    pub fn with_pool(mut self, pool: EstimatorPool) -> Self {
        self.pool = pool;
        self
    }

    /// Configured voting mode
    pub fn voting(&self) -> Voting {
        self.voting
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

    /// Per-sample share of model votes for each class: `[1 - p, p]` where
    /// `p` is the fraction of base models voting for the positive class
    /// (class index 1). Hard mode only; binary labels only.
    pub fn predict_proportion(&self, x: &DataFrame) -> Result<Array2<f64>> {
        if self.voting == Voting::Soft {
            return Err(EnsembleError::ModeUnavailable {
                method: "predict_proportion",
                voting: self.voting.as_str(),
            });
        }
        let state = self.state()?;
        if state.labels.n_classes() != 2 {
            return Err(EnsembleError::Validation(
                "hard-vote proportions are defined for binary labels only".to_string(),
            ));
        }

        let xm = state.schema.extract(x)?;
        let matrix = self.pool.predict(&xm)?;
        let n = self.n_estimators as f64;

        let mut proportions = Array2::zeros((matrix.nrows(), 2));
        for i in 0..matrix.nrows() {
            // Votes are encoded class indices, so the row sum counts the
            // positive-class votes
            let p = matrix.row(i).sum() / n;
            proportions[[i, 0]] = 1.0 - p;
            proportions[[i, 1]] = p;
        }
        Ok(proportions)
    }

    fn predict_proba_soft(&self, x: &DataFrame) -> Result<Array2<f64>> {
        if self.voting == Voting::Hard {
            return Err(EnsembleError::ModeUnavailable {
                method: "predict_proba",
                voting: self.voting.as_str(),
            });
        }
        let state = self.state()?;

        let xm = state.schema.extract(x)?;
        let probas = self.pool.predict_proba(&xm)?;
        let n = probas.len() as f64;

        let mut mean = Array2::zeros(probas[0].raw_dim());
        for p in &probas {
            mean = mean + p;
        }
        mean /= n;
        Ok(mean)
    }
}

impl MetaModel for DemocraticModel {
    fn fit(&mut self, x: &DataFrame, y: &Series) -> Result<()> {
        let labels = LabelEncoder::fit(y)?;
        let y_enc = labels.encode(y)?;
        check_class_balance(&y_enc, labels.classes())?;

        info!(strategy = %self, "training models");

        let schema = FeatureSchema::from_frame(x);
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

        self.n_estimators = self.pool.len();
        if self.fitted.is_none() {
            self.fitted = Some(FittedState { schema, labels });
        }
        Ok(())
    }

    fn predict(&self, x: &DataFrame) -> Result<Array1<f64>> {
        match self.voting {
            Voting::Hard => Ok(argmax_rows(&self.predict_proportion(x)?)),
            Voting::Soft => Ok(argmax_rows(&self.predict_proba(x)?)),
        }
    }

    fn predict_proba(&self, x: &DataFrame) -> Result<Array2<f64>> {
        self.predict_proba_soft(x)
    }
}

impl fmt::Display for DemocraticModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Democratic Model")
    }
}
