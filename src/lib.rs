//! Meta-model ensembles over a pool of tunable base classifiers
//!
//! This crate trains a heterogeneous pool of candidate classifiers on one
//! labeled dataset, optionally tunes each pool slot through randomized
//! cross-validated search, and combines the pool's outputs into a single
//! decision through a selectable combination strategy.
//!
//! # Modules
//!
//! - [`data`] - dataset guard, label encoding, frame-to-matrix extraction
//! - [`estimators`] - the base-model contract and candidate model types
//! - [`model_selection`] - cross-validation, scoring, randomized search
//! - [`pool`] - the estimator pool and its prediction matrix
//! - [`meta`] - the voting and stacking meta-models
//!
//! # Example
//!
//! ```no_run
//! use meta_ensemble::meta::{DemocraticModel, MetaModel, MetaModelConfig, Voting};
//! use polars::prelude::*;
//!
//! # fn main() -> meta_ensemble::Result<()> {
//! let x = df!("f1" => &[0.1, 0.2, 0.8, 0.9], "f2" => &[1.0, 0.9, 0.1, 0.2]).unwrap();
//! let y = Series::new("label".into(), &["down", "down", "up", "up"]);
//!
//! let mut model = DemocraticModel::with_config(
//!     Voting::Soft,
//!     MetaModelConfig::default().without_tuning(),
//! );
//! model.fit(&x, &y)?;
//! let predictions = model.predict(&x)?;
//! # Ok(())
//! # }
//! ```

pub mod data;
pub mod error;
pub mod estimators;
pub mod meta;
pub mod model_selection;
pub mod pool;

pub use error::{EnsembleError, Result};
