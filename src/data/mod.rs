//! Dataset guard, label encoding and frame-to-matrix extraction

use crate::error::{EnsembleError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Minimum share of total samples each class must hold before training
/// is allowed to proceed. Policy constant, not user-tunable.
pub const MIN_CLASS_SHARE: f64 = 0.1;

/// Validate that every class has usable support before any model fitting.
///
/// Takes encoded labels (class indices) and the ordered class names for
/// error reporting. Does not mutate anything.
pub fn check_class_balance(y: &Array1<f64>, classes: &[String]) -> Result<()> {
    if classes.len() < 2 {
        return Err(EnsembleError::Validation(
            "labels must contain at least two classes".to_string(),
        ));
    }

    let n = y.len();
    if n == 0 {
        return Err(EnsembleError::Validation(
            "label vector is empty".to_string(),
        ));
    }

    let mut counts = vec![0usize; classes.len()];
    for &v in y.iter() {
        let idx = v as usize;
        if idx < counts.len() {
            counts[idx] += 1;
        }
    }

    for (idx, &count) in counts.iter().enumerate() {
        let share = count as f64 / n as f64;
        if share < MIN_CLASS_SHARE {
            return Err(EnsembleError::ClassImbalance {
                label: classes[idx].clone(),
                share: share * 100.0,
                min: MIN_CLASS_SHARE * 100.0,
            });
        }
    }

    Ok(())
}

/// Maps categorical labels to class indices.
///
/// Classes are ordered lexicographically, so index 0 is the first class
/// in alphabetical order. The inverse mapping is available via [`classes`].
///
/// [`classes`]: LabelEncoder::classes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Learn the class set from a label series.
    pub fn fit(y: &Series) -> Result<Self> {
        let values = series_to_strings(y)?;
        let mut classes = values;
        classes.sort();
        classes.dedup();
        Ok(Self { classes })
    }

    /// Encode a label series into class indices.
    pub fn encode(&self, y: &Series) -> Result<Array1<f64>> {
        let values = series_to_strings(y)?;
        let encoded: Result<Vec<f64>> = values
            .iter()
            .map(|v| {
                self.classes
                    .binary_search(v)
                    .map(|idx| idx as f64)
                    .map_err(|_| EnsembleError::Data(format!("unknown label '{v}'")))
            })
            .collect();
        Ok(Array1::from_vec(encoded?))
    }

    /// Ordered class names.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of distinct classes.
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Class name for an index, if in range.
    pub fn decode(&self, idx: usize) -> Option<&str> {
        self.classes.get(idx).map(|s| s.as_str())
    }
}

fn series_to_strings(y: &Series) -> Result<Vec<String>> {
    let s = y.cast(&DataType::String)?;
    let ca = s.str()?;
    Ok(ca
        .into_iter()
        .map(|v| v.unwrap_or("").to_string())
        .collect())
}

/// Feature column schema captured at fit time and re-validated at predict.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    /// Capture the column set of a feature frame.
    pub fn from_frame(df: &DataFrame) -> Self {
        let columns = df
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        Self { columns }
    }

    /// Column names in schema order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Extract the schema's columns from a frame into a row-major matrix.
    ///
    /// Fails with `FeatureNotFound` when a fitted column is missing.
    pub fn extract(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let n_rows = df.height();
        let n_cols = self.columns.len();

        let col_data: Vec<Vec<f64>> = self
            .columns
            .iter()
            .map(|col_name| {
                let column = df
                    .column(col_name)
                    .map_err(|_| EnsembleError::FeatureNotFound(col_name.clone()))?;
                let series_f64 = column
                    .as_materialized_series()
                    .cast(&DataType::Float64)?;
                let values: Vec<f64> = series_f64
                    .f64()?
                    .into_iter()
                    .map(|v| v.unwrap_or(0.0))
                    .collect();
                Ok(values)
            })
            .collect::<Result<Vec<Vec<f64>>>>()?;

        let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
        Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
            col_refs[c][r]
        }))
    }
}
