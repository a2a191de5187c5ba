//! Integration tests: voting and stacking meta-models end-to-end

use approx::assert_abs_diff_eq;
use meta_ensemble::error::EnsembleError;
use meta_ensemble::estimators::Estimator;
use meta_ensemble::meta::{DemocraticModel, MetaModel, MetaModelConfig, OneRulerForAll, Voting};
use meta_ensemble::pool::EstimatorPool;
use meta_ensemble::Result;
use ndarray::{Array1, Array2};
use polars::prelude::*;

/// Deterministic classifier: always votes the same label with the same
/// binary probability vector.
struct FixedClassifier {
    label: f64,
    proba: [f64; 2],
}

impl FixedClassifier {
    fn boxed(label: f64, proba: [f64; 2]) -> Box<dyn Estimator> {
        Box::new(Self { label, proba })
    }
}

impl Estimator for FixedClassifier {
    fn fit(&mut self, _x: &Array2<f64>, _y: &Array1<f64>) -> Result<()> {
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(Array1::from_elem(x.nrows(), self.label))
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        Ok(Array2::from_shape_fn((x.nrows(), 2), |(_, j)| self.proba[j]))
    }
}

/// Balanced binary frame: 100 rows, half "neg" half "pos".
fn balanced_dataset() -> (DataFrame, Series) {
    let f1: Vec<f64> = (0..100).map(|i| i as f64 / 100.0).collect();
    let f2: Vec<f64> = (0..100).map(|i| 1.0 - i as f64 / 100.0).collect();
    let labels: Vec<&str> = (0..100).map(|i| if i < 50 { "neg" } else { "pos" }).collect();

    let x = df!("f1" => &f1, "f2" => &f2).unwrap();
    let y = Series::new("label".into(), &labels);
    (x, y)
}

/// Pool of three fixed models: two voting positive, one negative.
fn two_vs_one_pool() -> EstimatorPool {
    EstimatorPool::from_fitted(vec![
        ("first".to_string(), FixedClassifier::boxed(1.0, [0.2, 0.8])),
        ("second".to_string(), FixedClassifier::boxed(0.0, [0.6, 0.4])),
        ("third".to_string(), FixedClassifier::boxed(1.0, [0.3, 0.7])),
    ])
    .unwrap()
}

fn untuned() -> MetaModelConfig {
    MetaModelConfig::default().without_tuning()
}

#[test]
fn test_hard_vote_two_of_three_scenario() {
    let (x, y) = balanced_dataset();
    let mut model =
        DemocraticModel::with_config(Voting::Hard, untuned()).with_pool(two_vs_one_pool());
    model.fit(&x, &y).unwrap();

    let proportions = model.predict_proportion(&x).unwrap();
    assert_eq!(proportions.nrows(), 100);
    for i in 0..proportions.nrows() {
        assert_abs_diff_eq!(proportions[[i, 0]], 1.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(proportions[[i, 1]], 2.0 / 3.0, epsilon = 1e-12);
    }

    let predictions = model.predict(&x).unwrap();
    assert!(predictions.iter().all(|&p| p == 1.0));
}

#[test]
fn test_hard_vote_tie_breaks_to_first_class() {
    let (x, y) = balanced_dataset();
    let pool = EstimatorPool::from_fitted(vec![
        ("a".to_string(), FixedClassifier::boxed(0.0, [0.9, 0.1])),
        ("b".to_string(), FixedClassifier::boxed(0.0, [0.8, 0.2])),
        ("c".to_string(), FixedClassifier::boxed(1.0, [0.1, 0.9])),
        ("d".to_string(), FixedClassifier::boxed(1.0, [0.2, 0.8])),
    ])
    .unwrap();
    let mut model = DemocraticModel::with_config(Voting::Hard, untuned()).with_pool(pool);
    model.fit(&x, &y).unwrap();

    let proportions = model.predict_proportion(&x).unwrap();
    assert_eq!(proportions[[0, 0]], 0.5);
    assert_eq!(proportions[[0, 1]], 0.5);

    // A split pool resolves to the lowest class index
    let predictions = model.predict(&x).unwrap();
    assert!(predictions.iter().all(|&p| p == 0.0));
}

#[test]
fn test_empty_fixed_pool_is_rejected() {
    assert!(matches!(
        EstimatorPool::from_fitted(Vec::new()).unwrap_err(),
        EnsembleError::Validation(_)
    ));
}

#[test]
fn test_hard_vote_proportions_sum_to_one() {
    let (x, y) = balanced_dataset();
    let mut model =
        DemocraticModel::with_config(Voting::Hard, untuned()).with_pool(two_vs_one_pool());
    model.fit(&x, &y).unwrap();

    let proportions = model.predict_proportion(&x).unwrap();
    for i in 0..proportions.nrows() {
        let (a, b) = (proportions[[i, 0]], proportions[[i, 1]]);
        assert_eq!(a + b, 1.0);
        assert!((0.0..=1.0).contains(&a));
        assert!((0.0..=1.0).contains(&b));
    }
}

#[test]
fn test_soft_vote_probability_average_scenario() {
    let (x, y) = balanced_dataset();
    let mut model =
        DemocraticModel::with_config(Voting::Soft, untuned()).with_pool(two_vs_one_pool());
    model.fit(&x, &y).unwrap();

    // Mean of [0.2,0.8], [0.6,0.4], [0.3,0.7]
    let proba = model.predict_proba(&x).unwrap();
    for i in 0..proba.nrows() {
        assert_abs_diff_eq!(proba[[i, 0]], 0.3667, epsilon = 1e-3);
        assert_abs_diff_eq!(proba[[i, 1]], 0.6333, epsilon = 1e-3);
        assert_abs_diff_eq!(proba.row(i).sum(), 1.0, epsilon = 1e-6);
    }

    let predictions = model.predict(&x).unwrap();
    assert!(predictions.iter().all(|&p| p == 1.0));
}

#[test]
fn test_soft_vote_rows_sum_to_one_with_real_pool() {
    let (x, y) = balanced_dataset();
    let mut model = DemocraticModel::with_config(Voting::Soft, untuned());
    model.fit(&x, &y).unwrap();

    let proba = model.predict_proba(&x).unwrap();
    for i in 0..proba.nrows() {
        assert_abs_diff_eq!(proba.row(i).sum(), 1.0, epsilon = 1e-6);
    }
}

#[test]
fn test_predict_matches_argmax_of_mode_output() {
    let (x, y) = balanced_dataset();

    let mut hard =
        DemocraticModel::with_config(Voting::Hard, untuned()).with_pool(two_vs_one_pool());
    hard.fit(&x, &y).unwrap();
    let proportions = hard.predict_proportion(&x).unwrap();
    let predictions = hard.predict(&x).unwrap();
    for i in 0..predictions.len() {
        let arg = if proportions[[i, 1]] > proportions[[i, 0]] { 1.0 } else { 0.0 };
        assert_eq!(predictions[i], arg);
    }

    let mut soft = DemocraticModel::with_config(Voting::Soft, untuned());
    soft.fit(&x, &y).unwrap();
    let proba = soft.predict_proba(&x).unwrap();
    let predictions = soft.predict(&x).unwrap();
    for i in 0..predictions.len() {
        let arg = if proba[[i, 1]] > proba[[i, 0]] { 1.0 } else { 0.0 };
        assert_eq!(predictions[i], arg);
    }
}

#[test]
fn test_mode_unavailable_errors() {
    let (x, y) = balanced_dataset();

    let mut hard =
        DemocraticModel::with_config(Voting::Hard, untuned()).with_pool(two_vs_one_pool());
    hard.fit(&x, &y).unwrap();
    let err = hard.predict_proba(&x).unwrap_err();
    assert!(matches!(err, EnsembleError::ModeUnavailable { .. }));
    assert_eq!(
        err.to_string(),
        "predict_proba is not available when voting=hard"
    );

    let mut soft =
        DemocraticModel::with_config(Voting::Soft, untuned()).with_pool(two_vs_one_pool());
    soft.fit(&x, &y).unwrap();
    let err = soft.predict_proportion(&x).unwrap_err();
    assert!(matches!(err, EnsembleError::ModeUnavailable { .. }));
}

#[test]
fn test_not_fitted_errors() {
    let (x, _) = balanced_dataset();

    let hard = DemocraticModel::with_config(Voting::Hard, untuned());
    assert!(matches!(
        hard.predict(&x).unwrap_err(),
        EnsembleError::NotFitted { .. }
    ));

    let orfa = OneRulerForAll::with_config(untuned());
    assert!(matches!(
        orfa.predict(&x).unwrap_err(),
        EnsembleError::NotFitted { .. }
    ));
    assert!(matches!(
        orfa.predict_proba(&x).unwrap_err(),
        EnsembleError::NotFitted { .. }
    ));
}

#[test]
fn test_class_imbalance_rejected_before_any_fit() {
    let f1: Vec<f64> = (0..100).map(|i| i as f64).collect();
    let labels: Vec<&str> = (0..100).map(|i| if i < 95 { "a" } else { "b" }).collect();
    let x = df!("f1" => &f1).unwrap();
    let y = Series::new("label".into(), &labels);

    let mut model = DemocraticModel::with_config(Voting::Hard, untuned());
    let err = model.fit(&x, &y).unwrap_err();
    assert!(matches!(err, EnsembleError::ClassImbalance { .. }));
}

#[test]
fn test_refit_leaves_predictions_unchanged() {
    let (x, y) = balanced_dataset();
    let mut model = DemocraticModel::with_config(Voting::Soft, untuned());
    model.fit(&x, &y).unwrap();
    let before = model.predict(&x).unwrap();

    // Second fit with inverted labels: the pool's fit-once lifecycle makes
    // this a no-op
    let flipped: Vec<&str> = (0..100).map(|i| if i < 50 { "pos" } else { "neg" }).collect();
    let y_flipped = Series::new("label".into(), &flipped);
    model.fit(&x, &y_flipped).unwrap();
    let after = model.predict(&x).unwrap();

    assert_eq!(before, after);
}

#[test]
fn test_stacking_forwards_ruler_decision() {
    let (x, y) = balanced_dataset();

    // A fixed ruler makes the forwarding observable: whatever the pool
    // says, the combiner must emit exactly the ruler's output
    let mut model = OneRulerForAll::with_config(untuned())
        .with_pool(two_vs_one_pool())
        .with_ruler(FixedClassifier::boxed(0.0, [0.9, 0.1]));
    model.fit(&x, &y).unwrap();

    let predictions = model.predict(&x).unwrap();
    assert!(predictions.iter().all(|&p| p == 0.0));

    let proba = model.predict_proba(&x).unwrap();
    for i in 0..proba.nrows() {
        assert_abs_diff_eq!(proba[[i, 0]], 0.9, epsilon = 1e-12);
        assert_abs_diff_eq!(proba[[i, 1]], 0.1, epsilon = 1e-12);
    }
}

#[test]
fn test_stacking_end_to_end_with_real_models() {
    let (x, y) = balanced_dataset();
    let mut model = OneRulerForAll::with_config(untuned());
    model.fit(&x, &y).unwrap();

    let predictions = model.predict(&x).unwrap();
    assert_eq!(predictions.len(), 100);

    let proba = model.predict_proba(&x).unwrap();
    assert_eq!(proba.ncols(), 2);
    for i in 0..proba.nrows() {
        assert_abs_diff_eq!(proba.row(i).sum(), 1.0, epsilon = 1e-6);
    }

    assert_eq!(model.classes(), Some(&["neg".to_string(), "pos".to_string()][..]));
}

#[test]
fn test_prediction_matrix_column_order_is_slot_order() {
    let pool = two_vs_one_pool();
    let x = Array2::zeros((4, 2));

    let first = pool.predict(&x).unwrap();
    let second = pool.predict(&x).unwrap();
    assert_eq!(first, second);

    // Slot order: positive, negative, positive
    for i in 0..4 {
        assert_eq!(first[[i, 0]], 1.0);
        assert_eq!(first[[i, 1]], 0.0);
        assert_eq!(first[[i, 2]], 1.0);
    }
    assert_eq!(pool.slot_names(), vec!["first", "second", "third"]);
}

#[test]
fn test_transform_is_identity() {
    let (x, _) = balanced_dataset();
    let model = DemocraticModel::with_config(Voting::Soft, untuned());
    assert!(std::ptr::eq(model.transform(&x), &x));

    let orfa = OneRulerForAll::with_config(untuned());
    assert!(std::ptr::eq(orfa.transform(&x), &x));
}

#[test]
fn test_display_tags() {
    assert_eq!(
        DemocraticModel::with_config(Voting::Hard, untuned()).to_string(),
        "Democratic Model"
    );
    assert_eq!(OneRulerForAll::with_config(untuned()).to_string(), "ORFA");
}

#[test]
fn test_tuned_fit_end_to_end() {
    // Smaller frame keeps the search grid cheap
    let f1: Vec<f64> = (0..20).map(|i| i as f64 / 20.0).collect();
    let labels: Vec<&str> = (0..20).map(|i| if i < 10 { "neg" } else { "pos" }).collect();
    let x = df!("f1" => &f1).unwrap();
    let y = Series::new("label".into(), &labels);

    let config = MetaModelConfig::default()
        .with_n_splits(2)
        .with_n_iter(2)
        .with_random_seed(7);
    let mut model = DemocraticModel::with_config(Voting::Soft, config);
    model.fit(&x, &y).unwrap();

    let predictions = model.predict(&x).unwrap();
    assert_eq!(predictions.len(), 20);
}
