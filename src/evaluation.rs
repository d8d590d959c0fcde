use anyhow::{Context, Result, ensure};
use polars::prelude::*;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::common::{f64_values, require_columns};

/// Feature lists grouped by the preprocessing each receives before the estimator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSpec {
    pub min_max_scaled: Vec<String>,
    pub standard_scaled: Vec<String>,
    pub one_hot_encoded: Vec<String>,
    pub target_encoded: Vec<String>,
    pub count_freq_encoded: Vec<String>,
    pub unprocessed: Vec<String>,
}

impl FeatureSpec {
    /// All feature names, group by group.
    pub fn features(&self) -> Vec<String> {
        [
            &self.min_max_scaled,
            &self.standard_scaled,
            &self.one_hot_encoded,
            &self.target_encoded,
            &self.count_freq_encoded,
            &self.unprocessed,
        ]
        .into_iter()
        .flatten()
        .cloned()
        .collect()
    }
}

/// A regression estimator. Encoding of the feature groups is up to the implementation.
pub trait Regressor {
    fn fit(&mut self, spec: &FeatureSpec, features: &DataFrame, target: &[f64]) -> Result<()>;
    fn predict(&self, features: &DataFrame) -> Result<Vec<f64>>;
}

/// Labelled data split into train and test parts.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: DataFrame,
    pub x_test: DataFrame,
    pub y_train: Vec<f64>,
    pub y_test: Vec<f64>,
}

/// Shuffle rows with a seeded RNG and put the first `round(train_size * n)` in the train part.
///
/// `target` is removed from the feature frames; rows with a null target are an error.
pub fn split_train_test(df: &DataFrame, target: &str, train_size: f64, seed: u64) -> Result<TrainTestSplit> {
    ensure!(train_size > 0.0 && train_size < 1.0, "[evaluation] train_size must be in (0, 1), got {train_size}");
    require_columns(df, &[target], "evaluation")?;

    let y = f64_values(df, target)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| value.with_context(|| format!("[evaluation] row {row} has no {target:?} value")))
        .collect::<Result<Vec<_>>>()?;
    let x = df.drop(target)?;

    let mut order = (0..df.height() as IdxSize).collect::<Vec<_>>();
    order.shuffle(&mut StdRng::seed_from_u64(seed));
    let n_train = (train_size * df.height() as f64).round() as usize;
    let (train_rows, test_rows) = order.split_at(n_train);

    let take = |rows: &[IdxSize]| -> Result<(DataFrame, Vec<f64>)> {
        let idx = IdxCa::from_vec("idx".into(), rows.to_vec());
        Ok((x.take(&idx)?, rows.iter().map(|&r| y[r as usize]).collect()))
    };
    let (x_train, y_train) = take(train_rows)?;
    let (x_test, y_test) = take(test_rows)?;
    info!("[evaluation] split {} rows into {} train / {} test (seed {seed})", df.height(), y_train.len(), y_test.len());

    Ok(TrainTestSplit { x_train, x_test, y_train, y_test })
}

/// Regression metrics on a test set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Mean absolute percentage error, as a fraction.
    pub mape: f64,
    /// Root mean squared error.
    pub rmse: f64,
}

/// Compare predictions with the truth. Near-zero truths use `f64::EPSILON` as denominator.
pub fn evaluate_predictions(truth: &[f64], predictions: &[f64]) -> Result<Metrics> {
    ensure!(truth.len() == predictions.len(),
        "[evaluation] {} predictions for {} targets", predictions.len(), truth.len());
    ensure!(!truth.is_empty(), "[evaluation] cannot evaluate an empty test set");

    let n = truth.len() as f64;
    let (ape, se) = truth.iter().zip(predictions)
        .fold((0.0, 0.0), |(ape, se), (&y, &p)| {
            (ape + (y - p).abs() / y.abs().max(f64::EPSILON), se + (y - p).powi(2))
        });

    Ok(Metrics { mape: ape / n, rmse: (se / n).sqrt() })
}

/// Fit `estimator` on the listed features of the train part and score it on the test part.
pub fn fit_and_evaluate<R: Regressor>(estimator: &mut R, spec: &FeatureSpec, split: &TrainTestSplit) -> Result<Metrics> {
    let features = spec.features();
    let x_train = split.x_train.select(features.iter().map(String::as_str))
        .context("[evaluation] train set lacks requested features")?;
    let x_test = split.x_test.select(features.iter().map(String::as_str))
        .context("[evaluation] test set lacks requested features")?;

    estimator.fit(spec, &x_train, &split.y_train)?;
    let predictions = estimator.predict(&x_test)?;
    evaluate_predictions(&split.y_test, &predictions)
}

#[cfg(test)]
mod tests {
    use polars::df;

    use super::*;

    /// Predicts the training mean, whatever the features.
    #[derive(Default)]
    struct MeanRegressor {
        mean: f64,
        seen_features: Vec<String>,
    }

    impl Regressor for MeanRegressor {
        fn fit(&mut self, _spec: &FeatureSpec, features: &DataFrame, target: &[f64]) -> Result<()> {
            self.mean = target.iter().sum::<f64>() / target.len() as f64;
            self.seen_features = features.get_column_names().iter().map(|n| n.to_string()).collect();
            Ok(())
        }

        fn predict(&self, features: &DataFrame) -> Result<Vec<f64>> {
            Ok(vec![self.mean; features.height()])
        }
    }

    fn frame(n: usize) -> DataFrame {
        df!(
            "row" => (0..n as i64).collect::<Vec<_>>(),
            "nb_pieces" => (0..n as i64).map(|i| i % 4 + 1).collect::<Vec<_>>(),
            "district" => (0..n).map(|i| format!("d{}", i % 3)).collect::<Vec<_>>(),
            "valeur" => (0..n).map(|i| 1000.0 * (i + 1) as f64).collect::<Vec<_>>(),
        ).unwrap()
    }

    #[test]
    fn features_keep_group_order() {
        let spec = FeatureSpec {
            standard_scaled: vec!["surface".into()],
            one_hot_encoded: vec!["type_local".into(), "commune".into()],
            unprocessed: vec!["n_metros_within_0.5km".into()],
            ..Default::default()
        };
        assert_eq!(spec.features(), vec!["surface", "type_local", "commune", "n_metros_within_0.5km"]);
    }

    #[test]
    fn split_is_seeded_and_complete() {
        let df = frame(20);
        let a = split_train_test(&df, "valeur", 0.75, 40).unwrap();
        let b = split_train_test(&df, "valeur", 0.75, 40).unwrap();

        assert_eq!(a.x_train.height(), 15);
        assert_eq!(a.x_test.height(), 5);
        assert_eq!(a.y_train, b.y_train);
        assert!(a.x_train.column("valeur").is_err());

        // Every row lands on exactly one side, with its own target.
        let mut rows = f64_values(&a.x_train, "row").unwrap();
        rows.extend(f64_values(&a.x_test, "row").unwrap());
        let targets = a.y_train.iter().chain(&a.y_test).copied().collect::<Vec<_>>();
        for (row, target) in rows.iter().zip(&targets) {
            assert_eq!(1000.0 * (row.unwrap() + 1.0), *target);
        }
        let mut sorted = rows.into_iter().map(|r| r.unwrap() as i64).collect::<Vec<_>>();
        sorted.sort();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn split_rejects_bad_inputs() {
        assert!(split_train_test(&frame(4), "valeur", 1.0, 0).is_err());
        assert!(split_train_test(&frame(4), "price", 0.5, 0).is_err());
    }

    #[test]
    fn metrics_on_known_values() {
        let metrics = evaluate_predictions(&[100.0, 200.0], &[110.0, 180.0]).unwrap();
        assert!((metrics.mape - 0.1).abs() < 1e-12);
        assert!((metrics.rmse - 250.0f64.sqrt()).abs() < 1e-12);

        assert!(evaluate_predictions(&[1.0], &[]).is_err());
        assert!(evaluate_predictions(&[], &[]).is_err());
    }

    #[test]
    fn fit_and_evaluate_uses_spec_features_only() {
        let split = split_train_test(&frame(12), "valeur", 0.5, 1).unwrap();
        let spec = FeatureSpec { unprocessed: vec!["nb_pieces".into()], ..Default::default() };
        let mut estimator = MeanRegressor::default();

        let metrics = fit_and_evaluate(&mut estimator, &spec, &split).unwrap();
        assert_eq!(estimator.seen_features, vec!["nb_pieces"]);
        assert!(metrics.rmse > 0.0 && metrics.mape > 0.0);

        let missing = FeatureSpec { unprocessed: vec!["surface".into()], ..Default::default() };
        assert!(fit_and_evaluate(&mut estimator, &missing, &split).is_err());
    }
}
