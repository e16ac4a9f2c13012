// src/engines/metrics/regression.rs
use crate::data::Dataset;
use crate::engines::tree::Tree;
use std::collections::HashMap;

pub struct RegressionMetrics;

impl RegressionMetrics {
    /// Mean absolute error of `tree` over the records with a known target
    pub fn mae(tree: &Tree, dataset: &dyn Dataset) -> f64 {
        Self::mean_of(tree, dataset, |e| e.abs())
    }

    /// Mean squared error of `tree` over the records with a known target
    pub fn mse(tree: &Tree, dataset: &dyn Dataset) -> f64 {
        Self::mean_of(tree, dataset, |e| e * e)
    }

    pub fn calculate(tree: &Tree, dataset: &dyn Dataset) -> HashMap<String, f64> {
        let mut metrics = HashMap::new();
        if dataset.num_records() == 0 {
            return metrics;
        }
        metrics.insert("mae".to_string(), Self::mae(tree, dataset));
        metrics.insert("mse".to_string(), Self::mse(tree, dataset));
        metrics
    }

    fn mean_of<F: Fn(f64) -> f64>(tree: &Tree, dataset: &dyn Dataset, loss: F) -> f64 {
        let mut sum = 0.0;
        let mut n = 0usize;
        for record in 0..dataset.num_records() {
            let actual = dataset.class_of(record);
            if actual.is_nan() {
                continue;
            }
            sum += loss(tree.classify(dataset, record) - actual);
            n += 1;
        }
        if n == 0 {
            0.0
        } else {
            sum / n as f64
        }
    }
}
