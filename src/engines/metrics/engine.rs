// src/engines/metrics/engine.rs
use crate::data::Dataset;
use crate::engines::metrics::{ClassificationMetrics, ConfusionMatrix, RegressionMetrics};
use crate::engines::tree::Tree;
use std::collections::HashMap;

/// Summary metrics for a finished tree, used in run reports
pub struct MetricsEngine;

impl MetricsEngine {
    pub fn calculate_all(tree: &Tree, dataset: &dyn Dataset) -> HashMap<String, f64> {
        let mut all_metrics = if dataset.class_kind().is_nominal() {
            ClassificationMetrics::calculate(&ConfusionMatrix::from_tree(tree, dataset))
        } else {
            RegressionMetrics::calculate(tree, dataset)
        };

        // Structure
        all_metrics.insert("size".to_string(), tree.size() as f64);
        all_metrics.insert("height".to_string(), tree.height() as f64);
        all_metrics.insert("leaves".to_string(), tree.leaves().len() as f64);

        all_metrics
    }
}
