// src/engines/metrics/classification.rs
use super::confusion::{Averaging, ClassCounts, ConfusionMatrix};
use std::collections::HashMap;

pub struct ClassificationMetrics;

impl ClassificationMetrics {
    pub fn calculate(matrix: &ConfusionMatrix) -> HashMap<String, f64> {
        let mut metrics = HashMap::new();

        if matrix.total() == 0 {
            return metrics;
        }

        metrics.insert("accuracy".to_string(), matrix.accuracy());
        metrics.insert(
            "precision".to_string(),
            matrix.average(Averaging::Weighted, ClassCounts::precision),
        );
        metrics.insert(
            "recall".to_string(),
            matrix.average(Averaging::Weighted, ClassCounts::recall),
        );
        metrics.insert(
            "specificity".to_string(),
            matrix.average(Averaging::Weighted, ClassCounts::specificity),
        );

        metrics
    }
}
