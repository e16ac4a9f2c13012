pub mod classification;
pub mod confusion;
pub mod engine;
pub mod regression;

pub use classification::ClassificationMetrics;
pub use confusion::{Averaging, ClassCounts, ConfusionMatrix};
pub use engine::MetricsEngine;
pub use regression::RegressionMetrics;
