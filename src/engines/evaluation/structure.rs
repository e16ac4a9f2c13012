use super::fitness::FitnessFunction;
use super::pareto::OptimizationDirection;
use crate::data::Dataset;
use crate::engines::tree::Tree;
use crate::error::Result;
use crate::types::TargetSupport;

/// `1 / size`: smaller trees score higher
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeFitness;

impl FitnessFunction for SizeFitness {
    fn name(&self) -> &str {
        "size"
    }

    fn direction(&self) -> OptimizationDirection {
        OptimizationDirection::Maximize
    }

    fn target_support(&self) -> TargetSupport {
        TargetSupport::Any
    }

    fn evaluate(&self, tree: &Tree, _dataset: &dyn Dataset) -> Result<f64> {
        Ok(1.0 / tree.size() as f64)
    }
}

/// `1 / (1 + height)`: shallower trees score higher
#[derive(Debug, Clone, Copy, Default)]
pub struct HeightFitness;

impl FitnessFunction for HeightFitness {
    fn name(&self) -> &str {
        "height"
    }

    fn direction(&self) -> OptimizationDirection {
        OptimizationDirection::Maximize
    }

    fn target_support(&self) -> TargetSupport {
        TargetSupport::Any
    }

    fn evaluate(&self, tree: &Tree, _dataset: &dyn Dataset) -> Result<f64> {
        Ok(1.0 / (1.0 + tree.height() as f64))
    }
}
