use super::fitness::FitnessFunction;
use super::pareto::OptimizationDirection;
use crate::data::Dataset;
use crate::engines::metrics::RegressionMetrics;
use crate::engines::tree::Tree;
use crate::error::{EvoTreeError, Result};
use crate::types::TargetSupport;

fn require_numeric(name: &str, dataset: &dyn Dataset) -> Result<()> {
    if dataset.class_kind().is_nominal() {
        return Err(EvoTreeError::Incompatible(format!(
            "'{}' needs a numeric class attribute",
            name
        )));
    }
    Ok(())
}

/// Mean absolute error over the training records
#[derive(Debug, Clone, Copy, Default)]
pub struct MaeFitness;

impl FitnessFunction for MaeFitness {
    fn name(&self) -> &str {
        "mae"
    }

    fn direction(&self) -> OptimizationDirection {
        OptimizationDirection::Minimize
    }

    fn target_support(&self) -> TargetSupport {
        TargetSupport::Numeric
    }

    fn evaluate(&self, tree: &Tree, dataset: &dyn Dataset) -> Result<f64> {
        require_numeric(self.name(), dataset)?;
        Ok(RegressionMetrics::mae(tree, dataset))
    }
}

/// Mean squared error over the training records
#[derive(Debug, Clone, Copy, Default)]
pub struct MseFitness;

impl FitnessFunction for MseFitness {
    fn name(&self) -> &str {
        "mse"
    }

    fn direction(&self) -> OptimizationDirection {
        OptimizationDirection::Minimize
    }

    fn target_support(&self) -> TargetSupport {
        TargetSupport::Numeric
    }

    fn evaluate(&self, tree: &Tree, dataset: &dyn Dataset) -> Result<f64> {
        require_numeric(self.name(), dataset)?;
        Ok(RegressionMetrics::mse(tree, dataset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AttributeInfo, InMemoryDataset};
    use crate::types::{AttributeKind, Sign};

    #[test]
    fn test_errors_on_stump() {
        let data = InMemoryDataset::new(
            vec![AttributeInfo::numeric("x")],
            AttributeInfo::numeric("y"),
            vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]],
            vec![1.0, 1.0, 4.0, 6.0],
        )
        .unwrap();
        let tree = Tree::stump(0, AttributeKind::Numeric, 2.0, &[1.0, 5.0]).unwrap();
        assert_eq!(tree.node(tree.root()).sign(), Sign::Less);

        // residuals: 0, 0, -1, 1
        assert_eq!(MaeFitness.evaluate(&tree, &data).unwrap(), 0.5);
        assert_eq!(MseFitness.evaluate(&tree, &data).unwrap(), 0.5);
    }
}
