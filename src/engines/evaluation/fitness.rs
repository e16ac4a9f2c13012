use super::pareto::OptimizationDirection;
use crate::data::Dataset;
use crate::engines::generation::Individual;
use crate::engines::tree::Tree;
use crate::error::{EvoTreeError, Result};
use crate::functions::ParamMap;
use crate::types::TargetSupport;

/// A scalar objective computed from a tree over the training data.
///
/// Implementations are shared read-only between evaluation threads.
pub trait FitnessFunction: Send + Sync {
    fn name(&self) -> &str;

    fn direction(&self) -> OptimizationDirection;

    /// Class kinds this function can score
    fn target_support(&self) -> TargetSupport;

    fn evaluate(&self, tree: &Tree, dataset: &dyn Dataset) -> Result<f64>;

    /// Applies a `KEY value;...` parameter string. Resets every optional
    /// setting before applying the new ones.
    fn set_params(&mut self, params: &str) -> Result<()> {
        ParamMap::parse(params)?.ensure_known(&[])
    }

    fn params(&self) -> String {
        String::new()
    }
}

/// Ordered set of fitness functions. A function's position is the slot its
/// value occupies in every individual's fitness vector.
#[derive(Default)]
pub struct FitnessFunctions {
    functions: Vec<Box<dyn FitnessFunction>>,
}

impl FitnessFunctions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a function and returns its slot
    pub fn register(&mut self, function: Box<dyn FitnessFunction>) -> usize {
        self.functions.push(function);
        self.functions.len() - 1
    }

    pub fn with(mut self, function: Box<dyn FitnessFunction>) -> Self {
        self.register(function);
        self
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&dyn FitnessFunction> {
        self.functions.get(slot).map(|f| f.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn FitnessFunction> {
        self.functions.iter().map(|f| f.as_ref())
    }

    pub fn directions(&self) -> Vec<OptimizationDirection> {
        self.functions.iter().map(|f| f.direction()).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.functions.iter().map(|f| f.name().to_string()).collect()
    }

    /// Computes slot `slot` for `individual`, returning the cached value
    /// when the individual has not changed since its last evaluation.
    pub fn compute_fitness(&self, slot: usize, individual: &mut Individual, dataset: &dyn Dataset) -> Result<f64> {
        let function = self.get(slot).ok_or_else(|| {
            EvoTreeError::Computation(format!("No fitness function registered at slot {}", slot))
        })?;

        if !individual.has_changed() {
            if let Some(cached) = individual.fitness_at(slot) {
                return Ok(cached);
            }
        }

        let value = function.evaluate(individual.tree(), dataset)?;
        individual.set_fitness(slot, value);
        Ok(value)
    }

    /// Fills the whole fitness vector and marks the individual as evaluated
    pub fn compute_all(&self, individual: &mut Individual, dataset: &dyn Dataset) -> Result<()> {
        for slot in 0..self.functions.len() {
            self.compute_fitness(slot, individual, dataset)?;
        }
        individual.unchange();
        Ok(())
    }
}

impl std::fmt::Debug for FitnessFunctions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::evaluation::SizeFitness;
    use crate::types::Sign;
    use crate::data::{AttributeInfo, InMemoryDataset};

    fn dataset() -> InMemoryDataset {
        InMemoryDataset::new(
            vec![AttributeInfo::numeric("x")],
            AttributeInfo::nominal_with_values("y", 2),
            vec![vec![0.0], vec![1.0]],
            vec![0.0, 1.0],
        )
        .unwrap()
    }

    #[test]
    fn test_unchanged_individual_uses_cache() {
        let functions = FitnessFunctions::new().with(Box::new(SizeFitness));
        let data = dataset();
        let mut ind = Individual::new(Tree::leaf(0.0), 1);

        functions.compute_all(&mut ind, &data).unwrap();
        assert_eq!(ind.fitness_at(0), Some(1.0));

        // Changing the cached value directly proves no recomputation happens
        ind.set_fitness(0, 42.0);
        assert_eq!(functions.compute_fitness(0, &mut ind, &data).unwrap(), 42.0);

        ind.tree_mut().split(0, 0, Sign::Less, 0.5, 2).unwrap();
        assert_eq!(functions.compute_fitness(0, &mut ind, &data).unwrap(), 1.0 / 3.0);
    }

    #[test]
    fn test_unknown_slot() {
        let functions = FitnessFunctions::new();
        let mut ind = Individual::new(Tree::leaf(0.0), 0);
        assert!(functions.compute_fitness(0, &mut ind, &dataset()).is_err());
    }
}
