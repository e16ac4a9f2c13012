use super::population::Population;
use crate::data::Dataset;
use crate::engines::tree::Tree;
use crate::error::{EvoTreeError, Result};

/// Top-K trees of a population voting together.
///
/// A nominal class is decided by majority vote (ties to the lowest class
/// index), a numeric one by the mean of the member predictions.
#[derive(Debug, Clone)]
pub struct Ensemble {
    trees: Vec<Tree>,
}

impl Ensemble {
    pub fn new(trees: Vec<Tree>) -> Result<Self> {
        if trees.is_empty() {
            return Err(EvoTreeError::Configuration("An ensemble needs at least one tree".to_string()));
        }
        Ok(Self { trees })
    }

    /// The `k` best trees of `population` in comparator order
    pub fn from_population(population: &Population, k: usize) -> Result<Self> {
        let members = population
            .top(k)?
            .into_iter()
            .map(|individual| individual.into_tree())
            .collect();
        Self::new(members)
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn predict(&self, dataset: &dyn Dataset, record: usize) -> f64 {
        let predictions = self.trees.iter().map(|t| t.classify(dataset, record));
        let classes = dataset.num_classes();
        if classes == 0 {
            return predictions.sum::<f64>() / self.trees.len() as f64;
        }

        let mut votes = vec![0usize; classes];
        for prediction in predictions {
            if prediction.is_nan() || prediction < 0.0 {
                continue;
            }
            votes[(prediction.round() as usize).min(classes - 1)] += 1;
        }
        let (best, _) = votes
            .iter()
            .enumerate()
            .fold((0, 0), |acc, (class, &n)| if n > acc.1 { (class, n) } else { acc });
        best as f64
    }

    /// Fraction of records whose ensemble prediction matches the class
    pub fn accuracy(&self, dataset: &dyn Dataset) -> f64 {
        let scored: Vec<bool> = (0..dataset.num_records())
            .filter(|&r| !dataset.class_of(r).is_nan())
            .map(|r| self.predict(dataset, r) == dataset.class_of(r))
            .collect();
        if scored.is_empty() {
            return 0.0;
        }
        scored.iter().filter(|&&hit| hit).count() as f64 / scored.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AttributeInfo, InMemoryDataset};
    use crate::types::AttributeKind;

    fn data(class: AttributeInfo) -> InMemoryDataset {
        InMemoryDataset::new(
            vec![AttributeInfo::numeric("x")],
            class,
            vec![vec![0.0], vec![5.0]],
            vec![0.0, 1.0],
        )
        .unwrap()
    }

    #[test]
    fn test_majority_vote() {
        let data = data(AttributeInfo::nominal_with_values("y", 2));
        let good = Tree::stump(0, AttributeKind::Numeric, 2.0, &[0.0, 1.0]).unwrap();
        let ensemble = Ensemble::new(vec![good.clone(), Tree::leaf(1.0), good]).unwrap();
        assert_eq!(ensemble.predict(&data, 0), 0.0);
        assert_eq!(ensemble.accuracy(&data), 1.0);
    }

    #[test]
    fn test_tie_goes_to_lowest_class() {
        let data = data(AttributeInfo::nominal_with_values("y", 2));
        let ensemble = Ensemble::new(vec![Tree::leaf(1.0), Tree::leaf(0.0)]).unwrap();
        assert_eq!(ensemble.predict(&data, 1), 0.0);
    }

    #[test]
    fn test_regression_mean() {
        let data = data(AttributeInfo::numeric("y"));
        let ensemble = Ensemble::new(vec![Tree::leaf(1.0), Tree::leaf(2.0)]).unwrap();
        assert_eq!(ensemble.predict(&data, 0), 1.5);
        assert!(Ensemble::new(vec![]).is_err());
    }
}
