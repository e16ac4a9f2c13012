#![allow(dead_code)]

use evotree::data::{AttributeInfo, Dataset, InMemoryDataset};
use evotree::engines::evaluation::{FitnessComparator, FitnessFunction, FitnessFunctions};
use evotree::engines::generation::Individual;
use evotree::engines::tree::Tree;
use evotree::types::{AttributeKind, Sign};
use std::sync::Arc;

/// `n` records, class 1 when `x >= n / 2`, plus a noisy nominal attribute
pub fn two_class_dataset(n: usize) -> InMemoryDataset {
    InMemoryDataset::new(
        vec![
            AttributeInfo::numeric("x"),
            AttributeInfo::nominal_with_values("colour", 3),
        ],
        AttributeInfo::nominal_with_values("label", 2),
        (0..n).map(|i| vec![i as f64, (i % 3) as f64]).collect(),
        (0..n).map(|i| if i >= n / 2 { 1.0 } else { 0.0 }).collect(),
    )
    .unwrap()
}

/// Numeric response `y = 2x` over `n` records
pub fn regression_dataset(n: usize) -> InMemoryDataset {
    InMemoryDataset::new(
        vec![AttributeInfo::numeric("x")],
        AttributeInfo::numeric("y"),
        (0..n).map(|i| vec![i as f64]).collect(),
        (0..n).map(|i| 2.0 * i as f64).collect(),
    )
    .unwrap()
}

pub fn shared(dataset: InMemoryDataset) -> Arc<dyn Dataset> {
    Arc::new(dataset)
}

pub fn functions(list: Vec<Box<dyn FitnessFunction>>) -> FitnessFunctions {
    list.into_iter().fold(FitnessFunctions::new(), |f, function| f.with(function))
}

/// Individual with a fixed, already evaluated fitness vector
pub fn scored(values: &[f64]) -> Individual {
    let mut individual = Individual::new(Tree::leaf(0.0), values.len());
    for (slot, &value) in values.iter().enumerate() {
        individual.set_fitness(slot, value);
    }
    individual.unchange();
    individual
}

pub fn comparator_of<C: FitnessComparator + 'static>(comparator: C) -> Arc<dyn FitnessComparator> {
    Arc::new(comparator)
}

/// Full binary tree of `height` on attribute 0, thresholds spreading the
/// node index so every split is distinct
pub fn full_tree(height: usize) -> Tree {
    let mut tree = Tree::leaf(0.0);
    let mut frontier = vec![tree.root()];
    for _ in 0..height {
        let mut next = Vec::new();
        for id in frontier {
            tree.split(id, 0, Sign::Less, id as f64, 2).unwrap();
            next.extend(tree.node(id).children().to_vec());
        }
        frontier = next;
    }
    tree
}

pub fn numeric_stump(threshold: f64) -> Tree {
    Tree::stump(0, AttributeKind::Numeric, threshold, &[0.0, 1.0]).unwrap()
}
