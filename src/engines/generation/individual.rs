use crate::data::Dataset;
use crate::engines::tree::Tree;
use serde::{Deserialize, Serialize};

/// A candidate classifier: one decision tree plus its fitness vector.
///
/// Change tracking uses two stamps instead of a flag: `modified` is bumped by
/// every mutation, `evaluated` records the stamp at which the fitness vector
/// was last completed. The individual needs evaluation whenever the two differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Individual {
    tree: Tree,
    fitness: Vec<f64>,
    modified: u64,
    evaluated: Option<u64>,
}

impl Individual {
    /// Wraps `tree` with `slots` unfilled fitness values
    pub fn new(tree: Tree, slots: usize) -> Self {
        Self {
            tree,
            fitness: vec![f64::NAN; slots],
            modified: 0,
            evaluated: None,
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Mutable access to the tree. Marks the individual as changed.
    pub fn tree_mut(&mut self) -> &mut Tree {
        self.change();
        &mut self.tree
    }

    pub fn into_tree(self) -> Tree {
        self.tree
    }

    /// Replaces the whole tree. Marks the individual as changed.
    pub fn set_tree(&mut self, tree: Tree) {
        self.change();
        self.tree = tree;
    }

    pub fn fitness(&self) -> &[f64] {
        &self.fitness
    }

    pub fn fitness_at(&self, slot: usize) -> Option<f64> {
        self.fitness.get(slot).copied().filter(|v| !v.is_nan())
    }

    pub fn set_fitness(&mut self, slot: usize, value: f64) {
        if slot >= self.fitness.len() {
            self.fitness.resize(slot + 1, f64::NAN);
        }
        self.fitness[slot] = value;
    }

    pub fn has_changed(&self) -> bool {
        self.evaluated != Some(self.modified)
    }

    /// Whether the fitness vector was ever completed
    pub fn is_evaluated(&self) -> bool {
        self.evaluated.is_some()
    }

    pub fn change(&mut self) {
        self.modified += 1;
    }

    /// Marks the current fitness vector as up to date
    pub fn unchange(&mut self) {
        self.evaluated = Some(self.modified);
    }

    pub fn classify(&self, dataset: &dyn Dataset, record: usize) -> f64 {
        self.tree.classify(dataset, record)
    }
}
