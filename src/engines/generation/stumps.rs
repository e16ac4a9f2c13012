use crate::data::{majority_class, mean_class, Dataset};
use crate::engines::tree::Tree;
use crate::error::{EvoTreeError, Result};
use crate::types::AttributeKind;
use rand::rngs::StdRng;
use rand::Rng;

/// Produces one-level trees for the decision-stump mutation
pub trait StumpGenerator: Send + Sync {
    /// Builds a stump fitted to `records`, the training records reaching the
    /// position it will be grafted at.
    fn generate(&self, dataset: &dyn Dataset, records: &[usize], rng: &mut StdRng) -> Result<Tree>;
}

/// Leaf prediction for `records`: majority class or mean response, falling
/// back to `fallback` when no record qualifies.
pub fn leaf_value(dataset: &dyn Dataset, records: &[usize], fallback: f64) -> f64 {
    let value = if dataset.class_kind().is_nominal() {
        majority_class(dataset, records)
    } else {
        mean_class(dataset, records)
    };
    value.unwrap_or(fallback)
}

/// Leaf prediction over the whole dataset, 0 when nothing qualifies
pub fn global_leaf_value(dataset: &dyn Dataset) -> f64 {
    let all: Vec<usize> = (0..dataset.num_records()).collect();
    leaf_value(dataset, &all, 0.0)
}

/// Picks a split threshold for numeric `attribute` from the values observed
/// in `records`. `None` when every value is missing.
pub fn sample_threshold(dataset: &dyn Dataset, attribute: usize, records: &[usize], rng: &mut StdRng) -> Option<f64> {
    let values: Vec<f64> = records
        .iter()
        .map(|&r| dataset.value_at(r, attribute))
        .filter(|v| !v.is_nan())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values[rng.gen_range(0..values.len())])
    }
}

/// Random attribute, sampled threshold, leaves labelled from the records
/// each branch receives.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomStumpGenerator;

impl StumpGenerator for RandomStumpGenerator {
    fn generate(&self, dataset: &dyn Dataset, records: &[usize], rng: &mut StdRng) -> Result<Tree> {
        if dataset.num_attributes() == 0 {
            return Err(EvoTreeError::DataShape(
                "Cannot build a stump without attributes".to_string(),
            ));
        }

        let all: Vec<usize>;
        let records = if records.is_empty() {
            all = (0..dataset.num_records()).collect();
            &all[..]
        } else {
            records
        };
        let fallback = leaf_value(dataset, records, global_leaf_value(dataset));

        let attribute = rng.gen_range(0..dataset.num_attributes());
        let kind = dataset.attribute_kind(attribute);
        let threshold = match kind {
            AttributeKind::Numeric => match sample_threshold(dataset, attribute, records, rng) {
                Some(t) => t,
                None => return Ok(Tree::leaf(fallback)),
            },
            AttributeKind::Nominal { .. } => 0.0,
        };
        if kind.arity() < 2 {
            return Ok(Tree::leaf(fallback));
        }

        let mut tree = Tree::stump(attribute, kind, threshold, &vec![fallback; kind.arity()])?;
        let root = tree.root();
        let mut branches: Vec<Vec<usize>> = vec![Vec::new(); kind.arity()];
        for &record in records {
            if let Some(branch) = tree.branch(root, dataset, record) {
                branches[branch].push(record);
            }
        }
        let children = tree.node(root).children().to_vec();
        for (child, branch_records) in children.into_iter().zip(&branches) {
            tree.set_value(child, leaf_value(dataset, branch_records, fallback))?;
        }

        Ok(tree)
    }
}
