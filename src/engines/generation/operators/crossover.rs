use super::{check_probability, parse_operator_params, CrossoverOperator, Operator};
use crate::engines::generation::{Individual, Population};
use crate::error::Result;
use crate::functions::ParamMap;
use crate::types::NodeId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DEFAULT_PROBABILITY: f64 = 0.8;

/// Swaps the subtree of `a` rooted at `node_a` with the subtree of `b`
/// rooted at `node_b`. Either node may be a root, in which case that whole
/// tree is replaced.
pub fn swap_subtrees(a: &mut Individual, node_a: NodeId, b: &mut Individual, node_b: NodeId) -> Result<()> {
    let from_a = a.tree().subtree(node_a);
    let from_b = b.tree().subtree(node_b);
    a.tree_mut().replace_subtree(node_a, &from_b)?;
    b.tree_mut().replace_subtree(node_b, &from_a)?;
    Ok(())
}

/// Per parent pair, picks one node uniformly in each tree and swaps the
/// subtrees below them.
pub struct SubtreeCrossover {
    rng: StdRng,
    probability: f64,
}

impl SubtreeCrossover {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            probability: DEFAULT_PROBABILITY,
        }
    }

    fn cross(&mut self, a: &mut Individual, b: &mut Individual) -> Result<()> {
        let node_a = a.tree().random_node(&mut self.rng);
        let node_b = b.tree().random_node(&mut self.rng);
        swap_subtrees(a, node_a, b, node_b)
    }
}

impl Operator for SubtreeCrossover {
    fn name(&self) -> &str {
        "subtree"
    }

    fn probability(&self) -> f64 {
        self.probability
    }

    fn set_probability(&mut self, probability: f64) -> Result<()> {
        self.probability = check_probability(probability)?;
        Ok(())
    }

    fn set_params(&mut self, params: &str) -> Result<()> {
        let map = parse_operator_params(params, &[])?;
        self.probability = map.probability()?.unwrap_or(DEFAULT_PROBABILITY);
        Ok(())
    }

    fn params(&self) -> String {
        let mut map = ParamMap::new();
        map.insert("PROB", self.probability);
        map.to_string()
    }
}

impl CrossoverOperator for SubtreeCrossover {
    fn crossover(&mut self, mut parents: Population) -> Result<Population> {
        let mut crossed = 0;
        for pair in parents.individuals_mut().chunks_mut(2) {
            if let [a, b] = pair {
                if self.rng.gen_bool(self.probability) {
                    self.cross(a, b)?;
                    crossed += 1;
                }
            }
        }
        log::trace!("Subtree crossover recombined {} pairs", crossed);
        Ok(parents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::tree::Tree;
    use crate::types::Sign;

    fn chain(depth: usize) -> Tree {
        let mut tree = Tree::leaf(0.0);
        let mut node = tree.root();
        for level in 0..depth {
            tree.split(node, level, Sign::Less, 1.0, 2).unwrap();
            node = tree.node(node).children()[0];
        }
        tree
    }

    #[test]
    fn test_swap_sizes() {
        let mut a = Individual::new(chain(3), 1);
        let mut b = Individual::new(chain(1), 1);
        let node_a = a.tree().node(a.tree().root()).children()[0];
        let node_b = b.tree().root();
        let (size_a, size_b) = (a.tree().node(node_a).size(), b.tree().size());

        swap_subtrees(&mut a, node_a, &mut b, node_b).unwrap();
        assert_eq!(a.tree().size(), 7 - size_a + size_b);
        assert_eq!(b.tree().size(), size_a);
        assert!(a.has_changed() && b.has_changed());
        a.tree().validate().unwrap();
        b.tree().validate().unwrap();
    }

    #[test]
    fn test_zero_probability_passes_through() {
        use crate::engines::evaluation::{FitnessFunctions, SingleComparator, SizeFitness};
        use std::sync::Arc;

        let comparator = Arc::new(
            SingleComparator::new(FitnessFunctions::new().with(Box::new(SizeFitness)), 0).unwrap(),
        );
        let parents = Population::with_individuals(
            comparator,
            2,
            vec![Individual::new(chain(2), 1), Individual::new(chain(1), 1)],
        );
        let mut op = SubtreeCrossover::new(3);
        op.set_probability(0.0).unwrap();
        let offspring = op.crossover(parents).unwrap();
        assert_eq!(offspring.individuals()[0].tree(), &chain(2));
        assert_eq!(offspring.individuals()[1].tree(), &chain(1));
    }

    #[test]
    fn test_params_round_trip() {
        let mut op = SubtreeCrossover::new(0);
        op.set_params("PROB 0.35").unwrap();
        assert_eq!(op.params(), "PROB 0.35");
        let mut other = SubtreeCrossover::new(1);
        other.set_params(&op.params()).unwrap();
        assert_eq!(other.probability(), 0.35);
        assert!(op.set_params("PROB 2").is_err());
        op.set_params("").unwrap();
        assert_eq!(op.probability(), DEFAULT_PROBABILITY);
    }
}
