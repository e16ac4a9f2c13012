use super::{
    check_probability, parse_operator_params, MutationOperator, Operator, OperatorRequirements,
};
use crate::data::Dataset;
use crate::engines::generation::stumps::{global_leaf_value, leaf_value, StumpGenerator};
use crate::engines::generation::Population;
use crate::error::{EvoTreeError, Result};
use crate::functions::ParamMap;
use crate::types::TargetSupport;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

const DEFAULT_PROBABILITY: f64 = 0.1;
const DEFAULT_JITTER: f64 = 1.0;

fn probability_params(probability: f64) -> String {
    let mut map = ParamMap::new();
    map.insert("PROB", probability);
    map.to_string()
}

fn check_target(name: &str, target: TargetSupport, dataset: &dyn Dataset) -> Result<()> {
    if !target.accepts(dataset.class_kind()) {
        return Err(EvoTreeError::Incompatible(format!(
            "'{}' does not support a {:?} class attribute",
            name,
            dataset.class_kind()
        )));
    }
    Ok(())
}

/// Perturbs one random leaf: a new random class index for a nominal class,
/// or the current value jittered by up to `±JITTER` for a numeric one.
pub struct ValueChangeMutation {
    rng: StdRng,
    probability: f64,
    jitter: f64,
}

impl ValueChangeMutation {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            probability: DEFAULT_PROBABILITY,
            jitter: DEFAULT_JITTER,
        }
    }
}

impl Operator for ValueChangeMutation {
    fn name(&self) -> &str {
        "value-change"
    }

    fn probability(&self) -> f64 {
        self.probability
    }

    fn set_probability(&mut self, probability: f64) -> Result<()> {
        self.probability = check_probability(probability)?;
        Ok(())
    }

    fn set_params(&mut self, params: &str) -> Result<()> {
        let map = parse_operator_params(params, &["JITTER"])?;
        self.probability = map.probability()?.unwrap_or(DEFAULT_PROBABILITY);
        self.jitter = match map.get_f64("JITTER")? {
            Some(j) if j < 0.0 || !j.is_finite() => {
                return Err(EvoTreeError::Configuration(format!("JITTER {} must be non-negative", j)))
            }
            Some(j) => j,
            None => DEFAULT_JITTER,
        };
        Ok(())
    }

    fn params(&self) -> String {
        let mut map = ParamMap::new();
        map.insert("PROB", self.probability);
        map.insert("JITTER", self.jitter);
        map.to_string()
    }
}

impl MutationOperator for ValueChangeMutation {
    fn mutate(&mut self, population: &mut Population, dataset: &dyn Dataset) -> Result<()> {
        let classes = dataset.num_classes();
        for individual in population.individuals_mut() {
            if !self.rng.gen_bool(self.probability) {
                continue;
            }
            let leaves = individual.tree().leaves();
            let leaf = leaves[self.rng.gen_range(0..leaves.len())];
            let value = if classes > 0 {
                self.rng.gen_range(0..classes) as f64
            } else {
                let current = individual.tree().node(leaf).value();
                current + self.rng.gen_range(-self.jitter..=self.jitter)
            };
            individual.tree_mut().set_value(leaf, value)?;
        }
        Ok(())
    }
}

/// Collapses a random internal node into a leaf predicting the majority
/// class (nominal) or mean response (numeric) of the records reaching it.
pub struct NodeToLeafMutation {
    rng: StdRng,
    probability: f64,
    target: TargetSupport,
}

impl NodeToLeafMutation {
    pub fn nominal(seed: u64) -> Self {
        Self::with_target(seed, TargetSupport::Nominal)
    }

    pub fn numeric(seed: u64) -> Self {
        Self::with_target(seed, TargetSupport::Numeric)
    }

    fn with_target(seed: u64, target: TargetSupport) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            probability: DEFAULT_PROBABILITY,
            target,
        }
    }
}

impl Operator for NodeToLeafMutation {
    fn name(&self) -> &str {
        match self.target {
            TargetSupport::Numeric => "node-to-leaf-numeric",
            _ => "node-to-leaf-nominal",
        }
    }

    fn probability(&self) -> f64 {
        self.probability
    }

    fn set_probability(&mut self, probability: f64) -> Result<()> {
        self.probability = check_probability(probability)?;
        Ok(())
    }

    fn requirements(&self) -> OperatorRequirements {
        OperatorRequirements {
            target: self.target,
            needs_stumps: false,
        }
    }

    fn set_params(&mut self, params: &str) -> Result<()> {
        let map = parse_operator_params(params, &[])?;
        self.probability = map.probability()?.unwrap_or(DEFAULT_PROBABILITY);
        Ok(())
    }

    fn params(&self) -> String {
        probability_params(self.probability)
    }
}

impl MutationOperator for NodeToLeafMutation {
    fn mutate(&mut self, population: &mut Population, dataset: &dyn Dataset) -> Result<()> {
        check_target(self.name(), self.target, dataset)?;
        let records: Vec<usize> = (0..dataset.num_records()).collect();
        let fallback = global_leaf_value(dataset);

        for individual in population.individuals_mut() {
            if !self.rng.gen_bool(self.probability) {
                continue;
            }
            let internal = individual.tree().internal_nodes();
            if internal.is_empty() {
                continue;
            }
            let node = internal[self.rng.gen_range(0..internal.len())];
            let reaching = individual.tree().records_reaching(node, dataset, &records)?;
            let value = leaf_value(dataset, &reaching, fallback);
            individual.tree_mut().make_leaf(node, value)?;
        }
        Ok(())
    }
}

/// Replaces a random leaf with a stump built by the attached generator from
/// the records reaching that leaf.
pub struct DecisionStumpMutation {
    rng: StdRng,
    probability: f64,
    generator: Option<Arc<dyn StumpGenerator>>,
}

impl DecisionStumpMutation {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            probability: DEFAULT_PROBABILITY,
            generator: None,
        }
    }
}

impl Operator for DecisionStumpMutation {
    fn name(&self) -> &str {
        "stump"
    }

    fn probability(&self) -> f64 {
        self.probability
    }

    fn set_probability(&mut self, probability: f64) -> Result<()> {
        self.probability = check_probability(probability)?;
        Ok(())
    }

    fn requirements(&self) -> OperatorRequirements {
        OperatorRequirements {
            target: TargetSupport::Any,
            needs_stumps: true,
        }
    }

    fn set_params(&mut self, params: &str) -> Result<()> {
        let map = parse_operator_params(params, &[])?;
        self.probability = map.probability()?.unwrap_or(DEFAULT_PROBABILITY);
        Ok(())
    }

    fn params(&self) -> String {
        probability_params(self.probability)
    }
}

impl MutationOperator for DecisionStumpMutation {
    fn mutate(&mut self, population: &mut Population, dataset: &dyn Dataset) -> Result<()> {
        let generator = self.generator.clone().ok_or_else(|| {
            EvoTreeError::Incompatible("Decision-stump mutation has no stump generator".to_string())
        })?;
        let records: Vec<usize> = (0..dataset.num_records()).collect();

        for individual in population.individuals_mut() {
            if !self.rng.gen_bool(self.probability) {
                continue;
            }
            let leaves = individual.tree().leaves();
            let leaf = leaves[self.rng.gen_range(0..leaves.len())];
            let reaching = individual.tree().records_reaching(leaf, dataset, &records)?;
            let stump = generator.generate(dataset, &reaching, &mut self.rng)?;
            individual.tree_mut().replace_subtree(leaf, &stump)?;
        }
        Ok(())
    }

    fn attach_stump_generator(&mut self, generator: Arc<dyn StumpGenerator>) {
        self.generator = Some(generator);
    }
}
