use super::individual::Individual;
use super::population::Population;
use super::stumps::{global_leaf_value, leaf_value, sample_threshold};
use crate::data::Dataset;
use crate::engines::evaluation::FitnessComparator;
use crate::engines::tree::Tree;
use crate::error::{EvoTreeError, Result};
use crate::functions::ParamMap;
use crate::types::{AttributeKind, NodeId, Sign};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Produces the starting population of a run
pub trait PopulationInitializer: Send {
    fn name(&self) -> &str;

    fn initialize(
        &mut self,
        dataset: &dyn Dataset,
        comparator: Arc<dyn FitnessComparator>,
        size: usize,
        rng: &mut StdRng,
    ) -> Result<Population>;

    fn set_params(&mut self, params: &str) -> Result<()>;

    fn params(&self) -> String;
}

/// Records each tree is grown from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sampling {
    /// Every tree sees the whole dataset
    Full,
    /// Every tree sees its own bootstrap sample
    Bootstrap,
    /// Records are split into this many disjoint parts, assigned round-robin
    Partition(usize),
}

const DEFAULT_MAX_HEIGHT: usize = 4;
const DEFAULT_LEAF_PROBABILITY: f64 = 0.3;

/// Grows random trees top-down.
///
/// Each node becomes a leaf once `max_height` is reached or with
/// `leaf_probability` (never at the root). Split nodes use a random attribute
/// and, for numeric attributes, a threshold sampled from the records reaching
/// them. Leaves predict the majority class or mean response of their records.
///
/// Per-tree seeds are drawn sequentially before any tree is grown, so the
/// result does not depend on the thread count.
#[derive(Debug, Clone)]
pub struct RandomTreeInitializer {
    max_height: usize,
    leaf_probability: f64,
    threads: usize,
    sampling: Sampling,
}

impl Default for RandomTreeInitializer {
    fn default() -> Self {
        Self {
            max_height: DEFAULT_MAX_HEIGHT,
            leaf_probability: DEFAULT_LEAF_PROBABILITY,
            threads: 1,
            sampling: Sampling::Full,
        }
    }
}

impl RandomTreeInitializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_height(mut self, max_height: usize) -> Self {
        self.max_height = max_height;
        self
    }

    pub fn with_leaf_probability(mut self, leaf_probability: f64) -> Self {
        self.leaf_probability = leaf_probability;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    fn grow(&self, dataset: &dyn Dataset, records: Option<Vec<usize>>, fallback: f64, seed: u64) -> Result<Tree> {
        let mut rng = StdRng::seed_from_u64(seed);
        let records = match records {
            Some(records) => records,
            None => dataset.resample(dataset.num_records(), &mut rng),
        };
        let mut tree = Tree::leaf(leaf_value(dataset, &records, fallback));
        let mut pending: Vec<(NodeId, usize, Vec<usize>)> = vec![(tree.root(), 0, records)];

        while let Some((node, depth, records)) = pending.pop() {
            let value = leaf_value(dataset, &records, fallback);
            tree.set_value(node, value)?;

            let stop = depth >= self.max_height || (depth > 0 && rng.gen_bool(self.leaf_probability));
            if stop || dataset.num_attributes() == 0 {
                continue;
            }

            let attribute = rng.gen_range(0..dataset.num_attributes());
            let kind = dataset.attribute_kind(attribute);
            if kind.arity() < 2 {
                continue;
            }
            let threshold = match kind {
                AttributeKind::Numeric => match sample_threshold(dataset, attribute, &records, &mut rng) {
                    Some(t) => t,
                    None => continue,
                },
                AttributeKind::Nominal { .. } => 0.0,
            };

            tree.split(node, attribute, Sign::for_kind(kind), threshold, kind.arity())?;
            let mut branches: Vec<Vec<usize>> = vec![Vec::new(); kind.arity()];
            for &record in &records {
                if let Some(branch) = tree.branch(node, dataset, record) {
                    branches[branch].push(record);
                }
            }
            // Children inherit `value`, which stays the prediction of empty branches
            let children = tree.node(node).children().to_vec();
            for (child, branch_records) in children.into_iter().zip(branches).rev() {
                if !branch_records.is_empty() {
                    pending.push((child, depth + 1, branch_records));
                }
            }
        }
        Ok(tree)
    }

    /// Fixed record sets per tree; `None` means a bootstrap sample drawn
    /// from the tree's own generator
    fn record_sets(&self, dataset: &dyn Dataset, trees: usize, rng: &mut StdRng) -> Vec<Option<Vec<usize>>> {
        match self.sampling {
            Sampling::Full => vec![Some((0..dataset.num_records()).collect()); trees],
            Sampling::Bootstrap => vec![None; trees],
            Sampling::Partition(parts) => {
                let groups = dataset.partition(parts, rng);
                (0..trees).map(|i| Some(groups[i % groups.len()].clone())).collect()
            }
        }
    }
}

impl PopulationInitializer for RandomTreeInitializer {
    fn name(&self) -> &str {
        "random-tree"
    }

    fn initialize(
        &mut self,
        dataset: &dyn Dataset,
        comparator: Arc<dyn FitnessComparator>,
        size: usize,
        rng: &mut StdRng,
    ) -> Result<Population> {
        if dataset.num_records() == 0 {
            return Err(EvoTreeError::DataShape(
                "Cannot initialize a population from an empty dataset".to_string(),
            ));
        }

        let seeds: Vec<u64> = (0..size).map(|_| rng.next_u64()).collect();
        let record_sets = self.record_sets(dataset, size, rng);
        let fallback = global_leaf_value(dataset);
        let jobs: Vec<(u64, Option<Vec<usize>>)> = seeds.into_iter().zip(record_sets).collect();

        let trees: Vec<Tree> = if self.threads <= 1 {
            jobs.into_iter()
                .map(|(seed, records)| self.grow(dataset, records, fallback, seed))
                .collect::<Result<_>>()?
        } else {
            let pool = ThreadPoolBuilder::new().num_threads(self.threads).build()?;
            pool.install(|| {
                jobs.into_par_iter()
                    .map(|(seed, records)| self.grow(dataset, records, fallback, seed))
                    .collect::<Result<Vec<Tree>>>()
            })?
        };

        let slots = comparator.functions().len();
        let individuals = trees.into_iter().map(|tree| Individual::new(tree, slots)).collect();
        log::info!(
            "Initialized {} random trees (max height {}, sampling {:?})",
            size,
            self.max_height,
            self.sampling
        );
        Ok(Population::with_individuals(comparator, size, individuals))
    }

    fn set_params(&mut self, params: &str) -> Result<()> {
        let map = ParamMap::parse(params)?;
        map.ensure_known(&["HEIGHT", "LEAF", "THREADS", "SAMPLING", "PARTS"])?;

        let defaults = Self::default();
        self.max_height = map.get_usize("HEIGHT")?.unwrap_or(defaults.max_height);
        self.leaf_probability = match map.get_f64("LEAF")? {
            Some(p) if !(0.0..=1.0).contains(&p) => {
                return Err(EvoTreeError::Configuration(format!("LEAF {} outside [0, 1]", p)))
            }
            Some(p) => p,
            None => defaults.leaf_probability,
        };
        self.threads = map.get_usize("THREADS")?.unwrap_or(defaults.threads).max(1);
        self.sampling = match map.get("SAMPLING").map(str::to_uppercase).as_deref() {
            None | Some("FULL") => Sampling::Full,
            Some("BOOTSTRAP") => Sampling::Bootstrap,
            Some("PARTITION") => Sampling::Partition(map.get_usize("PARTS")?.unwrap_or(2).max(1)),
            Some(other) => {
                return Err(EvoTreeError::Configuration(format!(
                    "Unknown sampling '{}'",
                    other
                )))
            }
        };
        Ok(())
    }

    fn params(&self) -> String {
        let mut map = ParamMap::new();
        map.insert("HEIGHT", self.max_height);
        map.insert("LEAF", self.leaf_probability);
        map.insert("THREADS", self.threads);
        match self.sampling {
            Sampling::Full => map.insert("SAMPLING", "FULL"),
            Sampling::Bootstrap => map.insert("SAMPLING", "BOOTSTRAP"),
            Sampling::Partition(parts) => {
                map.insert("SAMPLING", "PARTITION");
                map.insert("PARTS", parts);
            }
        }
        map.to_string()
    }
}
