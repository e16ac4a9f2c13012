use super::fitness::FitnessFunctions;
use crate::data::Dataset;
use crate::engines::generation::Individual;
use crate::error::Result;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};

/// How fitness work is handed to the worker pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkSplit {
    /// One task per individual
    PerIndividual,
    /// One task per block of this many individuals
    Blocks(usize),
}

impl Default for WorkSplit {
    fn default() -> Self {
        WorkSplit::PerIndividual
    }
}

/// Fills the fitness vectors of every changed individual.
///
/// With more than one thread a pool is built for the call and dropped when it
/// returns, so no work outlives the evaluation phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitnessEvaluator {
    threads: usize,
    split: WorkSplit,
}

impl Default for FitnessEvaluator {
    fn default() -> Self {
        Self {
            threads: 1,
            split: WorkSplit::PerIndividual,
        }
    }
}

impl FitnessEvaluator {
    pub fn new(threads: usize, split: WorkSplit) -> Self {
        Self {
            threads: threads.max(1),
            split,
        }
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Evaluates all changed individuals and returns how many there were
    pub fn evaluate(
        &self,
        functions: &FitnessFunctions,
        individuals: &mut [Individual],
        dataset: &dyn Dataset,
    ) -> Result<usize> {
        let changed = individuals.iter().filter(|i| i.has_changed()).count();
        if changed == 0 {
            return Ok(0);
        }

        if self.threads <= 1 {
            for slot in 0..functions.len() {
                for individual in individuals.iter_mut() {
                    functions.compute_fitness(slot, individual, dataset)?;
                }
            }
        } else {
            let pool = ThreadPoolBuilder::new().num_threads(self.threads).build()?;
            pool.install(|| -> Result<()> {
                for slot in 0..functions.len() {
                    match self.split {
                        WorkSplit::PerIndividual => individuals
                            .par_iter_mut()
                            .try_for_each(|ind| functions.compute_fitness(slot, ind, dataset).map(|_| ()))?,
                        WorkSplit::Blocks(block) => individuals
                            .par_chunks_mut(block.max(1))
                            .try_for_each(|chunk| {
                                chunk
                                    .iter_mut()
                                    .try_for_each(|ind| functions.compute_fitness(slot, ind, dataset).map(|_| ()))
                            })?,
                    }
                }
                Ok(())
            })?;
        }

        for individual in individuals.iter_mut().filter(|i| i.has_changed()) {
            individual.unchange();
        }

        log::debug!(
            "Evaluated {} individuals on {} functions with {} thread(s)",
            changed,
            functions.len(),
            self.threads
        );
        Ok(changed)
    }
}
