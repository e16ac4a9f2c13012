use super::individual::Individual;
use super::operators::{CrossoverOperator, MutationOperator};
use super::selection::Selector;
use crate::data::Dataset;
use crate::engines::evaluation::FitnessComparator;
use crate::error::{EvoTreeError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::sync::Arc;

/// Individuals plus the comparator that ranks them.
///
/// Every generational phase takes an optional destination: with `None` it
/// produces a fresh population sharing this comparator and maximum size,
/// with `Some(dest)` it appends into `dest` and returns it.
#[derive(Clone)]
pub struct Population {
    individuals: Vec<Individual>,
    comparator: Arc<dyn FitnessComparator>,
    max_size: usize,
}

impl Population {
    pub fn new(comparator: Arc<dyn FitnessComparator>, max_size: usize) -> Self {
        Self {
            individuals: Vec::with_capacity(max_size),
            comparator,
            max_size,
        }
    }

    pub fn with_individuals(
        comparator: Arc<dyn FitnessComparator>,
        max_size: usize,
        individuals: Vec<Individual>,
    ) -> Self {
        Self {
            individuals,
            comparator,
            max_size,
        }
    }

    /// Empty population with the same comparator and maximum size
    pub fn empty_like(&self) -> Self {
        Self::new(self.comparator.clone(), self.max_size)
    }

    /// Empty population with the same comparator, sized for `capacity`
    pub fn empty_with_capacity(&self, capacity: usize) -> Self {
        Self::new(self.comparator.clone(), capacity)
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn comparator(&self) -> &Arc<dyn FitnessComparator> {
        &self.comparator
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub fn individuals_mut(&mut self) -> &mut [Individual] {
        &mut self.individuals
    }

    pub fn into_individuals(self) -> Vec<Individual> {
        self.individuals
    }

    pub fn push(&mut self, individual: Individual) {
        self.individuals.push(individual);
    }

    /// Moves every individual of `other` into this population
    pub fn absorb(&mut self, other: Population) {
        self.individuals.extend(other.individuals);
    }

    /// Indices best first in comparator order
    pub fn ranked_indices(&self) -> Result<Vec<usize>> {
        self.comparator.rank(&self.individuals)
    }

    pub fn best(&self) -> Result<Option<&Individual>> {
        Ok(self.ranked_indices()?.first().map(|&i| &self.individuals[i]))
    }

    /// Copies of the `k` best individuals, best first
    pub fn top(&self, k: usize) -> Result<Vec<Individual>> {
        Ok(self
            .ranked_indices()?
            .into_iter()
            .take(k)
            .map(|i| self.individuals[i].clone())
            .collect())
    }

    /// Reorders the individuals best first
    pub fn sort(&mut self) -> Result<()> {
        let order = self.ranked_indices()?;
        let mut slots: Vec<Option<Individual>> = self.individuals.drain(..).map(Some).collect();
        self.individuals = order.into_iter().filter_map(|i| slots[i].take()).collect();
        Ok(())
    }

    fn destination(&self, dest: Option<Population>) -> Population {
        dest.unwrap_or_else(|| self.empty_like())
    }

    /// Builds the mating pool of `max_size` individuals.
    ///
    /// Without selectors the whole population is shuffled and used as is.
    /// Otherwise each selector draws `max_size / selectors.len()` and the last
    /// one also draws whatever rounding left over.
    pub fn selection_phase(
        &self,
        selectors: &mut [Box<dyn Selector>],
        rng: &mut StdRng,
        dest: Option<Population>,
    ) -> Result<Population> {
        let mut dest = self.destination(dest);
        if selectors.is_empty() {
            let mut pool = self.individuals.clone();
            pool.shuffle(rng);
            dest.individuals.extend(pool);
            return Ok(dest);
        }
        self.fill(selectors, self.max_size, &mut dest)?;
        Ok(dest)
    }

    /// Runs the crossover operators in sequence, each consuming the previous
    /// stage's output, then applies every mutation operator in place.
    pub fn operator_phase(
        self,
        crossovers: &mut [Box<dyn CrossoverOperator>],
        mutations: &mut [Box<dyn MutationOperator>],
        dataset: &dyn Dataset,
        dest: Option<Population>,
    ) -> Result<Population> {
        let mut offspring = self;
        for crossover in crossovers.iter_mut() {
            offspring = crossover.crossover(offspring)?;
        }
        for mutation in mutations.iter_mut() {
            mutation.mutate(&mut offspring, dataset)?;
        }
        match dest {
            Some(mut dest) => {
                dest.absorb(offspring);
                Ok(dest)
            }
            None => Ok(offspring),
        }
    }

    /// Copies the top `floor(elitism_rate * len)` individuals
    pub fn elite_phase(&self, elitism_rate: f64, dest: Option<Population>) -> Result<Population> {
        if !(0.0..=1.0).contains(&elitism_rate) {
            return Err(EvoTreeError::Configuration(format!(
                "Elitism rate {} outside [0, 1]",
                elitism_rate
            )));
        }
        let mut dest = self.destination(dest);
        let count = (elitism_rate * self.len() as f64).floor() as usize;
        if count > 0 {
            dest.individuals.extend(self.top(count)?);
        }
        Ok(dest)
    }

    /// Fills `dest` up to `max_size` with individuals drawn from this pool,
    /// using the same quota policy as `selection_phase`.
    pub fn env_selection_phase(
        &self,
        selectors: &mut [Box<dyn Selector>],
        dest: Option<Population>,
    ) -> Result<Population> {
        if selectors.is_empty() {
            return Err(EvoTreeError::Generation(
                "No environmental selectors configured".to_string(),
            ));
        }
        let mut dest = self.destination(dest);
        let needed = self.max_size.saturating_sub(dest.len());
        self.fill(selectors, needed, &mut dest)?;
        Ok(dest)
    }

    fn fill(&self, selectors: &mut [Box<dyn Selector>], needed: usize, dest: &mut Population) -> Result<()> {
        let quota = needed / selectors.len();
        let mut drawn = 0;
        for selector in selectors.iter_mut() {
            let picked = selector.select(self, quota)?;
            drawn += picked.len();
            dest.absorb(picked);
        }
        if drawn < needed {
            if let Some(last) = selectors.last_mut() {
                dest.absorb(last.select(self, needed - drawn)?);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Population {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Population")
            .field("size", &self.individuals.len())
            .field("max_size", &self.max_size)
            .field("comparator", &self.comparator.name())
            .finish()
    }
}
