use super::population::Population;
use crate::error::{EvoTreeError, Result};
use crate::functions::ParamMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;

/// Probability that a tournament returns the better of its two entrants
pub const TOURNAMENT_WIN_PROBABILITY: f64 = 0.8;

/// Draws individuals out of a population.
///
/// Selected individuals are copies; the source population is not modified.
pub trait Selector: Send {
    fn name(&self) -> &str;

    /// Returns exactly `count` individuals drawn from `population`
    fn select(&mut self, population: &Population, count: usize) -> Result<Population>;

    fn set_params(&mut self, params: &str) -> Result<()> {
        ParamMap::parse(params)?.ensure_known(&[])
    }

    fn params(&self) -> String {
        String::new()
    }
}

fn ensure_not_empty(population: &Population, selector: &str) -> Result<()> {
    if population.is_empty() {
        return Err(EvoTreeError::Generation(format!(
            "{} selector cannot draw from an empty population",
            selector
        )));
    }
    Ok(())
}

/// Uniform sampling with replacement
pub struct RandomSelector {
    rng: StdRng,
}

impl RandomSelector {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Selector for RandomSelector {
    fn name(&self) -> &str {
        "random"
    }

    fn select(&mut self, population: &Population, count: usize) -> Result<Population> {
        let mut selected = population.empty_with_capacity(count);
        if count == 0 {
            return Ok(selected);
        }
        ensure_not_empty(population, self.name())?;
        for _ in 0..count {
            let i = self.rng.gen_range(0..population.len());
            selected.push(population.individuals()[i].clone());
        }
        Ok(selected)
    }
}

/// Binary tournament: two uniform draws, the better one wins with
/// probability [`TOURNAMENT_WIN_PROBABILITY`].
///
/// With a total-order comparator the entrants are compared directly. With a
/// partial order (Pareto) they are compared by their position in the
/// population ranking.
pub struct TournamentSelector {
    rng: StdRng,
}

impl TournamentSelector {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Selector for TournamentSelector {
    fn name(&self) -> &str {
        "tournament"
    }

    fn select(&mut self, population: &Population, count: usize) -> Result<Population> {
        let mut selected = population.empty_with_capacity(count);
        if count == 0 {
            return Ok(selected);
        }
        ensure_not_empty(population, self.name())?;

        let comparator = population.comparator().clone();
        let positions = if comparator.is_total_order() {
            None
        } else {
            let order = population.ranked_indices()?;
            let mut positions = vec![0; order.len()];
            for (position, &index) in order.iter().enumerate() {
                positions[index] = position;
            }
            Some(positions)
        };

        let individuals = population.individuals();
        for _ in 0..count {
            let a = self.rng.gen_range(0..individuals.len());
            let b = self.rng.gen_range(0..individuals.len());
            let ordering = match &positions {
                Some(positions) => positions[a].cmp(&positions[b]),
                None => comparator.compare(&individuals[a], &individuals[b])?,
            };
            let (better, worse) = match ordering {
                Ordering::Greater => (b, a),
                _ => (a, b),
            };
            let winner = if self.rng.gen_bool(TOURNAMENT_WIN_PROBABILITY) {
                better
            } else {
                worse
            };
            selected.push(individuals[winner].clone());
        }
        Ok(selected)
    }
}

/// Fitness-proportionate selection on one fitness slot.
///
/// Values are oriented so larger is better and shifted up when negative.
/// When every weight is zero the draw falls back to uniform.
pub struct RouletteSelector {
    rng: StdRng,
    slot: usize,
}

impl RouletteSelector {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            slot: 0,
        }
    }

    pub fn with_slot(mut self, slot: usize) -> Self {
        self.slot = slot;
        self
    }

    fn weights(&self, population: &Population) -> Result<Vec<f64>> {
        let direction = population
            .comparator()
            .functions()
            .get(self.slot)
            .map(|f| f.direction())
            .ok_or_else(|| {
                EvoTreeError::Configuration(format!("Roulette slot {} has no fitness function", self.slot))
            })?;

        let values = population
            .individuals()
            .iter()
            .map(|ind| {
                ind.fitness_at(self.slot).map(|v| direction.orient(v)).ok_or_else(|| {
                    EvoTreeError::Computation("Roulette selection on an unevaluated individual".to_string())
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let shift = if min < 0.0 { -min } else { 0.0 };
        Ok(values.into_iter().map(|v| v + shift).collect())
    }
}

impl Selector for RouletteSelector {
    fn name(&self) -> &str {
        "roulette"
    }

    fn select(&mut self, population: &Population, count: usize) -> Result<Population> {
        let mut selected = population.empty_with_capacity(count);
        if count == 0 {
            return Ok(selected);
        }
        ensure_not_empty(population, self.name())?;

        let weights = self.weights(population)?;
        let total: f64 = weights.iter().sum();
        let individuals = population.individuals();

        for _ in 0..count {
            let index = if total > 0.0 && total.is_finite() {
                let threshold = self.rng.gen::<f64>() * total;
                let mut cumulative = 0.0;
                weights
                    .iter()
                    .position(|w| {
                        cumulative += w;
                        cumulative > threshold
                    })
                    .unwrap_or(weights.len() - 1)
            } else {
                self.rng.gen_range(0..individuals.len())
            };
            selected.push(individuals[index].clone());
        }
        Ok(selected)
    }

    fn set_params(&mut self, params: &str) -> Result<()> {
        let map = ParamMap::parse(params)?;
        map.ensure_known(&["SLOT"])?;
        self.slot = map.get_usize("SLOT")?.unwrap_or(0);
        Ok(())
    }

    fn params(&self) -> String {
        format!("SLOT {}", self.slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::evaluation::{FitnessFunctions, SingleComparator, SizeFitness};
    use crate::engines::generation::Individual;
    use crate::engines::tree::Tree;
    use std::sync::Arc;

    fn population(values: &[f64]) -> Population {
        let comparator = Arc::new(
            SingleComparator::new(FitnessFunctions::new().with(Box::new(SizeFitness)), 0).unwrap(),
        );
        let individuals = values
            .iter()
            .map(|&v| {
                let mut ind = Individual::new(Tree::leaf(v), 1);
                ind.set_fitness(0, v);
                ind.unchange();
                ind
            })
            .collect();
        Population::with_individuals(comparator, values.len(), individuals)
    }

    #[test]
    fn test_selectors_return_exact_count() {
        let pop = population(&[0.1, 0.5, 0.9]);
        let mut selectors: Vec<Box<dyn Selector>> = vec![
            Box::new(RandomSelector::new(1)),
            Box::new(TournamentSelector::new(2)),
            Box::new(RouletteSelector::new(3)),
        ];
        for selector in selectors.iter_mut() {
            assert_eq!(selector.select(&pop, 7).unwrap().len(), 7);
            assert_eq!(selector.select(&pop, 0).unwrap().len(), 0);
        }
    }

    #[test]
    fn test_empty_population_is_an_error() {
        let pop = population(&[]);
        assert!(RandomSelector::new(0).select(&pop, 1).is_err());
        assert!(TournamentSelector::new(0).select(&pop, 1).is_err());
    }

    #[test]
    fn test_tournament_favours_better() {
        let pop = population(&[0.0, 1.0]);
        let picked = TournamentSelector::new(11).select(&pop, 2000).unwrap();
        let wins = picked
            .individuals()
            .iter()
            .filter(|i| i.fitness_at(0) == Some(1.0))
            .count();
        // 0.25 (drawn twice) + 0.5 * 0.8 (mixed pair) = 0.65
        assert!(wins > 1200 && wins < 1400, "wins = {}", wins);
    }

    #[test]
    fn test_roulette_zero_weight_never_drawn() {
        let pop = population(&[0.0, 2.0, 0.0]);
        let picked = RouletteSelector::new(5).select(&pop, 200).unwrap();
        assert!(picked.individuals().iter().all(|i| i.fitness_at(0) == Some(2.0)));
    }

    #[test]
    fn test_roulette_params() {
        let mut roulette = RouletteSelector::new(0);
        roulette.set_params("SLOT 2").unwrap();
        assert_eq!(roulette.params(), "SLOT 2");
        assert!(roulette.set_params("SIZE 2").is_err());
    }
}
