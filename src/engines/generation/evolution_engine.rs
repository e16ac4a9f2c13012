use super::ensemble::Ensemble;
use super::individual::Individual;
use super::initializer::{PopulationInitializer, RandomTreeInitializer};
use super::operators::{CrossoverOperator, MutationOperator, Operator};
use super::population::Population;
use super::selection::Selector;
use super::stumps::StumpGenerator;
use crate::data::Dataset;
use crate::engines::evaluation::{FitnessComparator, FitnessEvaluator};
use crate::engines::metrics::MetricsEngine;
use crate::error::{EvoTreeError, Result};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub trait ProgressCallback: Send {
    fn on_generation_start(&mut self, generation: usize);
    fn on_individuals_evaluated(&mut self, evaluated: usize, total: usize);
    fn on_generation_complete(&mut self, stats: &GenerationStats);
}

/// Lifecycle of an [`EvolutionEngine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Configured,
    Running { generation: usize },
    Done,
}

/// Snapshot of one generation after replacement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: usize,
    /// Individuals whose fitness was computed during this generation
    pub evaluated: usize,
    pub best_fitness: Vec<f64>,
    /// Mean of fitness slot 0
    pub mean_fitness: f64,
    pub mean_size: f64,
    pub mean_height: f64,
}

impl GenerationStats {
    fn collect(generation: usize, evaluated: usize, population: &Population) -> Result<Self> {
        let best_fitness = population
            .best()?
            .map(|best| best.fitness().to_vec())
            .unwrap_or_default();
        let n = population.len().max(1) as f64;
        let individuals = population.individuals();
        Ok(Self {
            generation,
            evaluated,
            best_fitness,
            mean_fitness: individuals.iter().filter_map(|i| i.fitness_at(0)).sum::<f64>() / n,
            mean_size: individuals.iter().map(|i| i.tree().size() as f64).sum::<f64>() / n,
            mean_height: individuals.iter().map(|i| i.tree().height() as f64).sum::<f64>() / n,
        })
    }
}

/// Result of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionOutcome {
    pub best: Individual,
    /// Compact rendering of the best tree
    pub best_tree: String,
    pub fitness_names: Vec<String>,
    pub best_metrics: HashMap<String, f64>,
    pub history: Vec<GenerationStats>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl EvolutionOutcome {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Assembles and validates an [`EvolutionEngine`].
pub struct EvolutionBuilder {
    population_size: usize,
    generations: usize,
    elitism_rate: f64,
    seed: Option<u64>,
    evaluator: FitnessEvaluator,
    comparator: Option<Arc<dyn FitnessComparator>>,
    initializer: Box<dyn PopulationInitializer>,
    selectors: Vec<Box<dyn Selector>>,
    env_selectors: Vec<Box<dyn Selector>>,
    crossovers: Vec<Box<dyn CrossoverOperator>>,
    mutations: Vec<Box<dyn MutationOperator>>,
    stump_generator: Option<Arc<dyn StumpGenerator>>,
}

impl Default for EvolutionBuilder {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 10,
            elitism_rate: 0.0,
            seed: None,
            evaluator: FitnessEvaluator::default(),
            comparator: None,
            initializer: Box::new(RandomTreeInitializer::default()),
            selectors: Vec::new(),
            env_selectors: Vec::new(),
            crossovers: Vec::new(),
            mutations: Vec::new(),
            stump_generator: None,
        }
    }
}

impl EvolutionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    pub fn generations(mut self, generations: usize) -> Self {
        self.generations = generations;
        self
    }

    pub fn elitism_rate(mut self, rate: f64) -> Self {
        self.elitism_rate = rate;
        self
    }

    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn evaluator(mut self, evaluator: FitnessEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn comparator(mut self, comparator: Arc<dyn FitnessComparator>) -> Self {
        self.comparator = Some(comparator);
        self
    }

    pub fn initializer(mut self, initializer: Box<dyn PopulationInitializer>) -> Self {
        self.initializer = initializer;
        self
    }

    pub fn selector(mut self, selector: Box<dyn Selector>) -> Self {
        self.selectors.push(selector);
        self
    }

    pub fn env_selector(mut self, selector: Box<dyn Selector>) -> Self {
        self.env_selectors.push(selector);
        self
    }

    pub fn crossover(mut self, operator: Box<dyn CrossoverOperator>) -> Self {
        self.crossovers.push(operator);
        self
    }

    pub fn mutation(mut self, operator: Box<dyn MutationOperator>) -> Self {
        self.mutations.push(operator);
        self
    }

    pub fn stump_generator(mut self, generator: Arc<dyn StumpGenerator>) -> Self {
        self.stump_generator = Some(generator);
        self
    }

    /// Validates the configuration against `dataset` and produces an engine
    /// in the `Configured` state.
    pub fn build(mut self, dataset: Arc<dyn Dataset>) -> Result<EvolutionEngine> {
        if self.population_size < 2 {
            return Err(EvoTreeError::Configuration(format!(
                "Population size must be at least 2, got {}",
                self.population_size
            )));
        }
        if self.generations < 1 {
            return Err(EvoTreeError::Configuration(
                "At least one generation is required".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.elitism_rate) {
            return Err(EvoTreeError::Configuration(format!(
                "Elitism rate must be in [0, 1), got {}",
                self.elitism_rate
            )));
        }
        if self.env_selectors.is_empty() {
            return Err(EvoTreeError::Configuration(
                "At least one environmental selector is required".to_string(),
            ));
        }
        let comparator = self
            .comparator
            .take()
            .ok_or_else(|| EvoTreeError::Configuration("No fitness comparator configured".to_string()))?;
        if comparator.functions().is_empty() {
            return Err(EvoTreeError::Configuration(
                "No fitness functions configured".to_string(),
            ));
        }
        if dataset.num_records() == 0 {
            return Err(EvoTreeError::DataShape("Dataset has no records".to_string()));
        }

        let class_kind = dataset.class_kind();
        for function in comparator.functions().iter() {
            if !function.target_support().accepts(class_kind) {
                return Err(EvoTreeError::Incompatible(format!(
                    "Fitness function '{}' does not support a {:?} class",
                    function.name(),
                    class_kind
                )));
            }
        }

        let requirements = self
            .crossovers
            .iter()
            .map(|c| (c.name().to_string(), c.requirements()))
            .chain(self.mutations.iter().map(|m| (m.name().to_string(), m.requirements())));
        for (name, requirements) in requirements {
            if !requirements.target.accepts(class_kind) {
                return Err(EvoTreeError::Incompatible(format!(
                    "Operator '{}' does not support a {:?} class",
                    name, class_kind
                )));
            }
            if requirements.needs_stumps && self.stump_generator.is_none() {
                return Err(EvoTreeError::Incompatible(format!(
                    "Operator '{}' needs a stump generator",
                    name
                )));
            }
        }
        if let Some(generator) = &self.stump_generator {
            for mutation in self.mutations.iter_mut() {
                if mutation.requirements().needs_stumps {
                    mutation.attach_stump_generator(generator.clone());
                }
            }
        }

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(EvolutionEngine {
            population_size: self.population_size,
            generations: self.generations,
            elitism_rate: self.elitism_rate,
            evaluator: self.evaluator,
            comparator,
            initializer: self.initializer,
            selectors: self.selectors,
            env_selectors: self.env_selectors,
            crossovers: self.crossovers,
            mutations: self.mutations,
            dataset,
            rng,
            state: EngineState::Configured,
            population: None,
            best: None,
        })
    }
}

/// Runs the generational loop:
/// evaluate → elitism → selection → crossover and mutation → evaluate
/// offspring → environmental selection over offspring plus elites.
pub struct EvolutionEngine {
    population_size: usize,
    generations: usize,
    elitism_rate: f64,
    evaluator: FitnessEvaluator,
    comparator: Arc<dyn FitnessComparator>,
    initializer: Box<dyn PopulationInitializer>,
    selectors: Vec<Box<dyn Selector>>,
    env_selectors: Vec<Box<dyn Selector>>,
    crossovers: Vec<Box<dyn CrossoverOperator>>,
    mutations: Vec<Box<dyn MutationOperator>>,
    dataset: Arc<dyn Dataset>,
    rng: StdRng,
    state: EngineState,
    population: Option<Population>,
    best: Option<Individual>,
}

impl EvolutionEngine {
    pub fn builder() -> EvolutionBuilder {
        EvolutionBuilder::new()
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Final population, available once the run is done
    pub fn population(&self) -> Option<&Population> {
        self.population.as_ref()
    }

    pub fn best(&self) -> Option<&Individual> {
        self.best.as_ref()
    }

    /// Top-`k` ensemble over the final population
    pub fn ensemble(&self, k: usize) -> Result<Ensemble> {
        let population = self
            .population
            .as_ref()
            .ok_or_else(|| EvoTreeError::Generation("The engine has not run yet".to_string()))?;
        Ensemble::from_population(population, k)
    }

    /// Runs every generation. An engine runs at most once.
    pub fn run<C: ProgressCallback + ?Sized>(&mut self, callback: &mut C) -> Result<EvolutionOutcome> {
        if self.state != EngineState::Configured {
            return Err(EvoTreeError::Generation(format!(
                "Engine cannot run from state {:?}",
                self.state
            )));
        }
        let started_at = Utc::now();
        let dataset = self.dataset.clone();
        let comparator = self.comparator.clone();
        let functions = comparator.functions();

        log::info!(
            "Starting evolution: population {}, generations {}, comparator {}, functions {:?}",
            self.population_size,
            self.generations,
            comparator.name(),
            functions.names()
        );

        let mut population = self.initializer.initialize(
            dataset.as_ref(),
            comparator.clone(),
            self.population_size,
            &mut self.rng,
        )?;
        let mut history = Vec::with_capacity(self.generations);

        for generation in 0..self.generations {
            self.state = EngineState::Running { generation };
            callback.on_generation_start(generation);

            let mut evaluated =
                self.evaluator
                    .evaluate(functions, population.individuals_mut(), dataset.as_ref())?;
            callback.on_individuals_evaluated(evaluated, population.len());

            let elites = population.elite_phase(self.elitism_rate, None)?;
            let mates = population.selection_phase(&mut self.selectors, &mut self.rng, None)?;
            let mut offspring =
                mates.operator_phase(&mut self.crossovers, &mut self.mutations, dataset.as_ref(), None)?;

            let offspring_evaluated =
                self.evaluator
                    .evaluate(functions, offspring.individuals_mut(), dataset.as_ref())?;
            evaluated += offspring_evaluated;
            callback.on_individuals_evaluated(offspring_evaluated, offspring.len());

            let mut pool = offspring;
            pool.absorb(elites.clone());
            population = pool.env_selection_phase(&mut self.env_selectors, Some(elites))?;

            let stats = GenerationStats::collect(generation, evaluated, &population)?;
            callback.on_generation_complete(&stats);
            history.push(stats);

            if generation == self.generations - 1 {
                self.best = population.best()?.cloned();
            }
        }

        let best = self
            .best
            .clone()
            .ok_or_else(|| EvoTreeError::Generation("Run finished without a best individual".to_string()))?;
        self.population = Some(population);
        self.state = EngineState::Done;

        let outcome = EvolutionOutcome {
            best_tree: best.tree().to_string(),
            best_metrics: MetricsEngine::calculate_all(best.tree(), dataset.as_ref()),
            fitness_names: functions.names(),
            best,
            history,
            started_at,
            finished_at: Utc::now(),
        };
        log::info!(
            "Evolution finished in {} ms, best fitness {:?}",
            (outcome.finished_at - outcome.started_at).num_milliseconds(),
            outcome.best.fitness()
        );
        Ok(outcome)
    }
}
