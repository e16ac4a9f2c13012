use crate::config::{AppConfig, ComparatorConfig, ComponentSpec};
use crate::data::Dataset;
use crate::engines::evaluation::{
    AccuracyFitness, ConfusionFitness, ConfusionMetric, FitnessComparator, FitnessEvaluator,
    FitnessFunction, FitnessFunctions, HeightFitness, MaeFitness, MseFitness, ParetoComparator,
    PriorityComparator, SingleComparator, SizeFitness, WeightedComparator,
};
use crate::engines::generation::{
    CrossoverOperator, DecisionStumpMutation, EvolutionEngine, MutationOperator,
    NodeToLeafMutation, Operator, RandomSelector, RandomStumpGenerator, RandomTreeInitializer,
    RouletteSelector, Selector, SubtreeCrossover, TournamentSelector, ValueChangeMutation,
};
use crate::error::{EvoTreeError, Result};
use crate::utils::random::{derive_seed, seeded_rng};
use std::collections::HashMap;
use std::sync::Arc;

type SelectorFactory = Box<dyn Fn(u64) -> Box<dyn Selector> + Send + Sync>;
type CrossoverFactory = Box<dyn Fn(u64) -> Box<dyn CrossoverOperator> + Send + Sync>;
type MutationFactory = Box<dyn Fn(u64) -> Box<dyn MutationOperator> + Send + Sync>;
type FitnessFactory = Box<dyn Fn() -> Box<dyn FitnessFunction> + Send + Sync>;

/// Maps configuration names to component constructors.
///
/// Stochastic components receive a seed derived from the run seed, so a
/// configured run is reproducible end to end.
pub struct ComponentRegistry {
    selectors: HashMap<String, SelectorFactory>,
    crossovers: HashMap<String, CrossoverFactory>,
    mutations: HashMap<String, MutationFactory>,
    fitness: HashMap<String, FitnessFactory>,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            selectors: HashMap::new(),
            crossovers: HashMap::new(),
            mutations: HashMap::new(),
            fitness: HashMap::new(),
        };
        registry.register_selectors();
        registry.register_operators();
        registry.register_fitness_functions();
        registry
    }

    fn register_selectors(&mut self) {
        self.register_selector("random", |seed| Box::new(RandomSelector::new(seed)));
        self.register_selector("tournament", |seed| Box::new(TournamentSelector::new(seed)));
        self.register_selector("roulette", |seed| Box::new(RouletteSelector::new(seed)));
    }

    fn register_operators(&mut self) {
        self.register_crossover("subtree", |seed| Box::new(SubtreeCrossover::new(seed)));

        self.register_mutation("value-change", |seed| Box::new(ValueChangeMutation::new(seed)));
        self.register_mutation("node-to-leaf-nominal", |seed| Box::new(NodeToLeafMutation::nominal(seed)));
        self.register_mutation("node-to-leaf-numeric", |seed| Box::new(NodeToLeafMutation::numeric(seed)));
        self.register_mutation("stump", |seed| Box::new(DecisionStumpMutation::new(seed)));
    }

    fn register_fitness_functions(&mut self) {
        self.register_fitness("accuracy", || Box::new(AccuracyFitness));
        self.register_fitness("size", || Box::new(SizeFitness));
        self.register_fitness("height", || Box::new(HeightFitness));
        self.register_fitness("mae", || Box::new(MaeFitness));
        self.register_fitness("mse", || Box::new(MseFitness));

        for metric in [
            ConfusionMetric::Precision,
            ConfusionMetric::Recall,
            ConfusionMetric::Specificity,
            ConfusionMetric::Prevalence,
            ConfusionMetric::TruePositives,
            ConfusionMetric::FalsePositives,
            ConfusionMetric::TrueNegatives,
            ConfusionMetric::FalseNegatives,
        ] {
            self.register_fitness(metric.name(), move || Box::new(ConfusionFitness::new(metric)));
        }
    }

    pub fn register_selector<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(u64) -> Box<dyn Selector> + Send + Sync + 'static,
    {
        self.selectors.insert(name.to_string(), Box::new(factory));
    }

    pub fn register_crossover<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(u64) -> Box<dyn CrossoverOperator> + Send + Sync + 'static,
    {
        self.crossovers.insert(name.to_string(), Box::new(factory));
    }

    pub fn register_mutation<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(u64) -> Box<dyn MutationOperator> + Send + Sync + 'static,
    {
        self.mutations.insert(name.to_string(), Box::new(factory));
    }

    pub fn register_fitness<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn FitnessFunction> + Send + Sync + 'static,
    {
        self.fitness.insert(name.to_string(), Box::new(factory));
    }

    pub fn selector_names(&self) -> Vec<String> {
        sorted_keys(&self.selectors)
    }

    pub fn crossover_names(&self) -> Vec<String> {
        sorted_keys(&self.crossovers)
    }

    pub fn mutation_names(&self) -> Vec<String> {
        sorted_keys(&self.mutations)
    }

    pub fn fitness_names(&self) -> Vec<String> {
        sorted_keys(&self.fitness)
    }

    pub fn create_selector(&self, spec: &ComponentSpec, seed: u64) -> Result<Box<dyn Selector>> {
        let factory = lookup(&self.selectors, "selector", &spec.name)?;
        let mut selector = factory(seed);
        selector.set_params(&spec.params)?;
        Ok(selector)
    }

    /// Builds a crossover; an explicit `probability` overrides any `PROB` in
    /// the parameter string
    pub fn create_crossover(&self, spec: &ComponentSpec, seed: u64) -> Result<Box<dyn CrossoverOperator>> {
        let factory = lookup(&self.crossovers, "crossover", &spec.name)?;
        let mut operator = factory(seed);
        operator.set_params(&spec.params)?;
        if let Some(probability) = spec.probability {
            operator.set_probability(probability)?;
        }
        Ok(operator)
    }

    pub fn create_mutation(&self, spec: &ComponentSpec, seed: u64) -> Result<Box<dyn MutationOperator>> {
        let factory = lookup(&self.mutations, "mutation", &spec.name)?;
        let mut operator = factory(seed);
        operator.set_params(&spec.params)?;
        if let Some(probability) = spec.probability {
            operator.set_probability(probability)?;
        }
        Ok(operator)
    }

    pub fn create_fitness(&self, spec: &ComponentSpec) -> Result<Box<dyn FitnessFunction>> {
        let factory = lookup(&self.fitness, "fitness function", &spec.name)?;
        let mut function = factory();
        function.set_params(&spec.params)?;
        Ok(function)
    }

    pub fn create_comparator(
        &self,
        specs: &[ComponentSpec],
        comparator: &ComparatorConfig,
    ) -> Result<Arc<dyn FitnessComparator>> {
        let mut functions = FitnessFunctions::new();
        for spec in specs {
            functions.register(self.create_fitness(spec)?);
        }
        let comparator: Arc<dyn FitnessComparator> = match comparator {
            ComparatorConfig::Single { slot } => Arc::new(SingleComparator::new(functions, *slot)?),
            ComparatorConfig::Weighted { weights } => {
                Arc::new(WeightedComparator::new(functions, weights.clone())?)
            }
            ComparatorConfig::Priority => Arc::new(PriorityComparator::new(functions)?),
            ComparatorConfig::Pareto => Arc::new(ParetoComparator::new(functions)?),
        };
        Ok(comparator)
    }

    /// Assembles a validated engine for `dataset` from a full configuration
    pub fn build_engine(&self, config: &AppConfig, dataset: Arc<dyn Dataset>) -> Result<EvolutionEngine> {
        config.validate()?;
        let mut seeds = seeded_rng(config.evolution.seed);

        let evolution = &config.evolution;
        let init = &config.operators.initializer;
        let initializer = RandomTreeInitializer::new()
            .with_max_height(init.max_height)
            .with_leaf_probability(init.leaf_probability)
            .with_threads(evolution.threads)
            .with_sampling(init.sampling);

        let mut builder = EvolutionEngine::builder()
            .population_size(evolution.population_size)
            .generations(evolution.generations)
            .elitism_rate(evolution.elitism_rate)
            .evaluator(FitnessEvaluator::new(evolution.threads, evolution.work_split))
            .comparator(self.create_comparator(&config.fitness.functions, &config.fitness.comparator)?)
            .initializer(Box::new(initializer))
            .stump_generator(Arc::new(RandomStumpGenerator));

        for spec in &config.operators.selectors {
            builder = builder.selector(self.create_selector(spec, derive_seed(&mut seeds))?);
        }
        for spec in &config.operators.env_selectors {
            builder = builder.env_selector(self.create_selector(spec, derive_seed(&mut seeds))?);
        }
        for spec in &config.operators.crossovers {
            builder = builder.crossover(self.create_crossover(spec, derive_seed(&mut seeds))?);
        }
        for spec in &config.operators.mutations {
            builder = builder.mutation(self.create_mutation(spec, derive_seed(&mut seeds))?);
        }

        builder.seed(Some(derive_seed(&mut seeds))).build(dataset)
    }
}

fn lookup<'a, T>(table: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    table
        .get(&name.to_lowercase())
        .ok_or_else(|| EvoTreeError::Configuration(format!("Unknown {} '{}'", kind, name)))
}

fn sorted_keys<T>(table: &HashMap<String, T>) -> Vec<String> {
    let mut names: Vec<String> = table.keys().cloned().collect();
    names.sort();
    names
}
