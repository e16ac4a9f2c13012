pub mod ensemble;
pub mod evolution_engine;
pub mod individual;
pub mod initializer;
pub mod operators;
pub mod population;
pub mod progress;
pub mod selection;
pub mod stumps;

pub use ensemble::Ensemble;
pub use evolution_engine::{
    EngineState, EvolutionBuilder, EvolutionEngine, EvolutionOutcome, GenerationStats, ProgressCallback,
};
pub use individual::Individual;
pub use initializer::{PopulationInitializer, RandomTreeInitializer, Sampling};
pub use operators::{
    CrossoverOperator, DecisionStumpMutation, MutationOperator, NodeToLeafMutation, Operator,
    OperatorRequirements, SubtreeCrossover, ValueChangeMutation,
};
pub use population::Population;
pub use progress::{ChannelProgressCallback, LoggingProgressCallback, ProgressMessage};
pub use selection::{RandomSelector, RouletteSelector, Selector, TournamentSelector};
pub use stumps::{RandomStumpGenerator, StumpGenerator};
