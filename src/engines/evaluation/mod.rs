pub mod classification;
pub mod comparators;
pub mod evaluator;
pub mod fitness;
pub mod pareto;
pub mod regression;
pub mod structure;

pub use classification::{AccuracyFitness, ConfusionFitness, ConfusionMetric, ConfusionTarget};
pub use comparators::{
    FitnessComparator, ParetoComparator, PriorityComparator, SingleComparator, WeightedComparator,
};
pub use evaluator::{FitnessEvaluator, WorkSplit};
pub use fitness::{FitnessFunction, FitnessFunctions};
pub use pareto::{OptimizationDirection, ParetoRanking};
pub use regression::{MaeFitness, MseFitness};
pub use structure::{HeightFitness, SizeFitness};
