pub mod crossover;
pub mod mutation;

pub use crossover::{swap_subtrees, SubtreeCrossover};
pub use mutation::{DecisionStumpMutation, NodeToLeafMutation, ValueChangeMutation};

use super::population::Population;
use super::stumps::StumpGenerator;
use crate::data::Dataset;
use crate::error::{EvoTreeError, Result};
use crate::functions::ParamMap;
use crate::types::TargetSupport;
use std::sync::Arc;

/// What an operator needs from the run it is configured into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorRequirements {
    pub target: TargetSupport,
    pub needs_stumps: bool,
}

impl OperatorRequirements {
    pub const ANY: OperatorRequirements = OperatorRequirements {
        target: TargetSupport::Any,
        needs_stumps: false,
    };
}

/// Settings shared by every variation operator.
///
/// The probability is applied as a Bernoulli trial per individual (mutation)
/// or per parent pair (crossover), drawn from an operator-owned generator.
pub trait Operator: Send {
    fn name(&self) -> &str;

    fn probability(&self) -> f64;

    fn set_probability(&mut self, probability: f64) -> Result<()>;

    fn requirements(&self) -> OperatorRequirements {
        OperatorRequirements::ANY
    }

    /// Applies `KEY value;...` parameters after resetting to defaults.
    /// Every operator understands `PROB`.
    fn set_params(&mut self, params: &str) -> Result<()>;

    /// Current parameters in the same grammar `set_params` accepts
    fn params(&self) -> String;
}

pub trait CrossoverOperator: Operator {
    /// Recombines consecutive pairs of `parents`; an odd last individual
    /// passes through unchanged.
    fn crossover(&mut self, parents: Population) -> Result<Population>;
}

pub trait MutationOperator: Operator {
    fn mutate(&mut self, population: &mut Population, dataset: &dyn Dataset) -> Result<()>;

    /// Hands over the stump generator for operators that declare `needs_stumps`
    fn attach_stump_generator(&mut self, _generator: Arc<dyn StumpGenerator>) {}
}

pub(crate) fn check_probability(probability: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&probability) {
        return Err(EvoTreeError::Configuration(format!(
            "Probability {} outside [0, 1]",
            probability
        )));
    }
    Ok(probability)
}

/// Parses `params`, allowing `PROB` plus `extra` keys
pub(crate) fn parse_operator_params(params: &str, extra: &[&str]) -> Result<ParamMap> {
    let map = ParamMap::parse(params)?;
    let mut known = vec!["PROB"];
    known.extend_from_slice(extra);
    map.ensure_known(&known)?;
    Ok(map)
}
