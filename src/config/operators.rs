use super::traits::{ComponentSpec, ConfigSection};
use crate::engines::generation::Sampling;
use crate::error::{EvoTreeError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitializerConfig {
    pub max_height: usize,
    pub leaf_probability: f64,
    pub sampling: Sampling,
}

impl Default for InitializerConfig {
    fn default() -> Self {
        Self {
            max_height: 4,
            leaf_probability: 0.3,
            sampling: Sampling::Full,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorsConfig {
    /// Mating selectors; empty means the shuffled population is the mating pool
    pub selectors: Vec<ComponentSpec>,
    pub env_selectors: Vec<ComponentSpec>,
    pub crossovers: Vec<ComponentSpec>,
    pub mutations: Vec<ComponentSpec>,
    pub initializer: InitializerConfig,
}

impl Default for OperatorsConfig {
    fn default() -> Self {
        Self {
            selectors: vec![ComponentSpec::new("tournament")],
            env_selectors: vec![ComponentSpec::new("tournament")],
            crossovers: vec![ComponentSpec::new("subtree").with_probability(0.8)],
            mutations: vec![
                ComponentSpec::new("value-change").with_probability(0.1),
                ComponentSpec::new("node-to-leaf-nominal").with_probability(0.05),
                ComponentSpec::new("stump").with_probability(0.1),
            ],
            initializer: InitializerConfig::default(),
        }
    }
}

impl ConfigSection for OperatorsConfig {
    fn section_name() -> &'static str {
        "operators"
    }

    fn validate(&self) -> Result<()> {
        if self.env_selectors.is_empty() {
            return Err(EvoTreeError::Configuration(
                "At least one environmental selector is required".to_string(),
            ));
        }
        for spec in self.crossovers.iter().chain(&self.mutations) {
            if let Some(p) = spec.probability {
                if !(0.0..=1.0).contains(&p) {
                    return Err(EvoTreeError::Configuration(format!(
                        "Probability {} of '{}' outside [0, 1]",
                        p, spec.name
                    )));
                }
            }
        }
        if !(0.0..=1.0).contains(&self.initializer.leaf_probability) {
            return Err(EvoTreeError::Configuration(
                "Leaf probability must be between 0 and 1".to_string(),
            ));
        }
        if self.initializer.sampling == Sampling::Partition(0) {
            return Err(EvoTreeError::Configuration(
                "Partition sampling needs at least one part".to_string(),
            ));
        }
        Ok(())
    }
}
