use super::traits::{ComponentSpec, ConfigSection};
use crate::error::{EvoTreeError, Result};
use serde::{Deserialize, Serialize};

/// How fitness vectors are ordered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComparatorConfig {
    Single { slot: usize },
    Weighted { weights: Vec<f64> },
    Priority,
    Pareto,
}

impl Default for ComparatorConfig {
    fn default() -> Self {
        ComparatorConfig::Single { slot: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessConfig {
    /// Fitness functions in slot order
    pub functions: Vec<ComponentSpec>,
    pub comparator: ComparatorConfig,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            functions: vec![ComponentSpec::new("accuracy")],
            comparator: ComparatorConfig::default(),
        }
    }
}

impl ConfigSection for FitnessConfig {
    fn section_name() -> &'static str {
        "fitness"
    }

    fn validate(&self) -> Result<()> {
        if self.functions.is_empty() {
            return Err(EvoTreeError::Configuration(
                "At least one fitness function is required".to_string(),
            ));
        }
        match &self.comparator {
            ComparatorConfig::Single { slot } if *slot >= self.functions.len() => {
                Err(EvoTreeError::Configuration(format!(
                    "Comparator slot {} but only {} fitness functions",
                    slot,
                    self.functions.len()
                )))
            }
            ComparatorConfig::Weighted { weights } if weights.len() != self.functions.len() => {
                Err(EvoTreeError::Configuration(format!(
                    "{} weights for {} fitness functions",
                    weights.len(),
                    self.functions.len()
                )))
            }
            _ => Ok(()),
        }
    }
}
