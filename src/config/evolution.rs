use super::traits::ConfigSection;
use crate::engines::evaluation::WorkSplit;
use crate::error::{EvoTreeError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub generations: usize,
    pub elitism_rate: f64,
    /// Worker threads for fitness evaluation and initialization
    pub threads: usize,
    pub work_split: WorkSplit,
    pub seed: Option<u64>,
    /// Members of the final top-K ensemble
    pub ensemble_size: usize,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 20,
            elitism_rate: 0.1,
            threads: 1,
            work_split: WorkSplit::PerIndividual,
            seed: None,
            ensemble_size: 5,
        }
    }
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<()> {
        if self.population_size < 2 {
            return Err(EvoTreeError::Configuration(
                "Population size must be at least 2".to_string(),
            ));
        }
        if self.generations < 1 {
            return Err(EvoTreeError::Configuration(
                "At least one generation is required".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.elitism_rate) {
            return Err(EvoTreeError::Configuration(
                "Elitism rate must be in [0, 1)".to_string(),
            ));
        }
        if self.threads == 0 {
            return Err(EvoTreeError::Configuration(
                "Thread count must be at least 1".to_string(),
            ));
        }
        if self.work_split == WorkSplit::Blocks(0) {
            return Err(EvoTreeError::Configuration(
                "Block size must be at least 1".to_string(),
            ));
        }
        if self.ensemble_size == 0 {
            return Err(EvoTreeError::Configuration(
                "Ensemble size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(EvolutionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_full_elitism() {
        let config = EvolutionConfig {
            elitism_rate: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
