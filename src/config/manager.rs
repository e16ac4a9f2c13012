use super::{
    data::DataConfig, evolution::EvolutionConfig, fitness::FitnessConfig,
    operators::OperatorsConfig, traits::ConfigSection,
};
use crate::error::{EvoTreeError, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Prefix of environment overrides, e.g. `EVOTREE__EVOLUTION__GENERATIONS=50`
pub const ENV_PREFIX: &str = "EVOTREE";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub evolution: EvolutionConfig,
    pub fitness: FitnessConfig,
    pub operators: OperatorsConfig,
    pub data: DataConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        self.evolution.validate()?;
        self.fitness.validate()?;
        self.operators.validate()?;
        self.data.validate()?;
        Ok(())
    }

    /// Parses a TOML document without environment overrides
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    /// Loads a TOML file, layering `EVOTREE__SECTION__KEY` environment
    /// variables on top.
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config: AppConfig = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        log::info!("Loaded configuration from {}", path.display());

        *self.write()? = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_str = toml::to_string_pretty(&*self.read()?)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn get(&self) -> Result<AppConfig> {
        Ok(self.read()?.clone())
    }

    /// Applies `f` and keeps the result only if it validates
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.write()?;
        let mut updated = config.clone();
        f(&mut updated);
        updated.validate()?;
        *config = updated;
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, AppConfig>> {
        self.config
            .read()
            .map_err(|_| EvoTreeError::Configuration("Configuration lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, AppConfig>> {
        self.config
            .write()
            .map_err(|_| EvoTreeError::Configuration("Configuration lock poisoned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ComparatorConfig;

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [evolution]
            population_size = 30
            seed = 9

            [fitness]
            functions = [{ name = "accuracy" }, { name = "size" }]
            comparator = { kind = "pareto" }
            "#,
        )
        .unwrap();
        assert_eq!(config.evolution.population_size, 30);
        assert_eq!(config.evolution.seed, Some(9));
        assert_eq!(config.evolution.generations, EvolutionConfig::default().generations);
        assert_eq!(config.fitness.comparator, ComparatorConfig::Pareto);
        assert_eq!(config.operators, OperatorsConfig::default());
    }

    #[test]
    fn test_invalid_document_is_rejected() {
        let result = AppConfig::from_toml_str("[evolution]\npopulation_size = 1\n");
        assert!(matches!(result, Err(EvoTreeError::Configuration(_))));
    }

    #[test]
    fn test_update_rolls_back_invalid_changes() {
        let manager = ConfigManager::new();
        assert!(manager.update(|c| c.evolution.threads = 0).is_err());
        assert_eq!(manager.get().unwrap().evolution.threads, 1);

        manager.update(|c| c.evolution.threads = 4).unwrap();
        assert_eq!(manager.get().unwrap().evolution.threads, 4);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("evotree-config-{}.toml", std::process::id()));
        let manager = ConfigManager::new();
        manager
            .update(|c| {
                c.evolution.generations = 7;
                c.evolution.seed = Some(42);
            })
            .unwrap();
        manager.save_to_file(&path).unwrap();

        let loaded = ConfigManager::new();
        loaded.load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.get().unwrap(), manager.get().unwrap());
    }
}
