use evotree::config::{AppConfig, ComparatorConfig, ConfigManager};
use evotree::engines::evaluation::WorkSplit;
use evotree::engines::generation::Sampling;
use evotree::{ComponentRegistry, CsvConnector, Dataset};
use std::sync::Arc;

const BUNDLED: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml");

#[test]
fn bundled_config_loads_and_builds() {
    let manager = ConfigManager::new();
    manager.load_from_file(BUNDLED).unwrap();
    let config = manager.get().unwrap();

    assert_eq!(config.evolution.seed, Some(42));
    assert_eq!(config.evolution.work_split, WorkSplit::PerIndividual);
    assert_eq!(config.fitness.comparator, ComparatorConfig::Weighted { weights: vec![1.0, 0.05] });
    assert_eq!(config.operators.initializer.sampling, Sampling::Full);

    let csv = "x,colour,label\n1,0,0\n2,1,0\n3,2,0\n4,0,1\n5,1,1\n6,2,1\n";
    let dataset: Arc<dyn Dataset> = Arc::new(CsvConnector::new().parse(csv).unwrap());
    let engine = ComponentRegistry::new().build_engine(&config, dataset);
    assert!(engine.is_ok());
}

#[test]
fn environment_overrides_file_values() {
    std::env::set_var("EVOTREE__EVOLUTION__GENERATIONS", "9");
    let manager = ConfigManager::new();
    let loaded = manager.load_from_file(BUNDLED);
    std::env::remove_var("EVOTREE__EVOLUTION__GENERATIONS");

    loaded.unwrap();
    assert_eq!(manager.get().unwrap().evolution.generations, 9);
}

#[test]
fn tagged_enums_in_toml() {
    let config = AppConfig::from_toml_str(
        r#"
        [evolution]
        work_split = { blocks = 8 }

        [operators.initializer]
        sampling = { partition = 3 }
        "#,
    )
    .unwrap();
    assert_eq!(config.evolution.work_split, WorkSplit::Blocks(8));
    assert_eq!(config.operators.initializer.sampling, Sampling::Partition(3));
}

#[test]
fn unknown_component_names_fail_at_build() {
    let mut config = AppConfig::default();
    config.operators.mutations.push(evotree::config::ComponentSpec::new("shuffle"));
    let csv = "x,label\n1,0\n2,1\n";
    let dataset: Arc<dyn Dataset> = Arc::new(CsvConnector::new().parse(csv).unwrap());
    let result = ComponentRegistry::new().build_engine(&config, dataset);
    assert!(matches!(result, Err(evotree::EvoTreeError::Configuration(_))));
}
