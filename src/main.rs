use anyhow::{bail, Context};
use evotree::{ComponentRegistry, ConfigManager, CsvConnector, Dataset};
use evotree::engines::generation::LoggingProgressCallback;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        bail!("usage: {} <config.toml> <data.csv>", args[0]);
    }

    let manager = ConfigManager::new();
    manager
        .load_from_file(&args[1])
        .with_context(|| format!("failed to load configuration from {}", args[1]))?;
    let config = manager.get()?;

    let mut connector = CsvConnector::new()
        .with_delimiter(config.data.delimiter)
        .with_class_kind(config.data.class_kind);
    if let Some(column) = &config.data.class_column {
        connector = connector.with_class_column(column.clone());
    }
    let data = connector
        .load(&args[2])
        .with_context(|| format!("failed to load dataset from {}", args[2]))?;
    let metadata = CsvConnector::create_metadata(&args[2], &data);
    log::debug!("Dataset metadata: {}", serde_json::to_string(&metadata)?);
    let dataset: Arc<dyn Dataset> = Arc::new(data);

    let mut engine = ComponentRegistry::new().build_engine(&config, dataset.clone())?;
    let outcome = engine.run(&mut LoggingProgressCallback)?;

    let ensemble = engine.ensemble(config.evolution.ensemble_size)?;
    log::info!(
        "Top-{} ensemble training accuracy: {:.4}",
        ensemble.len(),
        ensemble.accuracy(dataset.as_ref())
    );

    println!("{}", outcome.to_json()?);
    Ok(())
}
