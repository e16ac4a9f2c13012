pub mod config;
pub mod data;
pub mod engines;
pub mod error;
pub mod functions;
pub mod types;
pub mod utils;

pub use config::{AppConfig, ConfigManager};
pub use data::{CsvConnector, Dataset, InMemoryDataset};
pub use engines::generation::{EvolutionEngine, EvolutionOutcome, Individual, Population};
pub use engines::tree::Tree;
pub use error::{EvoTreeError, Result};
pub use functions::ComponentRegistry;
