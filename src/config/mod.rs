pub mod data;
pub mod evolution;
pub mod fitness;
pub mod manager;
pub mod operators;
pub mod traits;

pub use data::DataConfig;
pub use evolution::EvolutionConfig;
pub use fitness::{ComparatorConfig, FitnessConfig};
pub use manager::{AppConfig, ConfigManager, ENV_PREFIX};
pub use operators::{InitializerConfig, OperatorsConfig};
pub use traits::{ComponentSpec, ConfigSection};
