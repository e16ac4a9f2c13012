use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvoTreeError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Incompatible component: {0}")]
    Incompatible(String),

    #[error("Data shape error: {0}")]
    DataShape(String),

    #[error("Invalid tree operation: {0}")]
    InvalidTree(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Computation error: {0}")]
    Computation(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, EvoTreeError>;
