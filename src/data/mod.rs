pub mod connectors;
pub mod dataset;

pub use connectors::{ClassKindHint, CsvConnector, DatasetMetadata};
pub use dataset::{majority_class, mean_class, AttributeInfo, Dataset, InMemoryDataset};
