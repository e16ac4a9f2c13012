mod csv;
mod types;
mod validator;

pub use csv::{ClassKindHint, CsvConnector};
pub use types::{ColumnStats, DatasetMetadata};
pub use validator::DataValidator;
