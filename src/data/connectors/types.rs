use crate::types::AttributeKind;
use serde::{Deserialize, Serialize};

/// Metadata about a loaded CSV file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub file_path: String,
    pub num_rows: usize,
    pub num_columns: usize,
    pub class_column: String,
    pub columns: Vec<ColumnStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnStats {
    pub name: String,
    pub kind: AttributeKind,
    pub missing_count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

/// Cells treated as missing values
pub const MISSING_MARKERS: [&str; 4] = ["", "?", "NA", "null"];

pub fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell)
}
