use super::{
    types::{is_missing, ColumnStats, DatasetMetadata},
    validator::DataValidator,
};
use crate::data::dataset::{AttributeInfo, Dataset, InMemoryDataset};
use crate::error::{EvoTreeError, Result};
use crate::types::AttributeKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the class column is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKindHint {
    /// Numeric if every cell parses as a number, nominal otherwise
    Auto,
    Nominal,
    Numeric,
}

/// Reads header-first delimited text into an [`InMemoryDataset`].
///
/// Columns whose cells all parse as numbers become numeric attributes, all
/// other columns become nominal attributes with a label dictionary. The class
/// column is the last one unless named explicitly.
pub struct CsvConnector {
    delimiter: char,
    class_column: Option<String>,
    class_kind: ClassKindHint,
    min_rows: usize,
}

impl Default for CsvConnector {
    fn default() -> Self {
        Self {
            delimiter: ',',
            class_column: None,
            class_kind: ClassKindHint::Nominal,
            min_rows: 1,
        }
    }
}

impl CsvConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_class_column(mut self, name: impl Into<String>) -> Self {
        self.class_column = Some(name.into());
        self
    }

    pub fn with_class_kind(mut self, hint: ClassKindHint) -> Self {
        self.class_kind = hint;
        self
    }

    pub fn with_min_rows(mut self, min_rows: usize) -> Self {
        self.min_rows = min_rows;
        self
    }

    /// Load CSV file into a dataset
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<InMemoryDataset> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let dataset = self.parse(&contents)?;
        log::info!(
            "Loaded {} records with {} attributes from {}",
            dataset.num_records(),
            dataset.num_attributes(),
            path.as_ref().display()
        );
        Ok(dataset)
    }

    /// Parse CSV text into a dataset
    pub fn parse(&self, contents: &str) -> Result<InMemoryDataset> {
        let mut reader = self.reader_builder()?.from_reader(contents.as_bytes());

        let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if header.iter().all(|h| h.is_empty()) {
            return Err(EvoTreeError::DataShape("CSV input is empty".to_string()));
        }
        let rows: Vec<Vec<String>> = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<std::result::Result<_, csv::Error>>()?;

        DataValidator::validate_header(&header)?;
        DataValidator::validate_row_widths(&header, &rows)?;
        DataValidator::validate_minimum_rows(&rows, self.min_rows)?;

        let class_idx = match &self.class_column {
            Some(name) => header.iter().position(|h| h == name).ok_or_else(|| {
                EvoTreeError::Configuration(format!("Class column '{}' not found", name))
            })?,
            None => header.len() - 1,
        };

        let mut attributes = Vec::with_capacity(header.len() - 1);
        let mut columns = Vec::with_capacity(header.len() - 1);
        let mut class = None;
        for (col, name) in header.iter().enumerate() {
            let cells: Vec<&str> = rows.iter().map(|row| row[col].as_str()).collect();
            if col == class_idx {
                if let Some(line) = cells.iter().position(|c| is_missing(c)) {
                    return Err(EvoTreeError::DataShape(format!(
                        "Line {}: missing class value",
                        line + 2
                    )));
                }
                let hint = self.class_kind;
                let numeric = match hint {
                    ClassKindHint::Numeric => true,
                    ClassKindHint::Nominal => false,
                    ClassKindHint::Auto => all_numeric(&cells),
                };
                class = Some(encode_column(name, &cells, numeric)?);
            } else {
                let numeric = all_numeric(&cells);
                let (info, values) = encode_column(name, &cells, numeric)?;
                attributes.push(info);
                columns.push(values);
            }
        }

        let (class_info, classes) = class.ok_or_else(|| {
            EvoTreeError::DataShape("Class column could not be encoded".to_string())
        })?;

        let missing: usize = columns
            .iter()
            .map(|values| values.iter().filter(|v| v.is_nan()).count())
            .sum();
        if missing > 0 {
            log::warn!("{} missing attribute values detected", missing);
        }

        let table: Vec<Vec<f64>> = (0..rows.len())
            .map(|r| columns.iter().map(|values| values[r]).collect())
            .collect();

        InMemoryDataset::new(attributes, class_info, table, classes)
    }

    /// Summary statistics for every attribute column
    pub fn create_metadata<P: AsRef<Path>>(path: P, dataset: &InMemoryDataset) -> DatasetMetadata {
        let columns = dataset
            .attributes()
            .iter()
            .enumerate()
            .map(|(a, info)| {
                let values: Vec<f64> = (0..dataset.num_records())
                    .map(|r| dataset.value_at(r, a))
                    .collect();
                let present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
                let numeric = info.kind == AttributeKind::Numeric && !present.is_empty();
                ColumnStats {
                    name: info.name.clone(),
                    kind: info.kind,
                    missing_count: values.len() - present.len(),
                    min: numeric.then(|| present.iter().copied().fold(f64::INFINITY, f64::min)),
                    max: numeric
                        .then(|| present.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
                    mean: numeric.then(|| present.iter().sum::<f64>() / present.len() as f64),
                }
            })
            .collect();

        DatasetMetadata {
            file_path: path.as_ref().to_string_lossy().to_string(),
            num_rows: dataset.num_records(),
            num_columns: dataset.num_attributes() + 1,
            class_column: dataset.class_info().name.clone(),
            columns,
        }
    }

    /// Quoted fields, `#` comment lines and ragged rows are accepted here;
    /// row widths are checked by the validator
    fn reader_builder(&self) -> Result<csv::ReaderBuilder> {
        if !self.delimiter.is_ascii() {
            return Err(EvoTreeError::Configuration(format!(
                "Delimiter '{}' must be a single ASCII character",
                self.delimiter
            )));
        }
        let mut builder = csv::ReaderBuilder::new();
        builder
            .delimiter(self.delimiter as u8)
            .has_headers(true)
            .flexible(true)
            .comment(Some(b'#'))
            .trim(csv::Trim::All);
        Ok(builder)
    }
}

fn all_numeric(cells: &[&str]) -> bool {
    let mut seen = false;
    for cell in cells {
        if is_missing(cell) {
            continue;
        }
        if cell.parse::<f64>().is_err() {
            return false;
        }
        seen = true;
    }
    seen
}

fn encode_column(name: &str, cells: &[&str], numeric: bool) -> Result<(AttributeInfo, Vec<f64>)> {
    if numeric {
        let values = cells
            .iter()
            .enumerate()
            .map(|(line, cell)| {
                if is_missing(cell) {
                    Ok(f64::NAN)
                } else {
                    cell.parse::<f64>().map_err(|_| {
                        EvoTreeError::DataShape(format!(
                            "Line {}: '{}' in column '{}' is not numeric",
                            line + 2,
                            cell,
                            name
                        ))
                    })
                }
            })
            .collect::<Result<Vec<f64>>>()?;
        return Ok((AttributeInfo::numeric(name), values));
    }

    let mut labels: Vec<String> = cells
        .iter()
        .filter(|c| !is_missing(c))
        .map(|c| c.to_string())
        .collect();
    labels.sort_by(|a, b| match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
        _ => a.cmp(b),
    });
    labels.dedup();

    let values = cells
        .iter()
        .map(|cell| {
            if is_missing(cell) {
                f64::NAN
            } else {
                labels
                    .iter()
                    .position(|l| l == cell)
                    .map(|p| p as f64)
                    .unwrap_or(f64::NAN)
            }
        })
        .collect();

    Ok((AttributeInfo::nominal(name, labels), values))
}
