use crate::error::{EvoTreeError, Result};
use crate::types::AttributeKind;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Read-only view of a tabular dataset used by fitness functions, operators
/// and initializers.
///
/// Nominal values (attributes and class) are encoded as indices `0..values`.
/// Implementations must be safe to share between evaluation threads.
pub trait Dataset: Send + Sync {
    fn num_records(&self) -> usize;

    fn num_attributes(&self) -> usize;

    fn attribute_name(&self, attribute: usize) -> &str;

    fn attribute_kind(&self, attribute: usize) -> AttributeKind;

    fn value_at(&self, record: usize, attribute: usize) -> f64;

    fn class_kind(&self) -> AttributeKind;

    fn class_of(&self, record: usize) -> f64;

    /// Number of class values for a nominal class, 0 for a numeric one
    fn num_classes(&self) -> usize {
        match self.class_kind() {
            AttributeKind::Nominal { values } => values,
            AttributeKind::Numeric => 0,
        }
    }

    /// Splits the record indices into `parts` disjoint, shuffled groups.
    fn partition(&self, parts: usize, rng: &mut StdRng) -> Vec<Vec<usize>> {
        let parts = parts.max(1);
        let mut records: Vec<usize> = (0..self.num_records()).collect();
        records.shuffle(rng);

        let mut groups = vec![Vec::with_capacity(records.len() / parts + 1); parts];
        for (i, record) in records.into_iter().enumerate() {
            groups[i % parts].push(record);
        }
        groups
    }

    /// Bootstrap sample of `size` record indices drawn with replacement.
    fn resample(&self, size: usize, rng: &mut StdRng) -> Vec<usize> {
        let n = self.num_records();
        if n == 0 {
            return Vec::new();
        }
        (0..size).map(|_| rng.gen_range(0..n)).collect()
    }
}

/// Column description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeInfo {
    pub name: String,
    pub kind: AttributeKind,
    /// Labels of nominal values, indexed by encoded value. Empty for numeric columns.
    #[serde(default)]
    pub labels: Vec<String>,
}

impl AttributeInfo {
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Numeric,
            labels: Vec::new(),
        }
    }

    pub fn nominal(name: impl Into<String>, labels: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Nominal {
                values: labels.len(),
            },
            labels,
        }
    }

    /// Nominal column with generated labels `0..values`
    pub fn nominal_with_values(name: impl Into<String>, values: usize) -> Self {
        Self::nominal(name, (0..values).map(|v| v.to_string()).collect())
    }
}

/// Row-major dataset held in memory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InMemoryDataset {
    attributes: Vec<AttributeInfo>,
    class: AttributeInfo,
    rows: Vec<Vec<f64>>,
    classes: Vec<f64>,
}

impl InMemoryDataset {
    /// Builds a dataset and checks every row against the declared schema.
    pub fn new(
        attributes: Vec<AttributeInfo>,
        class: AttributeInfo,
        rows: Vec<Vec<f64>>,
        classes: Vec<f64>,
    ) -> Result<Self> {
        if rows.len() != classes.len() {
            return Err(EvoTreeError::DataShape(format!(
                "{} rows but {} class values",
                rows.len(),
                classes.len()
            )));
        }
        if let AttributeKind::Nominal { values } = class.kind {
            if values < 2 {
                return Err(EvoTreeError::DataShape(format!(
                    "Nominal class '{}' needs at least 2 values",
                    class.name
                )));
            }
        }

        for (r, row) in rows.iter().enumerate() {
            if row.len() != attributes.len() {
                return Err(EvoTreeError::DataShape(format!(
                    "Row {} has {} values, expected {}",
                    r,
                    row.len(),
                    attributes.len()
                )));
            }
            for (value, info) in row.iter().zip(&attributes) {
                check_value(*value, info, r)?;
            }
            check_value(classes[r], &class, r)?;
        }

        Ok(Self {
            attributes,
            class,
            rows,
            classes,
        })
    }

    pub fn attributes(&self) -> &[AttributeInfo] {
        &self.attributes
    }

    pub fn class_info(&self) -> &AttributeInfo {
        &self.class
    }

    /// Copy restricted to the given record indices (duplicates allowed).
    pub fn subset(&self, records: &[usize]) -> Self {
        Self {
            attributes: self.attributes.clone(),
            class: self.class.clone(),
            rows: records.iter().map(|&r| self.rows[r].clone()).collect(),
            classes: records.iter().map(|&r| self.classes[r]).collect(),
        }
    }
}

fn check_value(value: f64, info: &AttributeInfo, row: usize) -> Result<()> {
    if let AttributeKind::Nominal { values } = info.kind {
        // NaN marks a missing value and is allowed anywhere
        if value.is_nan() {
            return Ok(());
        }
        if value < 0.0 || value.fract() != 0.0 || value as usize >= values {
            return Err(EvoTreeError::DataShape(format!(
                "Row {}: value {} of nominal column '{}' is outside 0..{}",
                row, value, info.name, values
            )));
        }
    }
    Ok(())
}

impl Dataset for InMemoryDataset {
    fn num_records(&self) -> usize {
        self.rows.len()
    }

    fn num_attributes(&self) -> usize {
        self.attributes.len()
    }

    fn attribute_name(&self, attribute: usize) -> &str {
        &self.attributes[attribute].name
    }

    fn attribute_kind(&self, attribute: usize) -> AttributeKind {
        self.attributes[attribute].kind
    }

    fn value_at(&self, record: usize, attribute: usize) -> f64 {
        self.rows[record][attribute]
    }

    fn class_kind(&self) -> AttributeKind {
        self.class.kind
    }

    fn class_of(&self, record: usize) -> f64 {
        self.classes[record]
    }
}

/// Most frequent class among `records`, ties going to the lowest class index.
/// `None` for an empty record set or a numeric class.
pub fn majority_class(dataset: &dyn Dataset, records: &[usize]) -> Option<f64> {
    let classes = dataset.num_classes();
    if classes == 0 || records.is_empty() {
        return None;
    }

    let mut counts = vec![0usize; classes];
    for &record in records {
        let class = dataset.class_of(record);
        if class.is_nan() {
            continue;
        }
        let idx = (class as usize).min(classes - 1);
        counts[idx] += 1;
    }

    let (best, count) = counts
        .iter()
        .enumerate()
        .fold((0, 0), |acc, (i, &c)| if c > acc.1 { (i, c) } else { acc });
    if count == 0 {
        None
    } else {
        Some(best as f64)
    }
}

/// Mean class value among `records`, skipping missing values.
pub fn mean_class(dataset: &dyn Dataset, records: &[usize]) -> Option<f64> {
    let values: Vec<f64> = records
        .iter()
        .map(|&r| dataset.class_of(r))
        .filter(|v| !v.is_nan())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
