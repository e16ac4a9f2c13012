use super::traits::ConfigSection;
use crate::data::ClassKindHint;
use crate::error::{EvoTreeError, Result};
use serde::{Deserialize, Serialize};

/// How the training CSV is read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub delimiter: char,
    /// Defaults to the last column
    pub class_column: Option<String>,
    pub class_kind: ClassKindHint,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            class_column: None,
            class_kind: ClassKindHint::Nominal,
        }
    }
}

impl ConfigSection for DataConfig {
    fn section_name() -> &'static str {
        "data"
    }

    fn validate(&self) -> Result<()> {
        if self.delimiter == '"' || self.delimiter.is_alphanumeric() {
            return Err(EvoTreeError::Configuration(format!(
                "'{}' cannot be used as a delimiter",
                self.delimiter
            )));
        }
        Ok(())
    }
}
