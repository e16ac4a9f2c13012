use crate::error::{EvoTreeError, Result};

pub struct DataValidator;

impl DataValidator {
    /// Every row must have exactly as many cells as the header
    pub fn validate_row_widths(header: &[String], rows: &[Vec<String>]) -> Result<()> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != header.len() {
                return Err(EvoTreeError::DataShape(format!(
                    "Line {} has {} cells, header has {}",
                    i + 2,
                    row.len(),
                    header.len()
                )));
            }
        }
        Ok(())
    }

    /// Header names must be unique and non-empty
    pub fn validate_header(header: &[String]) -> Result<()> {
        if header.len() < 2 {
            return Err(EvoTreeError::DataShape(
                "At least one attribute column and one class column are required".to_string(),
            ));
        }
        for (i, name) in header.iter().enumerate() {
            if name.is_empty() {
                return Err(EvoTreeError::DataShape(format!("Column {} has an empty name", i)));
            }
            if header[..i].contains(name) {
                return Err(EvoTreeError::DataShape(format!("Duplicate column '{}'", name)));
            }
        }
        Ok(())
    }

    pub fn validate_minimum_rows(rows: &[Vec<String>], min_rows: usize) -> Result<()> {
        if rows.len() < min_rows {
            return Err(EvoTreeError::DataShape(format!(
                "Dataset has {} rows, at least {} required",
                rows.len(),
                min_rows
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_duplicate_header() {
        let header = strings(&["a", "b", "a"]);
        assert!(DataValidator::validate_header(&header).is_err());
    }

    #[test]
    fn test_row_width() {
        let header = strings(&["a", "b"]);
        let rows = vec![strings(&["1", "2"]), strings(&["1"])];
        assert!(DataValidator::validate_row_widths(&header, &rows).is_err());
    }
}
