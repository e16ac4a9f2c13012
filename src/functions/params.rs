use crate::error::{EvoTreeError, Result};
use std::fmt;

/// Parsed `KEY value;KEY value` parameter string.
///
/// Keys are case-insensitive and stored uppercased, in input order. Every
/// entry must be exactly one key and one value separated by whitespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamMap {
    entries: Vec<(String, String)>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(params: &str) -> Result<Self> {
        let mut map = Self::new();
        for entry in params.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let tokens: Vec<&str> = entry.split_whitespace().collect();
            if tokens.len() != 2 {
                return Err(EvoTreeError::Configuration(format!(
                    "Malformed parameter '{}': expected 'KEY value'",
                    entry
                )));
            }
            map.insert(tokens[0], tokens[1]);
        }
        Ok(map)
    }

    /// Sets `key`, replacing an earlier value for the same key
    pub fn insert(&mut self, key: &str, value: impl ToString) {
        let key = key.to_uppercase();
        let value = value.to_string();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_uppercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rejects keys outside `known`
    pub fn ensure_known(&self, known: &[&str]) -> Result<()> {
        for (key, _) in &self.entries {
            if !known.iter().any(|k| k.eq_ignore_ascii_case(key)) {
                return Err(EvoTreeError::Configuration(format!(
                    "Unknown parameter '{}' (expected one of: {})",
                    key,
                    known.join(", ")
                )));
            }
        }
        Ok(())
    }

    pub fn get_f64(&self, key: &str) -> Result<Option<f64>> {
        self.get(key)
            .map(|v| {
                v.parse::<f64>().map_err(|_| {
                    EvoTreeError::Configuration(format!("Parameter {} expects a number, got '{}'", key, v))
                })
            })
            .transpose()
    }

    pub fn get_usize(&self, key: &str) -> Result<Option<usize>> {
        self.get(key)
            .map(|v| {
                v.parse::<usize>().map_err(|_| {
                    EvoTreeError::Configuration(format!(
                        "Parameter {} expects a non-negative integer, got '{}'",
                        key, v
                    ))
                })
            })
            .transpose()
    }

    /// `PROB` value checked to lie in `[0, 1]`
    pub fn probability(&self) -> Result<Option<f64>> {
        match self.get_f64("PROB")? {
            Some(p) if !(0.0..=1.0).contains(&p) => Err(EvoTreeError::Configuration(format!(
                "Probability {} outside [0, 1]",
                p
            ))),
            other => Ok(other),
        }
    }
}

impl fmt::Display for ParamMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ";")?;
            }
            write!(f, "{} {}", key, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let params = ParamMap::parse("average weighted; INDEX 2").unwrap();
        assert_eq!(params.get("AVERAGE"), Some("weighted"));
        assert_eq!(params.get_usize("index").unwrap(), Some(2));
        assert_eq!(params.to_string(), "AVERAGE weighted;INDEX 2");
    }

    #[test]
    fn test_odd_token_count_is_rejected() {
        assert!(ParamMap::parse("PROB").is_err());
        assert!(ParamMap::parse("PROB 0.5 0.6").is_err());
        assert!(ParamMap::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_key() {
        let params = ParamMap::parse("PROB 0.5;DEPTH 3").unwrap();
        assert!(params.ensure_known(&["PROB"]).is_err());
        assert!(params.ensure_known(&["PROB", "DEPTH"]).is_ok());
    }

    #[test]
    fn test_probability_range() {
        assert_eq!(ParamMap::parse("PROB 0.25").unwrap().probability().unwrap(), Some(0.25));
        assert!(ParamMap::parse("PROB 1.5").unwrap().probability().is_err());
        assert!(ParamMap::parse("PROB x").unwrap().probability().is_err());
    }
}
