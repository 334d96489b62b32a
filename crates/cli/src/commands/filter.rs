//! Glob selection of keys and file names

use cx_core::path::base_name;
use cx_core::{Error, Result};
use glob::Pattern;

/// Optional `--include` pattern
///
/// A pattern matches either the full key or its last segment, so `*.csv`
/// selects `reports/q1.csv`.
#[derive(Debug, Clone, Default)]
pub struct KeyFilter {
    pattern: Option<Pattern>,
}

impl KeyFilter {
    pub fn new(pattern: Option<&str>) -> Result<Self> {
        let pattern = pattern
            .map(|p| {
                Pattern::new(p).map_err(|e| Error::InvalidPath(format!("bad pattern '{p}': {e}")))
            })
            .transpose()?;
        Ok(Self { pattern })
    }

    pub fn is_set(&self) -> bool {
        self.pattern.is_some()
    }

    pub fn matches(&self, key: &str) -> bool {
        match &self.pattern {
            Some(pattern) => pattern.matches(key) || pattern.matches(base_name(key)),
            None => true,
        }
    }
}
