//! Bins (named fields of a record)

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::Value;
use crate::error::{ClientError, Result};

/// Default maximum bin name length in bytes
pub const DEFAULT_MAX_BIN_NAME_LEN: usize = 15;

/// A named value within a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub name: String,
    pub value: Value,
}

impl Bin {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// A bin that removes `name` from the record when written
    pub fn null(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Value::Null,
        }
    }
}

impl fmt::Display for Bin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.value)
    }
}

/// Check a bin name against the configured maximum length
pub fn validate_bin_name(name: &str, max_len: usize) -> Result<()> {
    if name.is_empty() {
        return Err(ClientError::Validation("bin name must not be empty".to_string()));
    }
    if name.len() > max_len {
        return Err(ClientError::Validation(format!(
            "bin name '{}' too long: {} bytes (max {})",
            name,
            name.len(),
            max_len
        )));
    }
    Ok(())
}

/// Check a bin list for a single write: non-empty, valid names, no duplicates
pub fn validate_bins(bins: &[Bin], max_len: usize) -> Result<()> {
    if bins.is_empty() {
        return Err(ClientError::Validation("no bins to write".to_string()));
    }

    let mut seen = HashSet::with_capacity(bins.len());
    for bin in bins {
        validate_bin_name(&bin.name, max_len)?;
        if !seen.insert(bin.name.as_str()) {
            return Err(ClientError::Validation(format!(
                "duplicate bin name '{}'",
                bin.name
            )));
        }
    }
    Ok(())
}
