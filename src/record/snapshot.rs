//! Client-side record snapshots

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::Value;

/// Immutable snapshot of a stored record
///
/// Bins are ordered by name, not by write order.
///
/// For `operate` results the bin map only holds the bins touched by read
/// operations; for `get_header` it is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    bins: BTreeMap<String, Value>,
    generation: u32,
    /// Seconds until expiry, `None` when the record never expires
    ttl: Option<u32>,
}

impl Record {
    pub fn new(bins: BTreeMap<String, Value>, generation: u32, ttl: Option<u32>) -> Self {
        Self {
            bins,
            generation,
            ttl,
        }
    }

    pub fn bins(&self) -> &BTreeMap<String, Value> {
        &self.bins
    }

    pub fn into_bins(self) -> BTreeMap<String, Value> {
        self.bins
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bins.get(name)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Write counter, incremented by the server on every successful write
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn ttl(&self) -> Option<u32> {
        self.ttl
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(gen:{}),(exp:", self.generation)?;
        match self.ttl {
            Some(secs) => write!(f, "{}s", secs)?,
            None => write!(f, "never")?,
        }
        write!(f, "),(bins:")?;
        for (idx, (name, value)) in self.bins.iter().enumerate() {
            if idx > 0 {
                write!(f, ",")?;
            }
            write!(f, "({}:{})", name, value)?;
        }
        write!(f, ")")
    }
}
