//! Operation Module
//!
//! Compound operations applied atomically, in order, against one record.
//!
//! ## Example
//! ```text
//! [Increment(count, 4), Write(name = "x"), Read(All)]
//!        │                    │                │
//!        └──── applied by the server in this order ────┘
//!                                              └─► sees count+4 and name="x"
//! ```

mod encoder;

pub use encoder::{EncodedOperations, OperationEncoder};

use serde::{Deserialize, Serialize};

use crate::record::{Bin, Value};

/// Which bins a read operation returns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinSelector {
    /// Every bin in the record
    All,

    /// A single named bin
    Named(String),
}

/// One step of a compound operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Return bins as they stand at this point in the sequence
    Read(BinSelector),

    /// Set a bin (a null value removes it)
    Write(Bin),

    /// Add a numeric delta, creating the bin at zero when absent
    Increment { bin: String, delta: Value },

    /// Remove a bin
    Delete(String),

    /// Reset the record expiration from the write policy
    Touch,
}

impl Operation {
    /// Read all bins
    pub fn get() -> Self {
        Operation::Read(BinSelector::All)
    }

    /// Read one bin
    pub fn get_bin(name: impl Into<String>) -> Self {
        Operation::Read(BinSelector::Named(name.into()))
    }

    /// Write a bin
    pub fn put(bin: Bin) -> Self {
        Operation::Write(bin)
    }

    /// Increment a bin by the bin's value
    pub fn add(bin: Bin) -> Self {
        Operation::Increment {
            bin: bin.name,
            delta: bin.value,
        }
    }

    /// Remove a bin
    pub fn delete_bin(name: impl Into<String>) -> Self {
        Operation::Delete(name.into())
    }

    pub fn touch() -> Self {
        Operation::Touch
    }

    /// True for operations that modify the record
    pub fn is_write(&self) -> bool {
        !matches!(self, Operation::Read(_))
    }
}
