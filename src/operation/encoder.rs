//! Operation Encoder
//!
//! Validates an operation sequence before it leaves the client. All checks
//! run before any I/O so a rejected sequence never reaches the network.
//!
//! Checks, in sequence order:
//! - the sequence is not empty
//! - every bin name is valid for the configured maximum length
//! - every increment delta is numeric
//! - an increment never targets a bin that an earlier write in the same
//!   sequence declared with a non-numeric value, or with the other numeric kind
//!
//! The caller's order is preserved exactly; it is also the server's
//! execution order.

use std::collections::HashMap;

use super::{BinSelector, Operation};
use crate::error::{ClientError, Result};
use crate::record::{validate_bin_name, NumericKind};

/// A validated operation sequence ready to be sent
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedOperations {
    operations: Vec<Operation>,
    has_write: bool,
    has_read: bool,
}

impl EncodedOperations {
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }

    /// True when write-policy fields must accompany the request
    pub fn has_write(&self) -> bool {
        self.has_write
    }

    /// True when the response carries bins
    pub fn has_read(&self) -> bool {
        self.has_read
    }
}

/// Validates operation sequences against the client's bin name limit
#[derive(Debug, Clone, Copy)]
pub struct OperationEncoder {
    max_bin_name_len: usize,
}

/// What an earlier write in the sequence left in a bin
#[derive(Clone, Copy)]
enum Declared {
    Numeric(NumericKind),
    NonNumeric(&'static str),
}

impl OperationEncoder {
    pub fn new(max_bin_name_len: usize) -> Self {
        Self { max_bin_name_len }
    }

    /// Validate `operations` and take an owned copy in the same order
    pub fn encode(&self, operations: &[Operation]) -> Result<EncodedOperations> {
        if operations.is_empty() {
            return Err(ClientError::Validation("operation list is empty".to_string()));
        }

        let mut declared: HashMap<&str, Declared> = HashMap::new();
        let mut has_write = false;
        let mut has_read = false;

        for (idx, op) in operations.iter().enumerate() {
            match op {
                Operation::Read(BinSelector::All) => has_read = true,
                Operation::Read(BinSelector::Named(name)) => {
                    validate_bin_name(name, self.max_bin_name_len)?;
                    has_read = true;
                }
                Operation::Write(bin) => {
                    validate_bin_name(&bin.name, self.max_bin_name_len)?;
                    has_write = true;
                    if bin.value.is_null() {
                        declared.remove(bin.name.as_str());
                    } else {
                        let state = match bin.value.numeric_kind() {
                            Some(kind) => Declared::Numeric(kind),
                            None => Declared::NonNumeric(bin.value.type_name()),
                        };
                        declared.insert(bin.name.as_str(), state);
                    }
                }
                Operation::Increment { bin, delta } => {
                    validate_bin_name(bin, self.max_bin_name_len)?;
                    has_write = true;
                    let kind = delta.numeric_kind().ok_or_else(|| {
                        ClientError::Validation(format!(
                            "operation {}: increment of '{}' needs a numeric delta, got {}",
                            idx,
                            bin,
                            delta.type_name()
                        ))
                    })?;

                    match declared.get(bin.as_str()) {
                        Some(Declared::NonNumeric(type_name)) => {
                            return Err(ClientError::Validation(format!(
                                "operation {}: increment of '{}' which holds a {} value",
                                idx, bin, type_name
                            )));
                        }
                        Some(Declared::Numeric(existing)) if *existing != kind => {
                            return Err(ClientError::Validation(format!(
                                "operation {}: increment of '{}' mixes integer and float",
                                idx, bin
                            )));
                        }
                        _ => {}
                    }
                    declared.insert(bin.as_str(), Declared::Numeric(kind));
                }
                Operation::Delete(name) => {
                    validate_bin_name(name, self.max_bin_name_len)?;
                    has_write = true;
                    declared.remove(name.as_str());
                }
                Operation::Touch => has_write = true,
            }
        }

        Ok(EncodedOperations {
            operations: operations.to_vec(),
            has_write,
            has_read,
        })
    }
}
