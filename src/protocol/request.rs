//! Request definitions
//!
//! Represents requests sent from the client to a store endpoint.

use serde::{Deserialize, Serialize};

use crate::operation::Operation;
use crate::policy::{CommitLevel, Consistency, Expiration, GenerationPolicy, Policy};
use crate::record::{Bin, Key};

/// Request type tag for logs and dispatch; not part of the wire format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Ping,
    Put,
    Add,
    Get,
    GetHeader,
    Exists,
    Delete,
    Operate,
    BatchGet,
}

/// Policy fields carried with every request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestHeader {
    /// Server-side processing budget (milliseconds)
    pub timeout_ms: u32,

    /// Expiration applied when the request writes
    pub expiration: Expiration,

    pub consistency: Consistency,

    pub commit_level: CommitLevel,

    pub generation: GenerationPolicy,
}

impl RequestHeader {
    /// Snapshot the wire-relevant fields of a policy
    pub fn from_policy(policy: &Policy) -> Self {
        let timeout_ms = u32::try_from(policy.timeout().as_millis()).unwrap_or(u32::MAX);
        Self {
            timeout_ms,
            expiration: policy.expiration(),
            consistency: policy.consistency(),
            commit_level: policy.commit_level(),
            generation: policy.generation(),
        }
    }
}

/// Request payload by type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RequestBody {
    /// Health check
    Ping,

    /// Upsert bins; null bins are removed
    Put { key: Key, bins: Vec<Bin> },

    /// Add numeric bins, creating them at zero
    Add { key: Key, bins: Vec<Bin> },

    /// Read all bins (`bins == None`) or the named ones
    Get { key: Key, bins: Option<Vec<String>> },

    /// Read generation and ttl only
    GetHeader { key: Key },

    /// Existence check
    Exists { key: Key },

    /// Remove the whole record
    Delete { key: Key },

    /// Apply operations atomically in order
    Operate { key: Key, operations: Vec<Operation> },

    /// Read many records; results align with `keys`
    BatchGet { keys: Vec<Key>, bins: Option<Vec<String>> },
}

impl RequestBody {
    pub fn kind(&self) -> RequestKind {
        match self {
            RequestBody::Ping => RequestKind::Ping,
            RequestBody::Put { .. } => RequestKind::Put,
            RequestBody::Add { .. } => RequestKind::Add,
            RequestBody::Get { .. } => RequestKind::Get,
            RequestBody::GetHeader { .. } => RequestKind::GetHeader,
            RequestBody::Exists { .. } => RequestKind::Exists,
            RequestBody::Delete { .. } => RequestKind::Delete,
            RequestBody::Operate { .. } => RequestKind::Operate,
            RequestBody::BatchGet { .. } => RequestKind::BatchGet,
        }
    }
}

/// A complete request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub header: RequestHeader,
    pub body: RequestBody,
}

impl Request {
    pub fn new(policy: &Policy, body: RequestBody) -> Self {
        Self {
            header: RequestHeader::from_policy(policy),
            body,
        }
    }

    pub fn kind(&self) -> RequestKind {
        self.body.kind()
    }
}
