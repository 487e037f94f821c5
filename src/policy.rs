//! Policy Model
//!
//! Per-call configuration: timeout, expiration and consistency hints.
//!
//! Policies are read-only snapshots. They are assembled with
//! [`PolicyBuilder`], which merges explicit fields over a base policy
//! (the documented defaults unless another base is supplied):
//!
//! | field        | default            |
//! |--------------|--------------------|
//! | timeout      | 1000 ms            |
//! | expiration   | `Never`            |
//! | consistency  | `Default`          |
//! | commit level | `All`              |
//! | generation   | `None` (no check)  |

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Default per-call timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Record time-to-live requested by a write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Expiration {
    /// Record never expires
    #[default]
    Never,

    /// Leave the record's current expiration untouched
    KeepExisting,

    /// Record expires this many seconds after the write
    Seconds(u32),
}

impl Expiration {
    /// Seconds-based constructor; zero means never
    pub fn from_secs(secs: u32) -> Self {
        if secs == 0 {
            Expiration::Never
        } else {
            Expiration::Seconds(secs)
        }
    }
}

/// Read consistency hint forwarded to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Consistency {
    /// Server namespace default
    #[default]
    Default,
    Session,
    Linearize,
    AllowReplica,
}

/// Write replication hint forwarded to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CommitLevel {
    /// Acknowledge after all replicas commit
    #[default]
    All,
    /// Acknowledge after the master commits
    Master,
}

/// Optimistic concurrency check applied to writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GenerationPolicy {
    #[default]
    None,
    /// Reject the write unless the record generation equals this value
    ExpectEqual(u32),
}

/// Per-call policy snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    timeout: Duration,
    expiration: Expiration,
    consistency: Consistency,
    commit_level: CommitLevel,
    generation: GenerationPolicy,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            expiration: Expiration::Never,
            consistency: Consistency::Default,
            commit_level: CommitLevel::All,
            generation: GenerationPolicy::None,
        }
    }
}

impl Policy {
    /// Create a builder whose unset fields fall back to the defaults
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::default()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn expiration(&self) -> Expiration {
        self.expiration
    }

    pub fn consistency(&self) -> Consistency {
        self.consistency
    }

    pub fn commit_level(&self) -> CommitLevel {
        self.commit_level
    }

    pub fn generation(&self) -> GenerationPolicy {
        self.generation
    }

    /// Reject policies that cannot produce a usable deadline
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(ClientError::Validation("policy timeout must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Absolute deadline for a call starting at `start`
    pub fn deadline_from(&self, start: Instant) -> Instant {
        start + self.timeout
    }
}

/// Builder merging explicit fields over a base policy
#[derive(Debug, Clone, Default)]
pub struct PolicyBuilder {
    timeout: Option<Duration>,
    expiration: Option<Expiration>,
    consistency: Option<Consistency>,
    commit_level: Option<CommitLevel>,
    generation: Option<GenerationPolicy>,
}

impl PolicyBuilder {
    /// Set the per-call timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the per-call timeout in milliseconds
    pub fn timeout_ms(self, ms: u64) -> Self {
        self.timeout(Duration::from_millis(ms))
    }

    /// Set the record expiration applied by writes
    pub fn expiration(mut self, expiration: Expiration) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// Set the read consistency hint
    pub fn consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = Some(consistency);
        self
    }

    /// Set the write commit level hint
    pub fn commit_level(mut self, commit_level: CommitLevel) -> Self {
        self.commit_level = Some(commit_level);
        self
    }

    /// Set the generation check applied by writes
    pub fn generation(mut self, generation: GenerationPolicy) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Merge the explicit fields over `base`
    pub fn build_from(self, base: &Policy) -> Policy {
        Policy {
            timeout: self.timeout.unwrap_or(base.timeout),
            expiration: self.expiration.unwrap_or(base.expiration),
            consistency: self.consistency.unwrap_or(base.consistency),
            commit_level: self.commit_level.unwrap_or(base.commit_level),
            generation: self.generation.unwrap_or(base.generation),
        }
    }

    /// Merge the explicit fields over the defaults
    pub fn build(self) -> Policy {
        self.build_from(&Policy::default())
    }
}
