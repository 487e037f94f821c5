//! # RecordKV
//!
//! A client core for key-value record stores with:
//! - Records made of named bins, addressed by `(namespace, set, user_key)`
//! - Per-call policies (timeout, expiration, consistency hints)
//! - Pooled endpoint connections with deadline-bound requests
//! - Order-preserving batch reads fanned out across endpoints
//! - Atomic multi-operation requests against a single record
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Session                               │
//! │        put / add / get / exists / delete / operate           │
//! └──────────────┬──────────────────────────────┬───────────────┘
//!                │                              │
//!                ▼                              ▼
//!   ┌────────────────────────┐     ┌────────────────────────┐
//!   │   Operation Encoder    │     │     Batch Executor     │
//!   │ (validate, keep order) │     │ (group, fan out, align)│
//!   └───────────┬────────────┘     └───────────┬────────────┘
//!               └──────────────┬───────────────┘
//!                              ▼
//!                    ┌───────────────────┐
//!                    │  Protocol codec   │
//!                    └─────────┬─────────┘
//!                              ▼
//!                    ┌───────────────────┐
//!                    │ Connection pools  │  one per endpoint
//!                    │   (Transport)     │
//!                    └───────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use recordkv::{Bin, ClientConfig, Host, Key, Session};
//!
//! let config = ClientConfig::builder()
//!     .seed(Host::new("127.0.0.1", 3000))
//!     .build();
//! let session = Session::connect(config)?;
//! let policy = session.default_policy().clone();
//!
//! let key = Key::new("test", "myset", "mykey")?;
//! session.put(&policy, &key, &[Bin::new("mybin", "v1")])?;
//! let record = session.get(&policy, &key, None)?;
//! # Ok::<(), recordkv::ClientError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod policy;
pub mod operation;
pub mod protocol;
pub mod network;
pub mod session;
mod batch;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{ClientConfig, Host};
pub use error::{ClientError, Result};
pub use operation::{BinSelector, Operation};
pub use policy::{CommitLevel, Consistency, Expiration, GenerationPolicy, Policy};
pub use record::{Bin, Key, Record, UserKey, Value};
pub use session::Session;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of RecordKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
