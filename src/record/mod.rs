//! Record Model
//!
//! Keys, bins, values and record snapshots.
//!
//! ## Shape
//! ```text
//! Key (namespace, set, user_key) ──► Record
//!                                     ├── bins: name → Value
//!                                     ├── generation
//!                                     └── ttl
//! ```
//!
//! Everything here is plain data plus validation; nothing performs I/O.

mod bin;
mod key;
mod snapshot;
mod value;

pub use bin::{validate_bin_name, validate_bins, Bin, DEFAULT_MAX_BIN_NAME_LEN};
pub use key::{Key, UserKey, MAX_NAMESPACE_LEN, MAX_SET_LEN};
pub use snapshot::Record;
pub use value::{NumericKind, Value};
