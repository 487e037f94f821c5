//! Record keys
//!
//! A key addresses exactly one record: `(namespace, set, user_key)`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Maximum namespace length in bytes
pub const MAX_NAMESPACE_LEN: usize = 31;

/// Maximum set name length in bytes
pub const MAX_SET_LEN: usize = 63;

/// The caller-supplied part of a key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserKey {
    String(String),
    Int(i64),
    Bytes(Vec<u8>),
}

impl UserKey {
    /// Type tag mixed into the digest so `Int(1)` and `String("1")` differ
    fn type_tag(&self) -> u8 {
        match self {
            UserKey::Int(_) => 1,
            UserKey::String(_) => 3,
            UserKey::Bytes(_) => 4,
        }
    }

    fn feed(&self, hasher: &mut crc32fast::Hasher) {
        hasher.update(&[self.type_tag()]);
        match self {
            UserKey::String(s) => hasher.update(s.as_bytes()),
            UserKey::Int(v) => hasher.update(&v.to_be_bytes()),
            UserKey::Bytes(b) => hasher.update(b),
        }
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserKey::String(s) => write!(f, "{}", s),
            UserKey::Int(v) => write!(f, "{}", v),
            UserKey::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<&str> for UserKey {
    fn from(v: &str) -> Self {
        UserKey::String(v.to_string())
    }
}

impl From<String> for UserKey {
    fn from(v: String) -> Self {
        UserKey::String(v)
    }
}

impl From<i64> for UserKey {
    fn from(v: i64) -> Self {
        UserKey::Int(v)
    }
}

impl From<i32> for UserKey {
    fn from(v: i32) -> Self {
        UserKey::Int(v as i64)
    }
}

impl From<Vec<u8>> for UserKey {
    fn from(v: Vec<u8>) -> Self {
        UserKey::Bytes(v)
    }
}

/// Immutable record address
///
/// Identity is value equality of the three fields. The routing digest is
/// derived from `set` and `user_key` only, so the same user key in two
/// namespaces lands on the same node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    namespace: String,
    set: String,
    user_key: UserKey,
}

impl Key {
    /// Create a key, validating namespace and set names
    ///
    /// The namespace must be non-empty; the set may be empty.
    pub fn new(
        namespace: impl Into<String>,
        set: impl Into<String>,
        user_key: impl Into<UserKey>,
    ) -> Result<Self> {
        let namespace = namespace.into();
        let set = set.into();

        if namespace.is_empty() {
            return Err(ClientError::Validation("namespace must not be empty".to_string()));
        }
        if namespace.len() > MAX_NAMESPACE_LEN {
            return Err(ClientError::Validation(format!(
                "namespace too long: {} bytes (max {})",
                namespace.len(),
                MAX_NAMESPACE_LEN
            )));
        }
        if set.len() > MAX_SET_LEN {
            return Err(ClientError::Validation(format!(
                "set name too long: {} bytes (max {})",
                set.len(),
                MAX_SET_LEN
            )));
        }

        Ok(Self {
            namespace,
            set,
            user_key: user_key.into(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn set(&self) -> &str {
        &self.set
    }

    pub fn user_key(&self) -> &UserKey {
        &self.user_key
    }

    /// Routing digest: CRC32 over set, user key type tag and user key bytes
    pub fn digest(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(self.set.as_bytes());
        self.user_key.feed(&mut hasher);
        hasher.finalize()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.namespace, self.set, self.user_key)
    }
}
