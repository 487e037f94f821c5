//! Configuration for RecordKV
//!
//! Centralized client configuration with sensible defaults. Seeds are
//! supplied by the caller; nothing here reads files or the environment.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ClientError;
use crate::policy::Policy;
use crate::record::DEFAULT_MAX_BIN_NAME_LEN;

/// A store endpoint address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Host {
    pub name: String,
    pub port: u16,
}

impl Host {
    pub fn new(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            port,
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.port)
    }
}

impl FromStr for Host {
    type Err = ClientError;

    /// Parse `host:port`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, port) = s
            .rsplit_once(':')
            .ok_or_else(|| ClientError::Validation(format!("invalid host '{}': expected host:port", s)))?;
        if name.is_empty() {
            return Err(ClientError::Validation(format!("invalid host '{}': empty name", s)));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| ClientError::Validation(format!("invalid host '{}': bad port", s)))?;
        Ok(Host::new(name, port))
    }
}

/// Main configuration for a client session
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -------------------------------------------------------------------------
    // Endpoint Configuration
    // -------------------------------------------------------------------------
    /// Seed endpoints, probed in order on connect
    pub seeds: Vec<Host>,

    /// Timeout for establishing a single TCP connection
    pub connect_timeout: Duration,

    // -------------------------------------------------------------------------
    // Pool Configuration
    // -------------------------------------------------------------------------
    /// Maximum idle connections kept per endpoint
    pub max_idle_per_node: usize,

    /// Maximum total connections (idle + in-use) per endpoint
    pub max_conns_per_node: usize,

    // -------------------------------------------------------------------------
    // Request Configuration
    // -------------------------------------------------------------------------
    /// Policy used by callers that do not build their own
    pub default_policy: Policy,

    /// Maximum bin name length accepted before any I/O
    pub max_bin_name_len: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            seeds: Vec::new(),
            connect_timeout: Duration::from_millis(1000),
            max_idle_per_node: 8,
            max_conns_per_node: 16,
            default_policy: Policy::default(),
            max_bin_name_len: DEFAULT_MAX_BIN_NAME_LEN,
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ConfigBuilder {
    config: ClientConfig,
}

impl ConfigBuilder {
    /// Append a seed endpoint
    pub fn seed(mut self, host: Host) -> Self {
        self.config.seeds.push(host);
        self
    }

    /// Replace the seed list
    pub fn seeds(mut self, hosts: impl IntoIterator<Item = Host>) -> Self {
        self.config.seeds = hosts.into_iter().collect();
        self
    }

    /// Set the TCP connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the maximum idle connections per endpoint
    pub fn max_idle_per_node(mut self, count: usize) -> Self {
        self.config.max_idle_per_node = count;
        self
    }

    /// Set the maximum total connections per endpoint
    pub fn max_conns_per_node(mut self, count: usize) -> Self {
        self.config.max_conns_per_node = count;
        self
    }

    /// Set the session default policy
    pub fn default_policy(mut self, policy: Policy) -> Self {
        self.config.default_policy = policy;
        self
    }

    /// Set the maximum bin name length
    pub fn max_bin_name_len(mut self, len: usize) -> Self {
        self.config.max_bin_name_len = len;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
