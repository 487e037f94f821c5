//! Session Module
//!
//! The client entry point: owns one connection pool per reachable endpoint,
//! applies policies, routes single-record calls and maps result codes to
//! typed errors.
//!
//! ## Request Path
//! ```text
//! caller ──► validate (no I/O) ──► route by key digest ──► encode frame
//!                                                             │
//!   typed result ◄── map result code ◄── decode ◄── pooled send (deadline)
//! ```
//!
//! ## Concurrency
//! `Session` is `Send + Sync`; share it behind an `Arc`. Calls are
//! independent. Per-record atomicity of `add` and `operate` is provided by
//! the store; the client holds no record locks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::batch;
use crate::config::{ClientConfig, Host};
use crate::error::{ClientError, Result};
use crate::network::{ConnectionPool, Connector, PoolConfig, PoolStats, TcpConnector};
use crate::operation::{Operation, OperationEncoder};
use crate::policy::Policy;
use crate::protocol::{
    decode_response, encode_request, Request, RequestBody, Response, ResponseBody, ResultCode,
};
use crate::record::{validate_bin_name, validate_bins, Bin, Key, Record};

/// A reachable endpoint and its connection pool
pub(crate) struct Node {
    pool: ConnectionPool,
}

impl Node {
    pub(crate) fn host(&self) -> &Host {
        self.pool.host()
    }
}

/// Client session over one or more store endpoints
pub struct Session {
    /// Reachable endpoints in seed order
    nodes: Vec<Node>,

    /// Configuration the session was opened with
    config: ClientConfig,

    /// Validates compound operations before dispatch
    encoder: OperationEncoder,

    /// Set once by `close`
    closed: AtomicBool,
}

impl Session {
    /// Connect over TCP to the configured seeds
    pub fn connect(config: ClientConfig) -> Result<Self> {
        Self::connect_with(config, Arc::new(TcpConnector))
    }

    /// Connect to the configured seeds through `connector`
    ///
    /// Seeds are probed in order. Every seed that accepts a connection
    /// becomes a routable node; unreachable seeds are skipped. Fails only
    /// when no seed is reachable.
    pub fn connect_with(config: ClientConfig, connector: Arc<dyn Connector>) -> Result<Self> {
        if config.seeds.is_empty() {
            return Err(ClientError::Connection("no seed endpoints configured".to_string()));
        }
        if config.max_conns_per_node == 0 {
            return Err(ClientError::Validation(
                "max_conns_per_node must be at least 1".to_string(),
            ));
        }

        let pool_config = PoolConfig {
            max_idle: config.max_idle_per_node,
            max_total: config.max_conns_per_node,
            connect_timeout: config.connect_timeout,
        };

        let mut nodes = Vec::with_capacity(config.seeds.len());
        let mut failures = Vec::new();

        for host in &config.seeds {
            let pool = ConnectionPool::new(host.clone(), Arc::clone(&connector), pool_config);
            let deadline = Instant::now() + config.connect_timeout;

            // The probe connection goes back to the pool as the first idle one.
            match pool.acquire(deadline) {
                Ok(conn) => {
                    drop(conn);
                    tracing::debug!("Seed {} reachable", host);
                    nodes.push(Node { pool });
                }
                Err(e) => {
                    tracing::warn!("Seed {} unreachable: {}", host, e);
                    failures.push(format!("{}: {}", host, e));
                }
            }
        }

        if nodes.is_empty() {
            return Err(ClientError::Connection(format!(
                "no endpoint reachable ({})",
                failures.join("; ")
            )));
        }

        tracing::info!(
            "Session connected to {} of {} seed endpoints",
            nodes.len(),
            config.seeds.len()
        );

        let encoder = OperationEncoder::new(config.max_bin_name_len);
        Ok(Self {
            nodes,
            config,
            encoder,
            closed: AtomicBool::new(false),
        })
    }

    // =========================================================================
    // Single-record Operations
    // =========================================================================

    /// Upsert bins; bins not named are untouched, null bins are removed
    pub fn put(&self, policy: &Policy, key: &Key, bins: &[Bin]) -> Result<()> {
        self.check_open()?;
        policy.validate()?;
        validate_bins(bins, self.config.max_bin_name_len)?;

        let body = RequestBody::Put {
            key: key.clone(),
            bins: bins.to_vec(),
        };
        let response = self.send_to(self.route(key), policy, body)?;
        expect_done(response)
    }

    /// Add numeric bin values, creating absent bins at zero
    pub fn add(&self, policy: &Policy, key: &Key, bins: &[Bin]) -> Result<()> {
        self.check_open()?;
        policy.validate()?;
        validate_bins(bins, self.config.max_bin_name_len)?;
        if let Some(bin) = bins.iter().find(|b| b.value.numeric_kind().is_none()) {
            return Err(ClientError::Validation(format!(
                "add needs a numeric value for '{}', got {}",
                bin.name,
                bin.value.type_name()
            )));
        }

        let body = RequestBody::Add {
            key: key.clone(),
            bins: bins.to_vec(),
        };
        let response = self.send_to(self.route(key), policy, body)?;
        expect_done(response)
    }

    /// Read a record
    ///
    /// `bin_names == None` reads every bin. Returns `Ok(None)` when the
    /// record does not exist.
    pub fn get(&self, policy: &Policy, key: &Key, bin_names: Option<&[&str]>) -> Result<Option<Record>> {
        self.check_open()?;
        policy.validate()?;
        let bins = self.bin_selection(bin_names)?;

        let body = RequestBody::Get {
            key: key.clone(),
            bins,
        };
        let response = self.send_to(self.route(key), policy, body)?;
        expect_record(response)
    }

    /// Read generation and ttl without bins
    pub fn get_header(&self, policy: &Policy, key: &Key) -> Result<Option<Record>> {
        self.check_open()?;
        policy.validate()?;

        let body = RequestBody::GetHeader { key: key.clone() };
        let response = self.send_to(self.route(key), policy, body)?;
        expect_record(response)
    }

    /// Check whether a record exists
    pub fn exists(&self, policy: &Policy, key: &Key) -> Result<bool> {
        self.check_open()?;
        policy.validate()?;

        let body = RequestBody::Exists { key: key.clone() };
        let response = check_code(self.send_to(self.route(key), policy, body)?)?;
        match (response.code, response.body) {
            (ResultCode::KeyNotFound, _) => Ok(false),
            (_, ResponseBody::Exists(found)) => Ok(found),
            (_, body) => Err(unexpected("EXISTS", &body)),
        }
    }

    /// Remove a whole record; returns false when it did not exist
    pub fn delete(&self, policy: &Policy, key: &Key) -> Result<bool> {
        self.check_open()?;
        policy.validate()?;

        let body = RequestBody::Delete { key: key.clone() };
        let response = check_code(self.send_to(self.route(key), policy, body)?)?;
        match (response.code, response.body) {
            (ResultCode::KeyNotFound, _) => Ok(false),
            (_, ResponseBody::Deleted(existed)) => Ok(existed),
            (_, body) => Err(unexpected("DELETE", &body)),
        }
    }

    /// Apply `operations` atomically, in order, to one record
    ///
    /// The returned record holds only the bins touched by read operations.
    /// A read-only sequence against a missing record fails with
    /// `ResultCode::KeyNotFound`.
    pub fn operate(&self, policy: &Policy, key: &Key, operations: &[Operation]) -> Result<Record> {
        self.check_open()?;
        policy.validate()?;
        let encoded = self.encoder.encode(operations)?;

        tracing::trace!(
            "OPERATE {} ({} ops, write={}, read={})",
            key,
            encoded.operations().len(),
            encoded.has_write(),
            encoded.has_read()
        );

        let body = RequestBody::Operate {
            key: key.clone(),
            operations: encoded.into_operations(),
        };
        let response = check_code(self.send_to(self.route(key), policy, body)?)?;
        match (response.code, response.body) {
            (ResultCode::KeyNotFound, _) => Err(ClientError::Server {
                code: ResultCode::KeyNotFound,
                message: format!("record {} not found", key),
            }),
            (_, ResponseBody::Record(record)) => Ok(record),
            (_, body) => Err(unexpected("OPERATE", &body)),
        }
    }

    // =========================================================================
    // Multi-record Operations
    // =========================================================================

    /// Read many records; slot `i` holds the result for `keys[i]`
    ///
    /// All-or-nothing: any failed sub-request fails the whole call.
    pub fn batch_get(
        &self,
        policy: &Policy,
        keys: &[Key],
        bin_names: Option<&[&str]>,
    ) -> Result<Vec<Option<Record>>> {
        self.check_open()?;
        policy.validate()?;
        let bins = self.bin_selection(bin_names)?;
        batch::batch_get(self, policy, keys, bins)
    }

    /// Health-check every node
    pub fn ping(&self) -> Result<()> {
        self.check_open()?;
        let policy = &self.config.default_policy;
        for idx in 0..self.nodes.len() {
            let response = check_code(self.send_to(idx, policy, RequestBody::Ping)?)?;
            if response.body != ResponseBody::Pong {
                return Err(unexpected("PING", &response.body));
            }
        }
        Ok(())
    }

    // =========================================================================
    // Lifecycle & Introspection
    // =========================================================================

    /// Release all connections; later calls fail with `ConnectionClosed`
    ///
    /// Safe to call more than once.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        for node in &self.nodes {
            node.pool.close();
        }
        tracing::info!("Session closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// The session's default policy from configuration
    pub fn default_policy(&self) -> &Policy {
        &self.config.default_policy
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Routable endpoints in seed order
    pub fn nodes(&self) -> Vec<Host> {
        self.nodes.iter().map(|n| n.host().clone()).collect()
    }

    /// Pool occupancy per endpoint
    pub fn pool_stats(&self) -> Vec<PoolStats> {
        self.nodes.iter().map(|n| n.pool.stats()).collect()
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn check_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(ClientError::ConnectionClosed);
        }
        Ok(())
    }

    fn bin_selection(&self, bin_names: Option<&[&str]>) -> Result<Option<Vec<String>>> {
        match bin_names {
            None => Ok(None),
            Some([]) => Err(ClientError::Validation(
                "bin name list is empty; pass None to read all bins".to_string(),
            )),
            Some(names) => {
                for name in names {
                    validate_bin_name(name, self.config.max_bin_name_len)?;
                }
                Ok(Some(names.iter().map(|n| n.to_string()).collect()))
            }
        }
    }

    /// Number of routable nodes
    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Node index owning `key`
    pub(crate) fn route(&self, key: &Key) -> usize {
        key.digest() as usize % self.nodes.len()
    }

    /// Send one request to node `idx` under the policy deadline
    pub(crate) fn send_to(&self, idx: usize, policy: &Policy, body: RequestBody) -> Result<Response> {
        let node = &self.nodes[idx];
        let deadline = policy.deadline_from(Instant::now());
        let request = Request::new(policy, body);
        let kind = request.kind();
        let frame = encode_request(&request)?;

        let mut conn = node.pool.acquire(deadline)?;
        let reply = conn.send(&frame, deadline)?;
        let response = match decode_response(&reply) {
            Ok(response) => response,
            Err(e) => {
                conn.invalidate();
                return Err(e);
            }
        };

        tracing::trace!("{:?} -> {} returned {:?}", kind, node.host(), response.code);
        Ok(response)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

// =============================================================================
// Response Mapping
// =============================================================================

/// Turn error result codes into typed errors; OK and KEY_NOT_FOUND pass
pub(crate) fn check_code(response: Response) -> Result<Response> {
    match response.code {
        ResultCode::Ok | ResultCode::KeyNotFound => Ok(response),
        ResultCode::BinTypeMismatch => Err(ClientError::TypeMismatch(response.message().to_string())),
        ResultCode::Timeout => Err(ClientError::Timeout(format!(
            "server timeout: {}",
            response.message()
        ))),
        code => Err(ClientError::Server {
            code,
            message: response.message().to_string(),
        }),
    }
}

pub(crate) fn unexpected(kind: &str, body: &ResponseBody) -> ClientError {
    ClientError::Protocol(format!("unexpected {} response body: {:?}", kind, body))
}

fn expect_done(response: Response) -> Result<()> {
    let response = check_code(response)?;
    match (response.code, &response.body) {
        (ResultCode::Ok, ResponseBody::Empty) => Ok(()),
        (ResultCode::KeyNotFound, _) => Err(ClientError::Server {
            code: ResultCode::KeyNotFound,
            message: "write reported missing record".to_string(),
        }),
        (_, body) => Err(unexpected("write", body)),
    }
}

fn expect_record(response: Response) -> Result<Option<Record>> {
    let response = check_code(response)?;
    match (response.code, response.body) {
        (ResultCode::KeyNotFound, _) => Ok(None),
        (_, ResponseBody::Record(record)) => Ok(Some(record)),
        (_, body) => Err(unexpected("read", &body)),
    }
}
