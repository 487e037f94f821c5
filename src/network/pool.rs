//! Connection Pool
//!
//! Reuse endpoint connections across calls to avoid a handshake per request.
//!
//! ## Rules
//! 1. A connection is checked out for exactly one request.
//! 2. Healthy connections go back to the idle queue; connections that timed
//!    out or failed mid-request are discarded so a late response can never be
//!    read by the next caller.
//! 3. When `max_total` connections are in use, checkout waits until one is
//!    released or the request deadline passes.
//! 4. The mutex is held only while moving connections in and out of the idle
//!    queue, never across I/O.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::{Connector, Transport};
use crate::config::Host;
use crate::error::{ClientError, Result};

/// Pool limits for one endpoint
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    /// Maximum number of idle connections to keep
    pub max_idle: usize,
    /// Maximum total connections (idle + in-use)
    pub max_total: usize,
    /// Upper bound on a single connect attempt
    pub connect_timeout: Duration,
}

/// Point-in-time pool occupancy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStats {
    pub host: Host,
    pub idle: usize,
    pub in_use: usize,
}

struct PoolState {
    idle: VecDeque<Box<dyn Transport>>,
    total: usize,
    closed: bool,
}

struct PoolInner {
    host: Host,
    connector: Arc<dyn Connector>,
    config: PoolConfig,
    state: Mutex<PoolState>,
    available: Condvar,
}

/// Connection pool handle for one endpoint
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl ConnectionPool {
    /// Creates an empty pool; connections are opened on demand
    pub fn new(host: Host, connector: Arc<dyn Connector>, config: PoolConfig) -> Self {
        let state = PoolState {
            idle: VecDeque::with_capacity(config.max_idle),
            total: 0,
            closed: false,
        };
        Self {
            inner: Arc::new(PoolInner {
                host,
                connector,
                config,
                state: Mutex::new(state),
                available: Condvar::new(),
            }),
        }
    }

    pub fn host(&self) -> &Host {
        &self.inner.host
    }

    /// Checks out a connection, opening one if the pool has room
    pub fn acquire(&self, deadline: Instant) -> Result<PooledConnection> {
        {
            let mut state = self.inner.state.lock();
            loop {
                if state.closed {
                    return Err(ClientError::ConnectionClosed);
                }
                if let Some(conn) = state.idle.pop_front() {
                    return Ok(PooledConnection::new(self.clone(), conn));
                }
                if state.total < self.inner.config.max_total {
                    state.total += 1;
                    break;
                }
                if self
                    .inner
                    .available
                    .wait_until(&mut state, deadline)
                    .timed_out()
                {
                    return Err(ClientError::Timeout(format!(
                        "no free connection to {} before deadline",
                        self.inner.host
                    )));
                }
            }
        }

        // Slot reserved; connect outside the lock.
        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            self.release_slot();
            return Err(ClientError::Timeout(format!(
                "deadline exceeded before connecting to {}",
                self.inner.host
            )));
        }
        let timeout = left.min(self.inner.config.connect_timeout);

        match self.inner.connector.connect(&self.inner.host, timeout) {
            Ok(conn) => {
                tracing::debug!("Opened connection to {}", self.inner.host);
                Ok(PooledConnection::new(self.clone(), conn))
            }
            Err(err) => {
                self.release_slot();
                Err(err)
            }
        }
    }

    /// Drops idle connections and refuses further checkouts
    ///
    /// In-flight connections are discarded when their guards drop.
    pub fn close(&self) {
        let drained: Vec<Box<dyn Transport>> = {
            let mut state = self.inner.state.lock();
            state.closed = true;
            let drained: Vec<_> = state.idle.drain(..).collect();
            state.total = state.total.saturating_sub(drained.len());
            drained
        };
        self.inner.available.notify_all();
        drop(drained);
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.inner.state.lock();
        PoolStats {
            host: self.inner.host.clone(),
            idle: state.idle.len(),
            in_use: state.total.saturating_sub(state.idle.len()),
        }
    }

    fn release_slot(&self) {
        {
            let mut state = self.inner.state.lock();
            state.total = state.total.saturating_sub(1);
        }
        self.inner.available.notify_one();
    }

    fn return_connection(&self, conn: Box<dyn Transport>) {
        let rejected = {
            let mut state = self.inner.state.lock();
            if !state.closed && state.idle.len() < self.inner.config.max_idle {
                state.idle.push_back(conn);
                None
            } else {
                state.total = state.total.saturating_sub(1);
                Some(conn)
            }
        };
        self.inner.available.notify_one();
        drop(rejected);
    }
}

/// RAII wrapper returning a connection to the pool on drop
pub struct PooledConnection {
    pool: ConnectionPool,
    conn: Option<Box<dyn Transport>>,
    valid: bool,
}

impl PooledConnection {
    fn new(pool: ConnectionPool, conn: Box<dyn Transport>) -> Self {
        Self {
            pool,
            conn: Some(conn),
            valid: true,
        }
    }

    /// Sends one framed request and waits for the framed response
    pub fn send(&mut self, request: &[u8], deadline: Instant) -> Result<Vec<u8>> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| ClientError::Network("connection already released".to_string()))?;

        let response = conn.send(request, deadline);
        if let Err(err) = &response {
            if err.poisons_connection() {
                self.invalidate();
            }
        }
        response
    }

    /// Marks the connection as unusable; it is discarded on drop
    pub fn invalidate(&mut self) {
        if self.valid {
            tracing::warn!("Discarding connection to {}", self.pool.host());
        }
        self.valid = false;
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => return,
        };

        if self.valid {
            self.pool.return_connection(conn);
        } else {
            drop(conn);
            self.pool.release_slot();
        }
    }
}
