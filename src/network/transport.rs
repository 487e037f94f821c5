//! Endpoint interface
//!
//! The client core talks to store endpoints only through these two traits.
//! A [`Transport`] carries one framed request at a time and returns the
//! framed response; a [`Connector`] opens new transports for the pool.

use std::time::{Duration, Instant};

use crate::config::Host;
use crate::error::Result;

/// One connection to a store endpoint
///
/// Implementations must fail with `ClientError::Timeout` once `deadline`
/// passes and with `ClientError::Network` on any other transport failure.
/// Either failure discards the connection.
pub trait Transport: Send {
    fn send(&mut self, request: &[u8], deadline: Instant) -> Result<Vec<u8>>;
}

/// Factory for endpoint connections
///
/// Shared by every pool in a session, so it must be usable concurrently.
/// Fails with `ClientError::Connection` when the endpoint is unreachable.
pub trait Connector: Send + Sync {
    fn connect(&self, host: &Host, timeout: Duration) -> Result<Box<dyn Transport>>;
}
