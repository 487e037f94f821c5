//! Network Module
//!
//! Endpoint connections and pooling.
//!
//! ## Architecture
//! - `Connector` opens connections, `Transport` carries framed requests
//! - One bounded `ConnectionPool` per endpoint
//! - `TcpConnector` is the default connector

mod connection;
mod pool;
mod transport;

pub use connection::{TcpConnector, TcpTransport};
pub use pool::{ConnectionPool, PoolConfig, PoolStats, PooledConnection};
pub use transport::{Connector, Transport};
