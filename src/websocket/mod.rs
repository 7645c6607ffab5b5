//! WebSocket transport for the relay
//!
//! This module accepts sockets, tracks which of them are open,
//! and fans encoded frames out to them.

mod connection;
mod pool;
mod server;

pub use connection::{ConnectionHandle, ConnectionState};
pub use pool::ConnectionPool;
pub use server::WebSocketServer;
