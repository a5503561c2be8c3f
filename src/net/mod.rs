//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept, connection limits)
//!     → connection.rs (HTTP/1.1 serving, drain on shutdown)
//!     → Hand off to the axum router
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Each connection watches the shutdown signal and drains on its own

pub mod connection;
pub mod listener;

pub use connection::{
    serve_connection, ConnectionContext, ConnectionId, OpenConnections, MAX_HEADER_BYTES,
};
pub use listener::{listen_address, ConnectionPermit, Listener, ListenerError};
