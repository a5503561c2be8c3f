//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (net)
//!     → server.rs (router + middleware stack, lifecycle)
//!     → middleware/logging.rs (request log scope, one summary line)
//!     → routing (handlers)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod server;

pub use server::{HttpServer, RunningServer, ServeError, ServerState};
