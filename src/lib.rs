//! gory: a small HTTP service with per-request structured logging and
//! graceful shutdown.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::{RunMode, ServerConfig};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::{add_arg, add_meta, Logger};
