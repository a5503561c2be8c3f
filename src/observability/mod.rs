//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request summaries:
//!     middleware → request_log.rs (args/metas collected by handlers)
//!                → logging.rs (RequestLogger view) → format.rs → sink.rs
//!
//! Lifecycle events:
//!     tracing macros → tracing.rs (event → LogRecord) → format.rs → sink.rs
//! ```
//!
//! # Design Decisions
//! - One fixed line layout for every record
//! - The logger is immutable once built and shared through `Arc`
//! - Request context lives in a task-local scope, never in shared state

pub mod format;
pub mod logging;
pub mod record;
pub mod request_log;
pub mod sink;
pub mod tracing;

pub use format::LineFormatter;
pub use logging::{get_logger, initialize, Logger, LoggerError, RequestLogger};
pub use record::{LogFields, LogRecord, LogValue, RequestFields, Severity};
pub use request_log::{add_arg, add_meta, RequestLog};
pub use sink::{LogBuffer, Sink};
