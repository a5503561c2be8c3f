//! Request middleware.
//!
//! Outermost first: `logging` → recovery → timeout → router → `handler_name`
//! (per route) → handler.

pub mod handler_name;
pub mod logging;

pub use handler_name::record_handler;
pub use logging::request_logging;
