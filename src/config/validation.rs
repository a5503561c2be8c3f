//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, address is host:port)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::net::listen_address;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("address `{0}` is not of the form host:port")]
    InvalidAddress(String),

    #[error("`{0}` must be greater than zero")]
    NotPositive(&'static str),
}

/// Check `config` and collect every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if listen_address(&config.address).is_none() {
        errors.push(ValidationError::InvalidAddress(config.address.clone()));
    }
    if config.timeout == 0 {
        errors.push(ValidationError::NotPositive("timeout"));
    }
    if config.graceful_timeout == 0 {
        errors.push(ValidationError::NotPositive("graceful_timeout"));
    }
    if config.max_connections == 0 {
        errors.push(ValidationError::NotPositive("max_connections"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
