//! Configuration schema definitions.
//!
//! All fields have defaults so a partial (or empty) file is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (e.g., "0.0.0.0:8000").
    #[serde(alias = "addr")]
    pub address: String,

    /// Per-connection read/write timeout in seconds.
    pub timeout: u64,

    /// Shutdown grace period in seconds.
    pub graceful_timeout: u64,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,

    /// Artificial latency of the root `/ping` handler, in milliseconds.
    pub ping_delay_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:8000".to_string(),
            timeout: 20,
            graceful_timeout: 30,
            max_connections: 10_000,
            ping_delay_ms: 5_000,
        }
    }
}

impl ServerConfig {
    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.graceful_timeout)
    }

    pub fn ping_delay(&self) -> Duration {
        Duration::from_millis(self.ping_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ServerConfig::default();
        assert_eq!(config.address, "0.0.0.0:8000");
        assert_eq!(config.io_timeout(), Duration::from_secs(20));
        assert_eq!(config.grace_period(), Duration::from_secs(30));
    }

    #[test]
    fn yaml_accepts_addr_alias_and_fills_defaults() {
        let config: ServerConfig = serde_yaml::from_str("addr: 127.0.0.1:9000\ntimeout: 5\n").unwrap();
        assert_eq!(config.address, "127.0.0.1:9000");
        assert_eq!(config.timeout, 5);
        assert_eq!(config.graceful_timeout, 30);
    }

    #[test]
    fn toml_uses_same_schema() {
        let config: ServerConfig = toml::from_str("address = \"127.0.0.1:9001\"\ngraceful_timeout = 1\n").unwrap();
        assert_eq!(config.address, "127.0.0.1:9001");
        assert_eq!(config.grace_period(), Duration::from_secs(1));
        assert_eq!(config.timeout, 20);
    }
}
