//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use gory::config::ServerConfig;
use gory::observability::{LineFormatter, LogBuffer, Logger, Severity, Sink};

/// Logger writing into a buffer the test can inspect.
pub fn captured_logger() -> (Arc<Logger>, LogBuffer) {
    let buffer = LogBuffer::new();
    let logger = Logger::new(
        Severity::Debug,
        Sink::Buffer(buffer.clone()),
        LineFormatter::new("gory", std::process::id()),
    );
    (Arc::new(logger), buffer)
}

/// Config bound to an ephemeral local port with a short ping delay.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        address: "127.0.0.1:0".into(),
        graceful_timeout: 1,
        ping_delay_ms: 50,
        ..Default::default()
    }
}

/// Wait until `buffer` holds at least `count` lines.
#[allow(dead_code)]
pub async fn wait_for_lines(buffer: &LogBuffer, count: usize) -> Vec<String> {
    for _ in 0..100 {
        let lines = buffer.lines();
        if lines.len() >= count {
            return lines;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    buffer.lines()
}

/// Elapsed milliseconds from the trailing `<cost>ms` token.
#[allow(dead_code)]
pub fn cost_ms(line: &str) -> f64 {
    let token = line.rsplit(' ').next().unwrap();
    token
        .strip_suffix("ms")
        .unwrap_or_else(|| panic!("line has no cost token: {line}"))
        .parse()
        .unwrap()
}

#[allow(dead_code)]
pub fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{addr}{path}")
}
