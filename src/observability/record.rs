//! Log record model.
//!
//! A [`LogRecord`] is built once per emitted line and thrown away after the
//! formatter has rendered it. Every optional field stays `None` unless a
//! caller sets it explicitly.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Local};

/// Severity of a log record, ordered from least to most important.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    /// Lowercase name used in the rendered line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }

    /// Equivalent `tracing` level filter. `Fatal` has no tracing level and
    /// maps to `ERROR`.
    pub fn level_filter(&self) -> tracing::level_filters::LevelFilter {
        use tracing::level_filters::LevelFilter;
        match self {
            Severity::Debug => LevelFilter::DEBUG,
            Severity::Info => LevelFilter::INFO,
            Severity::Warn => LevelFilter::WARN,
            Severity::Error | Severity::Fatal => LevelFilter::ERROR,
        }
    }
}

impl From<tracing::Level> for Severity {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Severity::Debug,
            tracing::Level::INFO => Severity::Info,
            tracing::Level::WARN => Severity::Warn,
            tracing::Level::ERROR => Severity::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value that can be attached to a log line as an arg or a meta.
#[derive(Debug, Clone, PartialEq)]
pub enum LogValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl LogValue {
    /// Quoted rendering: strings are quoted and escaped, everything else is
    /// rendered bare.
    pub fn quoted(&self) -> String {
        match self {
            LogValue::Str(s) => format!("{s:?}"),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for LogValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogValue::Str(s) => f.write_str(s),
            LogValue::Int(i) => write!(f, "{i}"),
            LogValue::Float(x) => write!(f, "{x}"),
            LogValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for LogValue {
    fn from(value: &str) -> Self {
        LogValue::Str(value.to_string())
    }
}

impl From<String> for LogValue {
    fn from(value: String) -> Self {
        LogValue::Str(value)
    }
}

impl From<i32> for LogValue {
    fn from(value: i32) -> Self {
        LogValue::Int(i64::from(value))
    }
}

impl From<i64> for LogValue {
    fn from(value: i64) -> Self {
        LogValue::Int(value)
    }
}

impl From<u16> for LogValue {
    fn from(value: u16) -> Self {
        LogValue::Int(i64::from(value))
    }
}

impl From<u32> for LogValue {
    fn from(value: u32) -> Self {
        LogValue::Int(i64::from(value))
    }
}

impl From<u64> for LogValue {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(v) => LogValue::Int(v),
            Err(_) => LogValue::Str(value.to_string()),
        }
    }
}

impl From<f64> for LogValue {
    fn from(value: f64) -> Self {
        LogValue::Float(value)
    }
}

impl From<bool> for LogValue {
    fn from(value: bool) -> Self {
        LogValue::Bool(value)
    }
}

/// Key/value mapping used for both args and metas. Keys iterate in sorted
/// order so rendered lines are stable.
pub type LogFields = BTreeMap<String, LogValue>;

/// Request-level fields bound to a per-request logger view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestFields {
    pub client_ip: Option<String>,
    pub status: Option<u16>,
    pub method: Option<String>,
    pub uri: Option<String>,
    pub request_id: Option<String>,
}

impl RequestFields {
    /// True when none of the request fields is set.
    pub fn is_empty(&self) -> bool {
        self.client_ip.is_none()
            && self.status.is_none()
            && self.method.is_none()
            && self.uri.is_none()
            && self.request_id.is_none()
    }
}

/// One log line before formatting.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub time: DateTime<Local>,
    pub severity: Severity,
    pub request: RequestFields,
    pub metas: Option<LogFields>,
    pub elapsed_ms: Option<f64>,
    pub message: String,
}

impl LogRecord {
    /// Create a bare record stamped with the current time.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            time: Local::now(),
            severity,
            request: RequestFields::default(),
            metas: None,
            elapsed_ms: None,
            message: message.into(),
        }
    }
}
