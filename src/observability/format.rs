//! Line formatter.
//!
//! Renders a [`LogRecord`] as a single line:
//!
//! ```text
//! <time> <severity> <process>[<pid>]: [<ip> - <status> <method> <uri> <id>] <k> => <v> ... <message> <cost>ms
//! ```
//!
//! Every optional part is skipped when unset. Formatting never fails.

use std::ffi::OsString;
use std::path::Path;

use chrono::SecondsFormat;

use crate::observability::record::{LogRecord, RequestFields};

/// Renders log records for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFormatter {
    process_name: String,
    pid: u32,
}

impl LineFormatter {
    pub fn new(process_name: impl Into<String>, pid: u32) -> Self {
        Self {
            process_name: process_name.into(),
            pid,
        }
    }

    /// Formatter for the running binary: base name of `argv[0]` and the
    /// current pid.
    pub fn for_current_process() -> Self {
        Self::new(
            process_name(std::env::args_os().next()),
            std::process::id(),
        )
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Render `record` as one newline-terminated line.
    pub fn format(&self, record: &LogRecord) -> String {
        let mut tokens: Vec<String> = Vec::with_capacity(8);

        tokens.push(format!(
            "{} {} {}[{}]:",
            record.time.to_rfc3339_opts(SecondsFormat::Secs, true),
            record.severity,
            self.process_name,
            self.pid,
        ));

        if let Some(group) = request_group(&record.request) {
            tokens.push(group);
        }

        if let Some(metas) = &record.metas {
            for (key, value) in metas {
                tokens.push(format!("{key} => {value}"));
            }
        }

        tokens.push(record.message.clone());

        if let Some(elapsed) = record.elapsed_ms {
            tokens.push(format!("{elapsed}ms"));
        }

        let mut line = tokens.join(" ");
        line.push('\n');
        line
    }
}

/// Base name of `argv[0]`, lossily decoded, or the package name without one.
fn process_name(arg0: Option<OsString>) -> String {
    arg0.as_deref()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}

/// `[ip - status method uri id]`, or `None` when no request field is set.
fn request_group(fields: &RequestFields) -> Option<String> {
    if fields.is_empty() {
        return None;
    }

    let mut parts: Vec<String> = Vec::with_capacity(6);
    if let Some(ip) = &fields.client_ip {
        parts.push(ip.clone());
        parts.push("-".to_string());
    }
    if let Some(status) = fields.status {
        parts.push(status.to_string());
    }
    if let Some(method) = &fields.method {
        parts.push(method.clone());
    }
    if let Some(uri) = &fields.uri {
        parts.push(uri.clone());
    }
    if let Some(id) = &fields.request_id {
        parts.push(id.clone());
    }

    Some(format!("[{}]", parts.join(" ")))
}
