//! Output sinks for formatted log lines.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use syslog::{Facility, Formatter3164, LoggerBackend};

use crate::observability::record::Severity;

type SyslogWriter = syslog::Logger<LoggerBackend, Formatter3164>;

/// Destination for formatted lines.
pub enum Sink {
    /// Process standard output.
    Stdout,
    /// Local syslog daemon over the unix socket.
    Syslog(Mutex<SyslogWriter>),
    /// In-memory buffer, shared with whoever created it.
    Buffer(LogBuffer),
}

impl Sink {
    /// Connect to the local syslog daemon, tagging messages with `process`.
    pub fn syslog(process: &str) -> Result<Self, syslog::Error> {
        let formatter = Formatter3164 {
            facility: Facility::LOG_USER,
            hostname: None,
            process: process.to_string(),
            pid: std::process::id(),
        };
        let writer = syslog::unix(formatter)?;
        Ok(Sink::Syslog(Mutex::new(writer)))
    }

    /// Write one already formatted line.
    pub fn write(&self, severity: Severity, line: &str) -> io::Result<()> {
        match self {
            Sink::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(line.as_bytes())?;
                out.flush()
            }
            Sink::Syslog(writer) => {
                let mut writer = writer.lock().unwrap_or_else(PoisonError::into_inner);
                let message = line.trim_end();
                let result = match severity {
                    Severity::Debug => writer.debug(message),
                    Severity::Info => writer.info(message),
                    Severity::Warn => writer.warning(message),
                    Severity::Error => writer.err(message),
                    Severity::Fatal => writer.crit(message),
                };
                result.map_err(|e| io::Error::other(e.to_string()))
            }
            Sink::Buffer(buffer) => {
                buffer.append(line.as_bytes());
                Ok(())
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Sink::Stdout => "stdout",
            Sink::Syslog(_) => "syslog",
            Sink::Buffer(_) => "buffer",
        }
    }
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Sink").field(&self.name()).finish()
    }
}

/// Cloneable in-memory log destination, used to capture output in tests.
#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn append(&self, data: &[u8]) {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(data);
    }

    /// Everything written so far.
    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Written lines, without their terminators.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_sink_collects_lines() {
        let buffer = LogBuffer::new();
        let sink = Sink::Buffer(buffer.clone());
        sink.write(Severity::Info, "first\n").unwrap();
        sink.write(Severity::Error, "second\n").unwrap();
        assert_eq!(buffer.lines(), vec!["first".to_string(), "second".to_string()]);
        assert_eq!(sink.name(), "buffer");
    }
}
