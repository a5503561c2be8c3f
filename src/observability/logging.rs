//! Process logger.
//!
//! # Responsibilities
//! - Pick sink and verbosity from the run mode (stdout/debug in development,
//!   syslog/info in release)
//! - Format and write records through [`LineFormatter`]
//! - Hand out per-request views carrying request fields
//!
//! # Design Decisions
//! - A [`Logger`] is immutable once built; it is shared through `Arc`
//! - [`initialize`] stores the process-wide instance exactly once and
//!   installs the tracing bridge alongside it

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::config::RunMode;
use crate::observability::format::LineFormatter;
use crate::observability::record::{LogFields, LogRecord, RequestFields, Severity};
use crate::observability::sink::{LogBuffer, Sink};

static LOGGER: OnceLock<Arc<Logger>> = OnceLock::new();

/// Errors raised while setting up logging.
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("cannot open syslog: {0}")]
    Syslog(#[from] syslog::Error),

    #[error("cannot install tracing subscriber: {0}")]
    Subscriber(String),
}

/// Build the process-wide logger for `mode` and install the tracing bridge.
///
/// Later calls return the instance built by the first successful call.
pub fn initialize(mode: RunMode) -> Result<Arc<Logger>, LoggerError> {
    if let Some(logger) = LOGGER.get() {
        return Ok(Arc::clone(logger));
    }

    let candidate = Arc::new(Logger::for_mode(mode)?);
    let installed = LOGGER.get_or_init(|| Arc::clone(&candidate));
    if Arc::ptr_eq(installed, &candidate) {
        crate::observability::tracing::install(Arc::clone(installed))?;
    }
    Ok(Arc::clone(installed))
}

/// The process-wide logger, if [`initialize`] has run.
pub fn get_logger() -> Option<Arc<Logger>> {
    LOGGER.get().cloned()
}

/// Leveled logger writing formatted lines to a single sink.
#[derive(Debug)]
pub struct Logger {
    threshold: Severity,
    sink: Sink,
    formatter: LineFormatter,
}

impl Logger {
    pub fn new(threshold: Severity, sink: Sink, formatter: LineFormatter) -> Self {
        Self {
            threshold,
            sink,
            formatter,
        }
    }

    /// Logger for the given run mode, named after the running binary.
    pub fn for_mode(mode: RunMode) -> Result<Self, LoggerError> {
        let formatter = LineFormatter::for_current_process();
        if mode.is_release() {
            let sink = Sink::syslog(env!("CARGO_PKG_NAME"))?;
            Ok(Self::new(Severity::Info, sink, formatter))
        } else {
            Ok(Self::new(Severity::Debug, Sink::Stdout, formatter))
        }
    }

    /// Development logger: stdout, debug and above.
    pub fn development() -> Self {
        Self::new(
            Severity::Debug,
            Sink::Stdout,
            LineFormatter::for_current_process(),
        )
    }

    /// Logger capturing into `buffer`, with every severity enabled.
    pub fn buffered(buffer: LogBuffer) -> Self {
        Self::new(
            Severity::Debug,
            Sink::Buffer(buffer),
            LineFormatter::for_current_process(),
        )
    }

    pub fn threshold(&self) -> Severity {
        self.threshold
    }

    pub fn formatter(&self) -> &LineFormatter {
        &self.formatter
    }

    pub fn sink(&self) -> &Sink {
        &self.sink
    }

    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.threshold
    }

    /// Format and write `record` if its severity passes the threshold.
    pub fn emit(&self, record: &LogRecord) {
        if !self.enabled(record.severity) {
            return;
        }
        let line = self.formatter.format(record);
        self.write(record.severity, &line);
    }

    /// Write `line` to the sink as is. Used for connection-level diagnostics
    /// that bypass the formatter.
    pub fn write_line(&self, line: &str) {
        if line.ends_with('\n') {
            self.write(Severity::Error, line);
        } else {
            self.write(Severity::Error, &format!("{line}\n"));
        }
    }

    fn write(&self, severity: Severity, line: &str) {
        if let Err(e) = self.sink.write(severity, line) {
            eprintln!("Failed to write to log, {e}");
        }
    }

    pub fn log(&self, severity: Severity, message: impl Into<String>) {
        if self.enabled(severity) {
            self.emit(&LogRecord::new(severity, message));
        }
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(Severity::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(Severity::Info, message);
    }

    /// Plain lifecycle message, logged at info.
    pub fn println(&self, message: impl Into<String>) {
        self.log(Severity::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(Severity::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(Severity::Error, message);
    }

    /// Log at fatal severity and terminate the process with status 1.
    pub fn fatal(&self, message: impl Into<String>) -> ! {
        self.log(Severity::Fatal, message);
        std::process::exit(1);
    }

    /// Per-request view stamped with `time` and carrying `fields`.
    pub fn request_view(&self, time: DateTime<Local>, fields: RequestFields) -> RequestLogger<'_> {
        RequestLogger {
            logger: self,
            time,
            fields,
            metas: None,
            elapsed: None,
        }
    }
}

/// A logger view bound to one request.
#[derive(Debug, Clone)]
pub struct RequestLogger<'a> {
    logger: &'a Logger,
    time: DateTime<Local>,
    fields: RequestFields,
    metas: Option<LogFields>,
    elapsed: Option<Duration>,
}

impl RequestLogger<'_> {
    pub fn fields(&self) -> &RequestFields {
        &self.fields
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.fields.status = Some(status);
        self
    }

    pub fn with_metas(mut self, metas: LogFields) -> Self {
        self.metas = Some(metas);
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = Some(elapsed);
        self
    }

    /// Build the record this view would emit at `severity`.
    pub fn record(&self, severity: Severity, message: impl Into<String>) -> LogRecord {
        LogRecord {
            time: self.time,
            severity,
            request: self.fields.clone(),
            metas: self.metas.clone(),
            elapsed_ms: self.elapsed.map(|d| d.as_secs_f64() * 1000.0),
            message: message.into(),
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.logger.emit(&self.record(Severity::Info, message));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.logger.emit(&self.record(Severity::Error, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::record::LogValue;

    fn captured(threshold: Severity) -> (Logger, LogBuffer) {
        let buffer = LogBuffer::new();
        let logger = Logger::new(
            threshold,
            Sink::Buffer(buffer.clone()),
            LineFormatter::new("gory", 7),
        );
        (logger, buffer)
    }

    #[test]
    fn threshold_filters_lower_severities() {
        let (logger, buffer) = captured(Severity::Info);
        logger.debug("hidden");
        logger.info("shown");
        logger.warn("also shown");
        let lines = buffer.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" info gory[7]: shown"));
        assert!(lines[1].ends_with(" warning gory[7]: also shown"));
    }

    #[test]
    fn write_line_bypasses_formatter() {
        let (logger, buffer) = captured(Severity::Debug);
        logger.write_line("http: connection reset");
        assert_eq!(buffer.contents(), "http: connection reset\n");
    }

    #[test]
    fn request_view_carries_bound_fields() {
        let (logger, buffer) = captured(Severity::Debug);
        let fields = RequestFields {
            client_ip: Some("127.0.0.1".into()),
            method: Some("GET".into()),
            uri: Some("/ping".into()),
            request_id: Some("id-1".into()),
            ..Default::default()
        };
        let mut metas = LogFields::new();
        metas.insert("meta".into(), LogValue::from("m"));
        logger
            .request_view(Local::now(), fields)
            .with_status(200)
            .with_metas(metas)
            .with_elapsed(Duration::from_millis(12))
            .info("ping()");

        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("[127.0.0.1 - 200 GET /ping id-1] meta => m ping() 12ms"));
    }

    #[test]
    fn development_logger_is_debug_on_stdout() {
        let logger = Logger::development();
        assert_eq!(logger.threshold(), Severity::Debug);
        assert_eq!(logger.sink().name(), "stdout");
        assert!(logger.enabled(Severity::Debug));
    }
}
