//! Bridge from `tracing` events to the line format.
//!
//! Library code logs with the `tracing` macros. The subscriber installed here
//! turns each event into a [`LogRecord`] and writes it through the process
//! [`Logger`], so lifecycle events and request summaries share one layout.
//!
//! Field mapping: `request_id`, `client_ip`, `method`, `uri`, `status` and
//! `cost_ms` fill the request fields, `message` is the text, anything else
//! becomes a meta.

use std::fmt;
use std::io;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::{FmtContext, MakeWriter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

use crate::observability::format::LineFormatter;
use crate::observability::logging::{Logger, LoggerError};
use crate::observability::record::{LogFields, LogRecord, LogValue, Severity};

/// Install the global subscriber writing through `logger`.
///
/// `RUST_LOG` overrides the logger threshold when set.
pub fn install(logger: Arc<Logger>) -> Result<(), LoggerError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logger.threshold().level_filter().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(LineEvents::new(logger.formatter().clone()))
        .with_writer(SinkWriter::new(logger))
        .try_init()
        .map_err(|e| LoggerError::Subscriber(e.to_string()))
}

/// [`FormatEvent`] rendering events with a [`LineFormatter`].
#[derive(Debug, Clone)]
pub struct LineEvents {
    formatter: LineFormatter,
}

impl LineEvents {
    pub fn new(formatter: LineFormatter) -> Self {
        Self { formatter }
    }
}

impl<S, N> FormatEvent<S, N> for LineEvents
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        writer.write_str(&self.formatter.format(&event_record(event)))
    }
}

/// Convert a tracing event into a record.
pub fn event_record(event: &Event<'_>) -> LogRecord {
    let mut visitor = RecordVisitor {
        record: LogRecord::new(Severity::from(*event.metadata().level()), String::new()),
        metas: LogFields::new(),
    };
    event.record(&mut visitor);

    let mut record = visitor.record;
    if !visitor.metas.is_empty() {
        record.metas = Some(visitor.metas);
    }
    record
}

struct RecordVisitor {
    record: LogRecord,
    metas: LogFields,
}

impl RecordVisitor {
    fn set(&mut self, field: &Field, value: LogValue) {
        let request = &mut self.record.request;
        match field.name() {
            "message" => self.record.message = value.to_string(),
            "request_id" => request.request_id = Some(value.to_string()),
            "client_ip" => request.client_ip = Some(value.to_string()),
            "method" => request.method = Some(value.to_string()),
            "uri" => request.uri = Some(value.to_string()),
            "status" => match value {
                LogValue::Int(code) => request.status = u16::try_from(code).ok(),
                other => request.status = other.to_string().parse().ok(),
            },
            "cost_ms" => match value {
                LogValue::Float(ms) => self.record.elapsed_ms = Some(ms),
                LogValue::Int(ms) => self.record.elapsed_ms = Some(ms as f64),
                other => {
                    self.metas.insert("cost_ms".to_string(), other);
                }
            },
            name => {
                self.metas.insert(name.to_string(), value);
            }
        }
    }
}

impl Visit for RecordVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.set(field, LogValue::Float(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.set(field, LogValue::Int(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.set(field, LogValue::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.set(field, LogValue::Bool(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.set(field, LogValue::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.set(field, LogValue::Str(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.set(field, LogValue::Str(format!("{value:?}")));
    }
}

/// [`MakeWriter`] routing formatted events to the logger's sink.
#[derive(Debug, Clone)]
pub struct SinkWriter {
    logger: Arc<Logger>,
}

impl SinkWriter {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }
}

impl<'a> MakeWriter<'a> for SinkWriter {
    type Writer = EventWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        EventWriter {
            logger: &self.logger,
            severity: Severity::Info,
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        EventWriter {
            logger: &self.logger,
            severity: Severity::from(*meta.level()),
        }
    }
}

/// Writer for a single formatted event.
#[derive(Debug)]
pub struct EventWriter<'a> {
    logger: &'a Logger,
    severity: Severity,
}

impl io::Write for EventWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.logger
            .sink()
            .write(self.severity, &String::from_utf8_lossy(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::sink::{LogBuffer, Sink};
    use tracing_subscriber::layer::SubscriberExt;

    fn capture<F: FnOnce()>(f: F) -> Vec<String> {
        let buffer = LogBuffer::new();
        let logger = Arc::new(Logger::new(
            Severity::Debug,
            Sink::Buffer(buffer.clone()),
            LineFormatter::new("gory", 1),
        ));
        let layer = tracing_subscriber::fmt::layer()
            .event_format(LineEvents::new(logger.formatter().clone()))
            .with_writer(SinkWriter::new(logger));
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, f);
        buffer.lines()
    }

    #[test]
    fn plain_event_renders_message_only() {
        let lines = capture(|| tracing::info!("Starting Server..."));
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with(" info gory[1]: Starting Server..."));
    }

    #[test]
    fn request_fields_and_metas_are_mapped() {
        let lines = capture(|| {
            tracing::warn!(
                client_ip = "10.1.1.1",
                status = 503u64,
                method = "GET",
                uri = "/x",
                request_id = "rid",
                cost_ms = 2.5,
                address = %"0.0.0.0:8000",
                "slow"
            )
        });
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains(" warning gory[1]: [10.1.1.1 - 503 GET /x rid] address => 0.0.0.0:8000 slow 2.5ms"));
    }

    #[test]
    fn debug_events_map_to_debug_severity() {
        let lines = capture(|| tracing::debug!(peer = 5i64, "accepted"));
        assert!(lines[0].contains(" debug gory[1]: peer => 5 accepted"));
    }
}
