//! Request-scoped log context.
//!
//! The logging middleware runs each request inside [`attach`], which opens a
//! task-local scope holding an empty [`RequestLog`]. Code running inside that
//! scope adds entries with [`add_arg`] and [`add_meta`]; the middleware gets
//! the final context back once the downstream future completes and the scope
//! is gone.

use std::cell::RefCell;
use std::future::Future;

use crate::observability::record::{LogFields, LogValue};

tokio::task_local! {
    static REQUEST_LOG: RefCell<RequestLog>;
}

/// Args and metas collected while one request is handled.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RequestLog {
    handler: Option<&'static str>,
    args: Option<LogFields>,
    metas: Option<LogFields>,
}

impl RequestLog {
    pub fn add_arg(&mut self, key: impl Into<String>, value: impl Into<LogValue>) {
        self.args
            .get_or_insert_with(LogFields::new)
            .insert(key.into(), value.into());
    }

    pub fn add_meta(&mut self, key: impl Into<String>, value: impl Into<LogValue>) {
        self.metas
            .get_or_insert_with(LogFields::new)
            .insert(key.into(), value.into());
    }

    pub fn handler(&self) -> Option<&'static str> {
        self.handler
    }

    pub fn args(&self) -> Option<&LogFields> {
        self.args.as_ref()
    }

    pub fn metas(&self) -> Option<&LogFields> {
        self.metas.as_ref()
    }

    pub fn take_metas(&mut self) -> Option<LogFields> {
        self.metas.take()
    }

    /// Args as `key=value` pairs joined by commas, values quoted.
    pub fn render_args(&self) -> String {
        self.args
            .iter()
            .flatten()
            .map(|(key, value)| format!("{key}={}", value.quoted()))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// `handler(args)` summary used as the request line message.
    pub fn summary(&self) -> String {
        format!("{}({})", self.handler.unwrap_or("-"), self.render_args())
    }
}

/// Run `future` inside a fresh request log scope.
///
/// Returns the future's output together with everything recorded in the
/// scope.
pub async fn attach<F>(future: F) -> (F::Output, RequestLog)
where
    F: Future,
{
    REQUEST_LOG
        .scope(RefCell::new(RequestLog::default()), async move {
            let output = future.await;
            let log = REQUEST_LOG.with(|log| log.take());
            (output, log)
        })
        .await
}

/// True when called inside an [`attach`] scope.
pub fn is_attached() -> bool {
    REQUEST_LOG.try_with(|_| ()).is_ok()
}

/// Record an argument for the current request's log line.
///
/// # Panics
///
/// Panics when called outside an [`attach`] scope, which means the logging
/// middleware is not installed in front of the caller.
pub fn add_arg(key: impl Into<String>, value: impl Into<LogValue>) {
    with_log(|log| log.add_arg(key, value));
}

/// Record a meta for the current request's log line.
///
/// # Panics
///
/// Panics when called outside an [`attach`] scope.
pub fn add_meta(key: impl Into<String>, value: impl Into<LogValue>) {
    with_log(|log| log.add_meta(key, value));
}

/// Record which handler served the current request.
///
/// # Panics
///
/// Panics when called outside an [`attach`] scope.
pub fn name_handler(name: &'static str) {
    with_log(|log| log.handler = Some(name));
}

fn with_log<R>(f: impl FnOnce(&mut RequestLog) -> R) -> R {
    match REQUEST_LOG.try_with(|log| f(&mut log.borrow_mut())) {
        Ok(result) => result,
        Err(_) => panic!("request log context is not attached; install the request logging middleware"),
    }
}
