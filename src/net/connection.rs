//! Per-connection serving.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Serve HTTP/1.1 on one accepted stream with a header read timeout
//! - Finish the in-flight request and close when shutdown is triggered

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ConnectInfo;
use axum::Router;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::Request;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tower::Service;

use crate::lifecycle::ShutdownSignal;
use crate::net::listener::ConnectionPermit;
use crate::observability::Logger;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Largest request head a client may send.
pub const MAX_HEADER_BYTES: usize = 1 << 20;

/// Number of connections currently being served.
#[derive(Debug, Clone, Default)]
pub struct OpenConnections(Arc<AtomicUsize>);

impl OpenConnections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    fn enter(&self) -> OpenConnectionGuard {
        self.0.fetch_add(1, Ordering::AcqRel);
        OpenConnectionGuard(Arc::clone(&self.0))
    }
}

/// Decrements the open connection count when the connection task ends,
/// aborted or not.
struct OpenConnectionGuard(Arc<AtomicUsize>);

impl Drop for OpenConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Everything a connection task needs besides its stream.
#[derive(Clone)]
pub struct ConnectionContext {
    pub app: Router,
    pub logger: Arc<Logger>,
    pub read_timeout: Duration,
    /// How long a connection that has not sent its first request yet is
    /// kept open once shutdown starts.
    pub first_request_grace: Duration,
    pub open: OpenConnections,
}

/// Serve one accepted connection until the client closes it or shutdown is
/// triggered. On shutdown the in-flight request, if any, runs to completion
/// before the connection closes. A connection still waiting for its first
/// request gets up to `first_request_grace` to send it.
pub async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    ctx: ConnectionContext,
    mut shutdown: ShutdownSignal,
    _permit: ConnectionPermit,
) {
    let _open = ctx.open.enter();
    let id = ConnectionId::new();
    let first_request = Arc::new(Notify::new());

    let app = ctx.app;
    let started = Arc::clone(&first_request);
    let service = hyper::service::service_fn(move |mut request: Request<Incoming>| {
        started.notify_one();
        request.extensions_mut().insert(ConnectInfo(peer));
        app.clone().call(request)
    });

    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(ctx.read_timeout)
        .max_buf_size(MAX_HEADER_BYTES);
    let conn = builder.serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let result = tokio::select! {
        result = conn.as_mut() => result,
        () = shutdown.recv() => {
            // notify_one keeps a permit, so a request that already started
            // completes this wait immediately.
            let finished = tokio::select! {
                result = conn.as_mut() => Some(result),
                () = first_request.notified() => None,
                () = tokio::time::sleep(ctx.first_request_grace) => None,
            };
            match finished {
                Some(result) => result,
                None => {
                    tracing::debug!(connection_id = %id, "Draining connection");
                    conn.as_mut().graceful_shutdown();
                    conn.as_mut().await
                }
            }
        }
    };

    if let Err(e) = result {
        if !e.is_incomplete_message() {
            ctx.logger
                .write_line(&format!("http: error serving connection {id} from {peer}: {e}"));
        }
    }
    tracing::trace!(connection_id = %id, "Connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
        assert!(id2.as_u64() > id1.as_u64());
        assert!(id1.to_string().starts_with("conn-"));
    }

    #[test]
    fn open_connections_released_on_drop() {
        let open = OpenConnections::new();
        let first = open.enter();
        let second = open.enter();
        assert_eq!(open.count(), 2);
        drop(first);
        assert_eq!(open.count(), 1);
        drop(second);
        assert_eq!(open.count(), 0);
    }
}
