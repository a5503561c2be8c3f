//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Create the axum Router with all handlers
//! - Wire up middleware (request logging, recovery, timeout)
//! - Bind the listener and run the accept loop on its own task
//! - Drain connections within the grace period on shutdown
//!
//! # States
//! ```text
//! Idle ──start()──▶ Serving ──shutdown()──▶ Draining ──▶ Stopped
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, Router};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer};

use crate::config::ServerConfig;
use crate::http::middleware::request_logging;
use crate::lifecycle::{signals, Shutdown, ShutdownSignal};
use crate::net::{serve_connection, ConnectionContext, Listener, ListenerError, OpenConnections};
use crate::observability::Logger;
use crate::routing::{self, AppState};

/// Pause after a failed accept (e.g. out of file descriptors).
const ACCEPT_ERROR_PAUSE: Duration = Duration::from_millis(100);

/// Lifecycle state of an [`HttpServer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Idle,
    Serving,
    Draining,
    Stopped,
}

/// Errors that end the server's lifecycle.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("listen: {0}")]
    Listen(#[from] ListenerError),

    #[error("waiting for interrupt: {0}")]
    Signal(#[source] std::io::Error),

    #[error("accept loop failed: {0}")]
    AcceptLoop(#[from] JoinError),

    #[error("graceful shutdown timed out after {grace:?} with {remaining} connection(s) still active")]
    DrainTimeout { grace: Duration, remaining: usize },
}

/// HTTP server for the application.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    logger: Arc<Logger>,
    state: watch::Sender<ServerState>,
}

impl HttpServer {
    /// Create a server exposing the application routes.
    pub fn new(config: ServerConfig, logger: Arc<Logger>) -> Self {
        let routes = routing::router(AppState {
            ping_delay: config.ping_delay(),
        });
        Self::with_routes(config, logger, routes)
    }

    /// Create a server exposing `routes` behind the standard middleware.
    pub fn with_routes(config: ServerConfig, logger: Arc<Logger>, routes: Router) -> Self {
        let router = Self::build_router(&config, &logger, routes);
        let (state, _) = watch::channel(ServerState::Idle);
        Self {
            router,
            config,
            logger,
            state,
        }
    }

    /// Wrap `routes` with the middleware stack. The logging layer is
    /// outermost so recovered panics and timeouts are still logged.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, logger: &Arc<Logger>, routes: Router) -> Router {
        routes
            .layer(TimeoutLayer::new(config.io_timeout()))
            .layer(CatchPanicLayer::new())
            .layer(middleware::from_fn_with_state(
                Arc::clone(logger),
                request_logging,
            ))
    }

    /// The middleware-wrapped router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Observe lifecycle transitions.
    pub fn state(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the listener and start accepting on a background task.
    pub async fn start(self) -> Result<RunningServer, ServeError> {
        let listener = Listener::bind(&self.config.address, self.config.max_connections).await?;
        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(address = %local_addr, "HTTP server starting");

        let shutdown = Shutdown::new();
        let open = OpenConnections::new();
        let ctx = ConnectionContext {
            app: self.router,
            logger: Arc::clone(&self.logger),
            read_timeout: self.config.io_timeout(),
            first_request_grace: self.config.io_timeout().min(self.config.grace_period()),
            open: open.clone(),
        };
        let accept_task = tokio::spawn(accept_loop(listener, ctx, shutdown.subscribe()));

        self.state.send_replace(ServerState::Serving);

        Ok(RunningServer {
            local_addr,
            grace: self.config.grace_period(),
            shutdown,
            accept_task,
            open,
            state: self.state,
        })
    }

    /// Serve until SIGINT/SIGTERM, then shut down gracefully.
    pub async fn run(self) -> Result<(), ServeError> {
        let logger = Arc::clone(&self.logger);
        logger.println("Starting Server...");
        let running = self.start().await?;

        signals::interrupt().await.map_err(ServeError::Signal)?;

        logger.println("Shutdown Server...");
        running.shutdown().await?;
        logger.println("Server exit");
        Ok(())
    }
}

/// Handle to a server in the `Serving` state.
pub struct RunningServer {
    local_addr: SocketAddr,
    grace: Duration,
    shutdown: Shutdown,
    accept_task: JoinHandle<JoinSet<()>>,
    open: OpenConnections,
    state: watch::Sender<ServerState>,
}

impl RunningServer {
    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    /// Connections accepted and not yet closed.
    pub fn open_connections(&self) -> usize {
        self.open.count()
    }

    /// Shut down with the configured grace period.
    pub async fn shutdown(self) -> Result<(), ServeError> {
        let grace = self.grace;
        self.shutdown_within(grace).await
    }

    /// Stop accepting, let in-flight requests finish, and wait at most
    /// `grace` for every connection to close. Connections still open at the
    /// deadline are aborted and reported as [`ServeError::DrainTimeout`].
    pub async fn shutdown_within(self, grace: Duration) -> Result<(), ServeError> {
        self.state.send_replace(ServerState::Draining);
        self.shutdown.trigger();

        let mut connections = match self.accept_task.await {
            Ok(connections) => connections,
            Err(e) => {
                self.state.send_replace(ServerState::Stopped);
                return Err(ServeError::AcceptLoop(e));
            }
        };

        let drained = tokio::time::timeout(grace, async {
            while connections.join_next().await.is_some() {}
        })
        .await;

        let result = match drained {
            Ok(()) => {
                tracing::info!("HTTP server stopped");
                Ok(())
            }
            Err(_) => {
                let remaining = connections.len();
                connections.abort_all();
                Err(ServeError::DrainTimeout { grace, remaining })
            }
        };

        self.state.send_replace(ServerState::Stopped);
        result
    }
}

/// Accept connections until shutdown, then hand back the still-running
/// connection tasks.
async fn accept_loop(
    listener: Listener,
    ctx: ConnectionContext,
    mut shutdown: ShutdownSignal,
) -> JoinSet<()> {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            () = shutdown.recv() => break,
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            accepted = listener.accept() => match accepted {
                Ok((stream, peer, permit)) => {
                    connections.spawn(serve_connection(
                        stream,
                        peer,
                        ctx.clone(),
                        shutdown.clone(),
                        permit,
                    ));
                }
                Err(e) => {
                    tracing::error!(error = %e, "Accept failed");
                    if pause_after_accept_error(&mut shutdown).await {
                        break;
                    }
                }
            },
        }
    }

    tracing::debug!(in_flight = connections.len(), "Stopped accepting connections");
    connections
}

/// Back off after a failed accept. Returns `true` if shutdown was triggered
/// during the pause.
async fn pause_after_accept_error(shutdown: &mut ShutdownSignal) -> bool {
    tokio::select! {
        () = shutdown.recv() => true,
        () = tokio::time::sleep(ACCEPT_ERROR_PAUSE) => false,
    }
}
