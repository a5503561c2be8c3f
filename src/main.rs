//! gory HTTP service.
//!
//! ```text
//!   env.yml ──▶ config ──▶ HttpServer ──▶ listener ──▶ connection tasks
//!                              │
//!   GORY_MODE ──▶ logger ◀─────┴── request logging middleware (one line per request)
//! ```
//!
//! Startup failures (logger, config, bind) and an expired shutdown grace
//! period are fatal: they are logged and the process exits with status 1.

use std::path::PathBuf;

use clap::Parser;

use gory::config::{load_config, RunMode, DEFAULT_CONFIG_FILE, MODE_ENV};
use gory::observability::{self, Logger};
use gory::HttpServer;

#[derive(Parser)]
#[command(name = "gory")]
#[command(about = "HTTP service with per-request logging and graceful shutdown", long_about = None)]
struct Cli {
    /// Configuration file (YAML, or TOML when it ends in `.toml`).
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Run mode; `release` logs to syslog at info level.
    #[arg(long, env = MODE_ENV, value_enum, default_value_t = RunMode::Debug)]
    mode: RunMode,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let logger = match observability::initialize(cli.mode) {
        Ok(logger) => logger,
        Err(e) => Logger::development().fatal(format!("Init logger got error => {e}")),
    };

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => logger.fatal(format!("Load config env got error => {e}")),
    };

    tracing::info!(
        mode = %cli.mode,
        address = %config.address,
        timeout = config.timeout,
        graceful_timeout = config.graceful_timeout,
        "Configuration loaded"
    );

    let server = HttpServer::new(config, logger.clone());
    if let Err(e) = server.run().await {
        logger.fatal(format!("Server Shutdown: {e}"));
    }
}
