//! Request logging middleware.
//!
//! Emits exactly one info line per request once the response is final:
//!
//! ```text
//! <time> info gory[pid]: [<ip> - <status> <method> <uri> <id>] <metas> <handler>(<args>) <cost>ms
//! ```

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Local;

use crate::http::request::{client_ip, generate_request_id};
use crate::observability::request_log;
use crate::observability::{Logger, RequestFields};

/// Wrap the downstream stack with a request log scope and log its outcome.
pub async fn request_logging(
    State(logger): State<Arc<Logger>>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let started_at = Local::now();

    let request_id = match generate_request_id() {
        Ok(id) => Some(id.to_string()),
        Err(e) => {
            logger.error(format!("Generate request id got error => {e}"));
            None
        }
    };

    let view = logger.request_view(
        started_at,
        RequestFields {
            request_id,
            client_ip: client_ip(&request),
            method: Some(request.method().to_string()),
            uri: Some(request.uri().to_string()),
            status: None,
        },
    );

    let (response, mut log) = request_log::attach(next.run(request)).await;

    let mut view = view.with_status(response.status().as_u16());
    if let Some(metas) = log.take_metas() {
        view = view.with_metas(metas);
    }
    view.with_elapsed(started.elapsed()).info(log.summary());

    response
}
