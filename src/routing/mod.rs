//! Route registration.
//!
//! # Routes
//! - `GET /ping`: slow ping that annotates its log line
//! - `GET /goffer/ping`: immediate ping
//!
//! Every route is registered through [`get`], which records the handler's
//! name for the request summary line.

pub mod goffer;

use std::time::Duration;

use axum::{
    extract::State,
    handler::Handler,
    middleware,
    routing::{self, MethodRouter},
    Json, Router,
};
use serde_json::{json, Value};

use crate::http::middleware::{handler_name::short_name, record_handler};
use crate::observability::{add_arg, add_meta};

/// State shared by the handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub ping_delay: Duration,
}

/// `GET` route whose handler name is recorded in the request log.
pub fn get<H, T, S>(handler: H) -> MethodRouter<S>
where
    H: Handler<T, S>,
    T: 'static,
    S: Clone + Send + Sync + 'static,
{
    let name = short_name(std::any::type_name::<H>());
    routing::get(handler).layer(middleware::from_fn_with_state(name, record_handler))
}

/// Build the application router with every route registered.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .nest("/goffer", goffer::routes())
        .with_state(state)
}

async fn ping(State(state): State<AppState>) -> Json<Value> {
    tokio::time::sleep(state.ping_delay).await;
    add_meta("meta", "this_is_meta_data");
    add_arg("args1", "this_is_args1");
    add_arg("args2", 2);
    Json(json!({ "message": "pong" }))
}
