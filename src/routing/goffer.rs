//! Routes mounted under `/goffer`.

use axum::{Json, Router};
use serde_json::{json, Value};

use crate::routing::{get, AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/ping", get(ping))
}

async fn ping() -> Json<Value> {
    Json(json!({ "message": "pong" }))
}
