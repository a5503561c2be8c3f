//! Request logging through a running server.

use std::collections::HashSet;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use gory::http::HttpServer;
use gory::routing::get;
use gory::{add_arg, add_meta};

mod common;

#[tokio::test]
async fn ping_logs_metas_args_and_cost() {
    let (logger, buffer) = common::captured_logger();
    let server = HttpServer::new(common::test_config(), logger);
    let running = server.start().await.unwrap();

    let res = reqwest::get(common::url(running.local_addr(), "/ping")).await.unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "message": "pong" }));

    let lines = common::wait_for_lines(&buffer, 1).await;
    assert_eq!(lines.len(), 1, "expected exactly one line: {lines:?}");
    let line = &lines[0];

    assert!(line.contains(" info gory["), "{line}");
    assert!(line.contains("[127.0.0.1 - 200 GET /ping "), "{line}");
    assert!(line.contains(" meta => this_is_meta_data "), "{line}");
    assert!(line.contains("routing::ping("), "{line}");
    assert!(line.contains("args1=\"this_is_args1\""), "{line}");
    assert!(line.contains("args2=2"), "{line}");
    assert!(common::cost_ms(line) >= 50.0, "{line}");

    running.shutdown().await.unwrap();
}

#[tokio::test]
async fn goffer_ping_logs_without_metas_or_args() {
    let (logger, buffer) = common::captured_logger();
    let running = HttpServer::new(common::test_config(), logger)
        .start()
        .await
        .unwrap();

    let res = reqwest::get(common::url(running.local_addr(), "/goffer/ping")).await.unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "pong");

    let lines = common::wait_for_lines(&buffer, 1).await;
    assert_eq!(lines.len(), 1);
    let line = &lines[0];
    assert!(!line.contains(" => "), "{line}");
    assert!(line.contains(" goffer::ping() "), "{line}");
    assert!(line.contains(" 200 GET /goffer/ping "), "{line}");
    assert!(common::cost_ms(line) >= 0.0);

    running.shutdown().await.unwrap();
}

#[tokio::test]
async fn one_line_per_request_with_distinct_ids() {
    let (logger, buffer) = common::captured_logger();
    let running = HttpServer::new(common::test_config(), logger)
        .start()
        .await
        .unwrap();
    let addr = running.local_addr();

    let client = reqwest::Client::new();
    let mut requests = tokio::task::JoinSet::new();
    for _ in 0..5 {
        let client = client.clone();
        requests.spawn(async move { client.get(common::url(addr, "/goffer/ping")).send().await });
    }
    while let Some(res) = requests.join_next().await {
        assert_eq!(res.unwrap().unwrap().status(), 200);
    }

    let lines = common::wait_for_lines(&buffer, 5).await;
    assert_eq!(lines.len(), 5);

    let ids: HashSet<String> = lines
        .iter()
        .map(|line| {
            let start = line.find("]: [").unwrap() + 4;
            let end = start + line[start..].find(']').unwrap();
            line[start..end].rsplit(' ').next().unwrap().to_string()
        })
        .collect();
    assert_eq!(ids.len(), 5);

    running.shutdown().await.unwrap();
}

async fn boom() -> &'static str {
    add_meta("before", "panic");
    panic!("handler exploded");
}

async fn annotated() -> &'static str {
    add_arg("x", 1);
    add_arg("x", 2);
    add_arg("flag", true);
    add_meta("a", "1");
    add_meta("b", "2");
    tokio::time::sleep(Duration::from_millis(50)).await;
    "ok"
}

fn custom_server() -> (HttpServer, gory::observability::LogBuffer) {
    let (logger, buffer) = common::captured_logger();
    let routes = Router::new()
        .route("/boom", get(boom))
        .route("/annotated", get(annotated));
    (
        HttpServer::with_routes(common::test_config(), logger, routes),
        buffer,
    )
}

#[tokio::test]
async fn recovered_panic_is_logged_as_500() {
    let (server, buffer) = custom_server();
    let res = server
        .router()
        .oneshot(Request::get("/boom").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let lines = buffer.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("[500 GET /boom "), "{}", lines[0]);
    assert!(lines[0].contains(" before => panic "), "{}", lines[0]);
    assert!(lines[0].contains(" request_logging::boom() "), "{}", lines[0]);
}

#[tokio::test]
async fn repeated_args_keep_last_value() {
    let (server, buffer) = custom_server();
    let res = server
        .router()
        .oneshot(Request::get("/annotated?q=1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let line = &buffer.lines()[0];
    assert!(line.contains("[200 GET /annotated?q=1 "), "{line}");
    assert!(line.contains(" a => 1 "), "{line}");
    assert!(line.contains(" b => 2 "), "{line}");
    assert!(line.contains("annotated(flag=true,x=2)"), "{line}");
    assert!(!line.contains("x=1"), "{line}");
    assert!(common::cost_ms(line) >= 50.0, "{line}");
}

#[tokio::test]
async fn unmatched_route_is_logged_once() {
    let (server, buffer) = custom_server();
    let res = server
        .router()
        .oneshot(
            Request::get("/missing")
                .header("x-forwarded-for", "203.0.113.9")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let lines = buffer.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("[203.0.113.9 - 404 GET /missing "), "{}", lines[0]);
    assert!(lines[0].contains(" -() "), "{}", lines[0]);
}
