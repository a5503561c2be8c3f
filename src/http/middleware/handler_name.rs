//! Records the name of the handler serving a request.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::observability::request_log;

/// Short `<module>::<fn>` form of a handler type name.
pub fn short_name(full: &'static str) -> &'static str {
    match full.rmatch_indices("::").nth(1) {
        Some((idx, _)) => &full[idx + 2..],
        None => full,
    }
}

/// Store `name` in the request log before running the handler.
pub async fn record_handler(
    State(name): State<&'static str>,
    request: Request,
    next: Next,
) -> Response {
    if request_log::is_attached() {
        request_log::name_handler(name);
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_last_two_path_segments() {
        assert_eq!(short_name("gory::routing::goffer::ping"), "goffer::ping");
        assert_eq!(short_name("routing::ping"), "routing::ping");
        assert_eq!(short_name("ping"), "ping");
    }
}
