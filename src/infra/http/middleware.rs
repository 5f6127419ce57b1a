use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, debug, error, info_span, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

const MAX_REQUEST_ID_LEN: usize = 128;

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

/// Adopt the caller's `x-request-id` when it is usable, otherwise mint one,
/// and echo it on the response.
pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty() && value.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let ctx = RequestContext {
        request_id: request_id.clone(),
    };
    request.extensions_mut().insert(ctx.clone());

    let span = info_span!("request", request_id = %request_id);
    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response.extensions_mut().insert(ctx);
    response
}

/// Catalog level a path addresses, used to group response logs.
fn resource_of(path: &str) -> &'static str {
    let segments: Vec<&str> = path
        .trim_start_matches("/api/v1/")
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();

    match segments.as_slice() {
        ["menus", _, "submenus", _, "dishes", ..] => "dish",
        ["menus", _, "submenus", ..] => "submenu",
        ["menus", ..] => "menu",
        ["exports", ..] => "export",
        ["generate_data"] => "seed",
        _ => "other",
    }
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let resource = resource_of(&path);
    let start = Instant::now();

    let mut response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = start.elapsed().as_millis();

    if !status.is_client_error() && !status.is_server_error() {
        debug!(
            target = "carte::http::response",
            status = status.as_u16(),
            method = %method,
            path = %path,
            resource,
            elapsed_ms,
            "request served"
        );
        return response;
    }

    let (source, messages) = match response.extensions_mut().remove::<ErrorReport>() {
        Some(report) => (report.source, report.messages),
        None => ("axum", Vec::new()),
    };
    let detail = messages
        .first()
        .cloned()
        .unwrap_or_else(|| "rejected before reaching a handler".to_string());

    if status.is_server_error() {
        error!(
            target = "carte::http::response",
            status = status.as_u16(),
            method = %method,
            path = %path,
            resource,
            elapsed_ms,
            source,
            detail = %detail,
            chain = ?messages,
            "request failed"
        );
    } else {
        warn!(
            target = "carte::http::response",
            status = status.as_u16(),
            method = %method,
            path = %path,
            resource,
            elapsed_ms,
            source,
            detail = %detail,
            "client request error"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_map_to_catalog_levels() {
        assert_eq!(resource_of("/api/v1/menus"), "menu");
        assert_eq!(resource_of("/api/v1/menus/3"), "menu");
        assert_eq!(resource_of("/api/v1/menus/3/submenus/4"), "submenu");
        assert_eq!(resource_of("/api/v1/menus/3/submenus/4/dishes"), "dish");
        assert_eq!(resource_of("/api/v1/exports/abc"), "export");
        assert_eq!(resource_of("/api/v1/generate_data"), "seed");
        assert_eq!(resource_of("/healthz"), "other");
    }
}
