//! Same-origin proxy to the upstream API

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{header::CONTENT_TYPE, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};

use crate::AppState;

/// Path and query forwarded upstream for a proxied request
pub fn upstream_target(path: &str, query: Option<&str>) -> String {
    match query {
        Some(q) if !q.is_empty() => format!("/{}?{}", path.trim_start_matches('/'), q),
        _ => format!("/{}", path.trim_start_matches('/')),
    }
}

/// Forward GET/POST/PUT/DELETE verbatim; the upstream status is kept
pub async fn proxy_request(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    Path(path): Path<String>,
    body: Bytes,
) -> Response {
    let target = upstream_target(&path, uri.query());

    match state
        .client
        .forward(method.as_str(), &target, body.to_vec())
        .await
    {
        Ok(upstream) => {
            let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
            let mut builder = Response::builder().status(status);
            if let Some(content_type) = upstream.content_type {
                builder = builder.header(CONTENT_TYPE, content_type);
            }
            builder
                .body(Body::from(upstream.body))
                .unwrap_or_else(|_| StatusCode::BAD_GATEWAY.into_response())
        }
        Err(e) => e.into_response(),
    }
}
