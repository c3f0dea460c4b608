// src/logging_middleware.rs
//! Middleware for logging request and response bodies in debug mode

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::{debug, enabled, Level};

use crate::common::safe_email_log;

/// Form fields whose values never reach the log
const MASKED_FIELDS: &[&str] = &["password", "confirm_password"];

/// Form fields that carry an email address, or may (`user` on sign-in)
const EMAIL_FIELDS: &[&str] = &["email", "user"];

/// Middleware to log request and response bodies in debug mode
pub async fn log_request_response(request: Request, next: Next) -> Result<Response, StatusCode> {
    if !enabled!(Level::DEBUG) {
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();

    // Read request body
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if !bytes.is_empty() {
        if let Ok(body_str) = std::str::from_utf8(&bytes) {
            debug!(
                method = %parts.method,
                path = %parts.uri.path(),
                request_body = %mask_form_body(body_str),
                "📥 Request"
            );
        }
    }

    // Reconstruct request
    let request = Request::from_parts(parts, Body::from(bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    debug!(
        status = %parts.status,
        location = ?parts
            .headers
            .get(axum::http::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(strip_query),
        body_bytes = bytes.len(),
        "📤 Response"
    );

    Ok(Response::from_parts(parts, Body::from(bytes)))
}

/// Replaces the value of every masked field in a urlencoded body.
fn mask_form_body(body: &str) -> String {
    body.split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if MASKED_FIELDS.contains(&key) => format!("{}=***", key),
            Some((key, value)) if EMAIL_FIELDS.contains(&key) && looks_like_email(value) => {
                format!("{}={}", key, safe_email_log(&value.replace("%40", "@")))
            }
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// OAuth redirects carry `state` and `code` in the query.
fn strip_query(target: &str) -> &str {
    target.split('?').next().unwrap_or(target)
}

fn looks_like_email(value: &str) -> bool {
    value.contains('@') || value.contains("%40")
}
