//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{header::CONTENT_TYPE, request, response},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::Error;

/// Request and response bodies longer than this many bytes are truncated at
/// the `info` level and logged in full at the `debug` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The largest body the middleware will buffer.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// The JSON fields whose values are never logged.
const REDACTED_FIELDS: [&str; 1] = ["password"];

/// Log the request and response for each request.
///
/// Passwords in JSON request bodies are redacted before logging.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!("Could not read request body: {error}");
            return Error::InvalidRequest("the request body could not be read".to_owned())
                .into_response();
        }
    };

    let body_text = if is_json(&parts) {
        redact_json(&body_bytes)
    } else {
        String::from_utf8_lossy(&body_bytes).into_owned()
    };
    log_request(&parts, &body_text);

    let response = next.run(Request::from_parts(parts, Body::from(body_bytes))).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            Bytes::new()
        }
    };
    log_response(&parts, &String::from_utf8_lossy(&body_bytes));

    Response::from_parts(parts, Body::from(body_bytes))
}

fn is_json(parts: &request::Parts) -> bool {
    parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

/// Render a JSON body with the values of [REDACTED_FIELDS] replaced.
///
/// Bodies that are not valid JSON are not logged at all, since a password
/// could be anywhere in them.
fn redact_json(body: &[u8]) -> String {
    if body.is_empty() {
        return String::new();
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(mut value) => {
            if let Some(object) = value.as_object_mut() {
                for field in REDACTED_FIELDS {
                    if let Some(field_value) = object.get_mut(field) {
                        *field_value = Value::String("********".to_owned());
                    }
                }
            }

            value.to_string()
        }
        Err(_) => "<invalid JSON>".to_owned(),
    }
}

fn truncate(body: &str) -> &str {
    if body.len() <= LOG_BODY_LENGTH_LIMIT {
        return body;
    }

    let mut end = LOG_BODY_LENGTH_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }

    &body[..end]
}

fn log_request(parts: &request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {} {}\nbody: {}...",
            parts.method,
            parts.uri,
            truncate(body)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!(
            "Received request: {} {}\nbody: {body:?}",
            parts.method,
            parts.uri
        );
    }
}

fn log_response(parts: &response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {}\nbody: {}...",
            parts.status,
            truncate(body)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {}\nbody: {body:?}", parts.status);
    }
}
