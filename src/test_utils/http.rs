use axum::{body::Body, http::header::CONTENT_TYPE, response::Response};
use serde_json::Value;

/// Read the body of `response` as JSON, checking that it is labelled as such.
pub(crate) async fn parse_json_body(response: Response<Body>) -> Value {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .expect("content-type header missing")
        .to_str()
        .expect("Could not convert to str")
        .to_owned();
    assert_eq!(content_type, "application/json");

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not read response body");

    serde_json::from_slice(&body).expect("Response body is not valid JSON")
}
