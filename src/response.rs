//! The JSON envelope shared by every API response.

use axum::{
    Json,
    extract::FromRequest,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::Error;

/// A JSON request body whose rejections are reported as [Error::InvalidRequest].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct JsonBody<T>(pub T);

/// The JSON body sent for successful requests.
#[derive(Debug, Serialize)]
struct SuccessBody<'a, T> {
    success: bool,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

/// Respond with `status`, `message` and a `data` payload.
pub fn success<T: Serialize>(status: StatusCode, message: &str, data: T) -> Response {
    let body = SuccessBody {
        success: true,
        message,
        data: Some(data),
    };

    (status, Json(body)).into_response()
}

/// Respond with 200 OK and only a message.
pub fn success_message(message: &str) -> Response {
    let body = SuccessBody::<()> {
        success: true,
        message,
        data: None,
    };

    (StatusCode::OK, Json(body)).into_response()
}

#[cfg(test)]
mod response_tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_utils::parse_json_body;

    use super::{success, success_message};

    #[tokio::test]
    async fn success_wraps_data() {
        let response = success(StatusCode::CREATED, "Created", json!({"id": 1}));

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = parse_json_body(response).await;
        assert_eq!(
            body,
            json!({"success": true, "message": "Created", "data": {"id": 1}})
        );
    }

    #[tokio::test]
    async fn success_message_omits_data() {
        let response = success_message("Logged out");

        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_json_body(response).await;
        assert_eq!(body, json!({"success": true, "message": "Logged out"}));
    }
}
