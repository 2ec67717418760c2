use axum::{
    Json,
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::axum_http::error_responses::ErrorResponse;

pub async fn not_found() -> impl IntoResponse {
    debug!("http: no route matched");
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "NOT_FOUND".to_string(),
        }),
    )
        .into_response()
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK").into_response()
}

/// Rewrites error responses produced outside the handlers (timeout, body limit,
/// method mismatch) into the `{ "error": ... }` shape the handlers use.
pub async fn json_error_body(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));
    if is_json {
        return response;
    }

    debug!(status = status.as_u16(), "http: normalizing error body");
    let message = status.canonical_reason().unwrap_or("Request failed");
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use serde_json::{Value, json};

    async fn json_of(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn empty_timeout_response_gets_error_body() {
        let timed_out = Response::builder()
            .status(StatusCode::REQUEST_TIMEOUT)
            .body(Body::empty())
            .unwrap();

        let response = json_error_body(timed_out).await;

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(json_of(response).await, json!({ "error": "Request Timeout" }));
    }

    #[tokio::test]
    async fn handler_errors_pass_through_untouched() {
        let handler_error = (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Plan with id x not found".to_string(),
            }),
        )
            .into_response();

        let response = json_error_body(handler_error).await;

        assert_eq!(
            json_of(response).await,
            json!({ "error": "Plan with id x not found" })
        );
    }

    #[tokio::test]
    async fn success_is_not_rewritten() {
        let response = json_error_body(health_check().await.into_response()).await;

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"OK");
    }
}
