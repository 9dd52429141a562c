//! Translation of [`Rejection`] into HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pipeline::{Rejection, RejectionKind};

/// Wraps a pipeline [`Rejection`] so handlers can return it directly.
#[derive(Debug)]
pub struct RejectionResponse(pub Rejection);

impl From<Rejection> for RejectionResponse {
    fn from(rejection: Rejection) -> Self {
        Self(rejection)
    }
}

impl IntoResponse for RejectionResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0)).into_response()
    }
}

/// 400 for a query string `GET /events` cannot serve.
pub fn invalid_query(message: impl Into<String>) -> Response {
    RejectionResponse(Rejection::new(
        RejectionKind::BadRequest,
        "invalid_query",
        message,
    ))
    .into_response()
}

/// 413 for a body over the configured limit.
pub fn payload_too_large(limit: usize) -> Response {
    let body = serde_json::json!({
        "message": format!("Payload exceeds {limit} bytes"),
        "reason": "payload_too_large",
    });
    (StatusCode::PAYLOAD_TOO_LARGE, Json(body)).into_response()
}
