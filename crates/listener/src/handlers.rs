//! Route handlers.

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, FailedToBufferBody, QueryRejection},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use pipeline::{DeliveryId, TransportAbort, WebhookDelivery};
use serde_json::json;
use tracing::warn;

use crate::response::{invalid_query, payload_too_large, RejectionResponse};
use crate::state::{AppState, EventsParams};

/// HMAC signature of the raw body, `sha256=<hex>`.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";
/// Event kind (`push`, `pull_request`, ...).
pub const EVENT_HEADER: &str = "x-github-event";
/// Unique id of this delivery attempt.
pub const DELIVERY_HEADER: &str = "x-github-delivery";
/// Tells `/events` clients that redeliveries are stored as separate records.
pub const DEDUPLICATED_HEADER: &str = "x-events-deduplicated";

const INDEX_HTML: &str = include_str!("../assets/index.html");

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[tracing::instrument(name = "POST /webhook", skip_all)]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(bytes) => Ok(bytes.to_vec()),
        Err(BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(_))) => {
            warn!(limit = state.max_body_bytes, "webhook body over limit");
            return payload_too_large(state.max_body_bytes);
        }
        Err(rejection) => Err(TransportAbort::new(rejection.body_text())),
    };

    let delivery = WebhookDelivery {
        event_kind: header(&headers, EVENT_HEADER),
        signature: header(&headers, SIGNATURE_HEADER),
        delivery_id: header(&headers, DELIVERY_HEADER).and_then(DeliveryId::new),
        body,
    };

    match state.orchestrator.ingest(delivery).await {
        Ok(ack) => (StatusCode::OK, Json(ack)).into_response(),
        Err(rejection) => RejectionResponse(rejection).into_response(),
    }
}

#[tracing::instrument(name = "GET /events", skip_all)]
pub async fn events(
    State(state): State<AppState>,
    params: Result<Query<EventsParams>, QueryRejection>,
) -> Response {
    let params = match params {
        Ok(Query(params)) => params,
        Err(rejection) => return invalid_query(rejection.body_text()),
    };
    let selection = match state.events.select(&params) {
        Ok(selection) => selection,
        Err(message) => return invalid_query(message),
    };

    match state.orchestrator.recent(selection).await {
        Ok(events) => ([(DEDUPLICATED_HEADER, "false")], Json(events)).into_response(),
        Err(rejection) => RejectionResponse(rejection).into_response(),
    }
}

pub async fn health(State(state): State<AppState>) -> Response {
    match state.orchestrator.stored_count().await {
        Ok(count) => Json(json!({ "status": "ok", "events": count })).into_response(),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable" })),
        )
            .into_response(),
    }
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
