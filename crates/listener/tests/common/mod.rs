#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use listener::{build_router, AppState, EventsSettings, EVENT_HEADER, SIGNATURE_HEADER};
use pipeline::{
    sign, Event, EventStore, IngestionOrchestrator, ManualClock, RecentQuery, StoreError,
    StoredEvent, Timestamp, WebhookSecret,
};
use serde_json::{json, Value};
use store::InMemoryEventStore;
use tower::ServiceExt;

pub const SECRET: &str = "It's a Secret to Everybody";
pub const NOW: i64 = 1_700_000_000;

pub struct TestApp {
    pub router: Router,
    pub clock: Arc<ManualClock>,
}

pub fn app(settings: EventsSettings) -> TestApp {
    app_with_store(settings, Arc::new(InMemoryEventStore::new()))
}

pub fn app_with_store(settings: EventsSettings, store: Arc<dyn EventStore>) -> TestApp {
    app_with_state(store, |orchestrator| AppState::new(orchestrator, settings))
}

pub fn app_with_state(
    store: Arc<dyn EventStore>,
    state: impl FnOnce(Arc<IngestionOrchestrator>) -> AppState,
) -> TestApp {
    let clock = Arc::new(ManualClock::new(Timestamp::from_unix_seconds(NOW)));
    let orchestrator = Arc::new(IngestionOrchestrator::new(
        WebhookSecret::new(SECRET).expect("secret"),
        store,
        clock.clone(),
    ));
    TestApp {
        router: build_router(state(orchestrator)),
        clock,
    }
}

/// A store whose every operation fails as if the database were down.
pub struct DownStore;

#[async_trait]
impl EventStore for DownStore {
    async fn insert(&self, _event: Event) -> Result<StoredEvent, StoreError> {
        Err(StoreError::Unavailable("connection refused (10.0.0.7:27017)".into()))
    }

    async fn query_recent(&self, _query: RecentQuery) -> Result<Vec<StoredEvent>, StoreError> {
        Err(StoreError::Unavailable("connection refused (10.0.0.7:27017)".into()))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Err(StoreError::Unavailable("connection refused (10.0.0.7:27017)".into()))
    }
}

pub fn push_payload(commit: &str) -> Value {
    json!({
        "ref": "refs/heads/main",
        "before": "0000000000000000000000000000000000000000",
        "after": commit,
        "head_commit": { "id": commit, "message": "Update README.md" },
        "pusher": { "name": "octocat", "email": "octocat@github.com" },
        "repository": { "full_name": "octo-org/hello-world" }
    })
}

pub fn pull_request_payload(action: &str) -> Value {
    json!({
        "action": action,
        "number": 7,
        "pull_request": {
            "id": 1_296_269,
            "user": { "login": "hubot" },
            "head": { "ref": "feature/login" },
            "base": { "ref": "main" }
        }
    })
}

pub fn signed_webhook(kind: &str, payload: &Value) -> Request<Body> {
    let body = serde_json::to_vec(payload).expect("payload");
    let signature = sign(&body, SECRET.as_bytes());
    webhook_request(kind, Some(&signature), body)
}

pub fn webhook_request(kind: &str, signature: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .header(EVENT_HEADER, kind)
        .header("x-github-delivery", "72d3162e-cc78-11e3-81ab-4c9367dc0958");
    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }
    builder.body(Body::from(body)).expect("request")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub async fn call(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.expect("router call")
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub async fn fetch_events(router: &Router, uri: &str) -> Vec<Value> {
    let response = call(router, get(uri)).await;
    assert_eq!(response.status(), StatusCode::OK);
    match json_body(response).await {
        Value::Array(events) => events,
        other => panic!("expected array, got {other}"),
    }
}
