//! RepoWatch HTTP boundary.
//!
//! Receives GitHub webhook deliveries and serves the recorded activity. The
//! handlers only move bytes and headers into a [`pipeline::WebhookDelivery`]
//! and turn [`pipeline::Rejection`]s back into responses; every decision is
//! made by [`pipeline::IngestionOrchestrator`].
//!
//! ## Routes
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /webhook` | Signed delivery intake (`X-Hub-Signature-256`, `X-GitHub-Event`) |
//! | `GET /events` | Recent events in the deployment's [`RetrievalMode`] |
//! | `GET /health` | Store reachability and record count |
//! | `GET /` | Landing page polling `/events` |
//!
//! `/events` does not deduplicate: a redelivered webhook appears twice. Every
//! successful `/events` response carries `X-Events-Deduplicated: false` to
//! say so.
//!
//! ## Client disconnects
//!
//! A peer that aborts while the body is still streaming surfaces as a body
//! read error from hyper. That is reported to the orchestrator as a
//! [`pipeline::TransportAbort`] and answered with status 499.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Transport details live here. The [`pipeline`] crate
//! sees only [`pipeline::WebhookDelivery`].

pub mod handlers;
pub mod response;
pub mod router;
pub mod state;

pub use handlers::{DEDUPLICATED_HEADER, DELIVERY_HEADER, EVENT_HEADER, SIGNATURE_HEADER};
pub use response::RejectionResponse;
pub use router::{build_router, serve, ListenerError};
pub use state::{AppState, EventsParams, EventsSettings, RetrievalMode};
