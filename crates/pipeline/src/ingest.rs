//! The ingestion orchestrator.
//!
//! One [`WebhookDelivery`] moves through
//! `Received → Authenticated → Parsed → Normalized → Persisted → Responded`.
//! Any stage may end the request with a [`Rejection`]; nothing is retried
//! here. Redelivery is the source host's business.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::{
    normalize, signature, Clock, DeliveryId, EventStore, IngestError, RecentQuery, RecordId,
    Rejection, StoredEvent, WebhookSecret,
};

/// Transport-level report that the body stream ended abnormally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportAbort {
    pub detail: String,
}

impl TransportAbort {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Everything the orchestrator needs from one inbound webhook request.
#[derive(Debug, Clone)]
pub struct WebhookDelivery {
    /// Value of the event-kind header, if present.
    pub event_kind: Option<String>,
    /// Value of the signature header, if present. Never logged.
    pub signature: Option<String>,
    /// Host-assigned delivery id, if present.
    pub delivery_id: Option<DeliveryId>,
    /// The raw body bytes, or the reason they could not be read.
    pub body: Result<Vec<u8>, TransportAbort>,
}

/// Progress of a delivery through the pipeline, used for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Received,
    Authenticated,
    Parsed,
    Normalized,
    Persisted,
    Responded,
}

/// Success response for an accepted delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Acknowledgement {
    pub message: &'static str,
    #[serde(skip)]
    pub record_id: RecordId,
}

/// How `GET /events` selects events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalSelection {
    /// The last `limit` events, newest first.
    Latest { limit: usize },
    /// Every event in the trailing `window`, chronological.
    Window { window: Duration },
}

/// Wires verifier, normalizer and store together.
pub struct IngestionOrchestrator {
    secret: WebhookSecret,
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
}

impl IngestionOrchestrator {
    pub fn new(secret: WebhookSecret, store: Arc<dyn EventStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            secret,
            store,
            clock,
        }
    }

    /// Processes one delivery to completion.
    #[tracing::instrument(
        name = "ingest",
        skip_all,
        fields(
            event_kind = delivery.event_kind.as_deref().unwrap_or(""),
            delivery_id = delivery.delivery_id.as_ref().map(DeliveryId::as_str).unwrap_or(""),
        )
    )]
    pub async fn ingest(&self, delivery: WebhookDelivery) -> Result<Acknowledgement, Rejection> {
        match self.run(&delivery).await {
            Ok(ack) => {
                debug!(stage = ?IngestStage::Responded, "delivery acknowledged");
                Ok(ack)
            }
            Err(err) => {
                log_failure(&err);
                Err(err.to_rejection())
            }
        }
    }

    async fn run(&self, delivery: &WebhookDelivery) -> Result<Acknowledgement, IngestError> {
        let body = delivery
            .body
            .as_ref()
            .map_err(|abort| IngestError::ClientDisconnected {
                detail: abort.detail.clone(),
            })?;
        debug!(stage = ?IngestStage::Received, bytes = body.len());

        let provided = delivery.signature.as_deref().unwrap_or("");
        if !signature::verify(body, self.secret.as_bytes(), provided) {
            return Err(IngestError::Unauthorized);
        }
        debug!(stage = ?IngestStage::Authenticated);

        let payload: Value =
            serde_json::from_slice(body).map_err(|_| IngestError::MalformedPayload {
                path: "$".to_string(),
            })?;
        debug!(stage = ?IngestStage::Parsed);

        let kind = delivery.event_kind.as_deref().unwrap_or("");
        let event = normalize(kind, &payload, self.clock.now())?;
        debug!(stage = ?IngestStage::Normalized, action = %event.action());

        let stored = self.store.insert(event).await?;
        info!(
            record_id = %stored.id,
            request_id = %stored.event.request_id(),
            action = %stored.event.action(),
            "event recorded"
        );
        debug!(stage = ?IngestStage::Persisted);

        Ok(Acknowledgement {
            message: "Webhook received",
            record_id: stored.id,
        })
    }

    /// Serves a retrieval request against the store, relative to the clock's now.
    pub async fn recent(
        &self,
        selection: RetrievalSelection,
    ) -> Result<Vec<StoredEvent>, Rejection> {
        let now = self.clock.now();
        let query = match selection {
            RetrievalSelection::Latest { limit } => RecentQuery::latest(now, limit),
            RetrievalSelection::Window { window } => RecentQuery::within(now, window),
        };
        self.store.query_recent(query).await.map_err(|err| {
            error!(error = %err, "failed to query recent events");
            IngestError::from(err).to_rejection()
        })
    }

    /// Number of stored events; used for health reporting.
    pub async fn stored_count(&self) -> Result<u64, Rejection> {
        self.store.count().await.map_err(|err| {
            error!(error = %err, "failed to count events");
            IngestError::from(err).to_rejection()
        })
    }
}

fn log_failure(err: &IngestError) {
    let reason = err.reason();
    match err {
        IngestError::ClientDisconnected { detail } => {
            warn!(reason, detail = %detail, "client disconnected mid-request");
        }
        IngestError::Unauthorized => warn!(reason, "rejected delivery with bad signature"),
        IngestError::MalformedPayload { path } => {
            warn!(reason, path = %path, "rejected malformed payload");
        }
        IngestError::UnsupportedEventKind { kind } => {
            warn!(reason, kind = %kind, "rejected unsupported event kind");
        }
        IngestError::Store(store_err) => {
            error!(reason, error = %store_err, "failed to persist event");
        }
    }
}
