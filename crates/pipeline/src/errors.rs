//! Error taxonomy for the ingestion pipeline and its boundary contract.
//!
//! Component errors ([`NormalizationError`], [`StoreError`]) are folded into
//! [`IngestError`] by the orchestrator. [`IngestError`] is then reduced to a
//! [`Rejection`]: the only error shape that crosses the HTTP boundary. A
//! rejection carries a stable machine-readable reason and, where it is safe to
//! expose, a detail string; store failures and signature failures never leak
//! detail.

use serde::Serialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Component errors
// ---------------------------------------------------------------------------

/// Failure to turn a parsed payload into an [`crate::Event`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    /// The event-kind header names a kind this service does not record.
    #[error("unsupported event kind '{kind}'")]
    UnsupportedEventKind {
        /// The kind as received; empty when the header was absent.
        kind: String,
    },

    /// A required field is absent, null, empty, or of the wrong JSON type.
    #[error("malformed payload: missing or invalid field '{path}'")]
    MalformedPayload {
        /// Dotted path of the offending field (e.g. `pull_request.head.ref`).
        path: String,
    },
}

/// Failure reported by an [`crate::EventStore`] backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backing storage could not be reached or refused the operation.
    #[error("event store unavailable: {0}")]
    Unavailable(String),

    /// A stored record could not be read back as a valid event.
    #[error("event store returned a corrupt record: {0}")]
    Corrupt(String),
}

// ---------------------------------------------------------------------------
// Pipeline-level errors
// ---------------------------------------------------------------------------

/// Every way a single webhook delivery can fail.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The peer closed the connection before the body was fully received.
    #[error("client disconnected: {detail}")]
    ClientDisconnected {
        /// Transport-level description of the abort.
        detail: String,
    },

    /// The signature header was absent or did not match the body.
    #[error("webhook signature verification failed")]
    Unauthorized,

    /// The body was not JSON, or a required field was missing.
    #[error("malformed payload at '{path}'")]
    MalformedPayload {
        /// Dotted path of the offending field; `$` for the document itself.
        path: String,
    },

    /// The event kind is not one this service records.
    #[error("unsupported event kind '{kind}'")]
    UnsupportedEventKind {
        /// The kind as received.
        kind: String,
    },

    /// Persisting or reading events failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<NormalizationError> for IngestError {
    fn from(err: NormalizationError) -> Self {
        match err {
            NormalizationError::UnsupportedEventKind { kind } => Self::UnsupportedEventKind { kind },
            NormalizationError::MalformedPayload { path } => Self::MalformedPayload { path },
        }
    }
}

impl IngestError {
    /// Stable machine-readable reason, suitable for logs and responses.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::ClientDisconnected { .. } => "client_disconnected",
            Self::Unauthorized => "invalid_signature",
            Self::MalformedPayload { .. } => "malformed_payload",
            Self::UnsupportedEventKind { .. } => "unsupported_event_kind",
            Self::Store(StoreError::Unavailable(_)) => "store_unavailable",
            Self::Store(StoreError::Corrupt(_)) => "store_corrupt",
        }
    }

    /// Reduces this error to what may be shown to the caller.
    pub fn to_rejection(&self) -> Rejection {
        let reason = self.reason();
        match self {
            Self::ClientDisconnected { .. } => Rejection::new(
                RejectionKind::ClientDisconnected,
                reason,
                "Client disconnected",
            ),
            Self::Unauthorized => Rejection::new(RejectionKind::Forbidden, reason, "Forbidden"),
            Self::MalformedPayload { path } => {
                Rejection::new(RejectionKind::BadRequest, reason, "Malformed payload")
                    .with_path(path.clone())
            }
            Self::UnsupportedEventKind { kind } => Rejection::new(
                RejectionKind::BadRequest,
                reason,
                format!("Unsupported event kind '{kind}'"),
            ),
            Self::Store(_) => Rejection::new(
                RejectionKind::Internal,
                reason,
                "Error processing request",
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Boundary contract
// ---------------------------------------------------------------------------

/// The class of a [`Rejection`]; each maps to one response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionKind {
    Forbidden,
    BadRequest,
    Internal,
    ClientDisconnected,
}

impl RejectionKind {
    /// The HTTP status code this kind is reported with.
    ///
    /// Client disconnects use the non-standard 499 so they are never counted
    /// as server errors.
    pub fn status_code(self) -> u16 {
        match self {
            Self::Forbidden => 403,
            Self::BadRequest => 400,
            Self::Internal => 500,
            Self::ClientDisconnected => 499,
        }
    }
}

/// A terminal, caller-visible refusal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    #[serde(skip)]
    pub kind: RejectionKind,
    /// Human-readable summary.
    pub message: String,
    /// Stable machine-readable reason.
    pub reason: &'static str,
    /// Payload path that failed normalization, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Rejection {
    pub fn new(kind: RejectionKind, reason: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            reason,
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }
}
