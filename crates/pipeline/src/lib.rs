//! Core ingestion domain for RepoWatch.
//!
//! This crate contains the canonical event record, newtype identifiers, the
//! signature verifier, the payload normalizer, the event store port, and the
//! orchestrator that runs a webhook delivery through all of them. Infrastructure
//! crates implement [`EventStore`] and translate HTTP into [`WebhookDelivery`];
//! they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`RequestId`, `BranchName`, `RecordId`, etc.) |
//! | [`types`] | `Timestamp` and the `Clock` implementations |
//! | [`event`] | `Event`, `EventAction`, `StoredEvent` |
//! | [`signature`] | HMAC-SHA256 signing and constant-time verification |
//! | [`normalize`] | Payload → `Event` mapping for `push` and `pull_request` |
//! | [`store`] | `EventStore` trait and `RecentQuery` ordering rules |
//! | [`ingest`] | `IngestionOrchestrator` and the delivery/response types |
//! | [`errors`] | Error taxonomy and the `Rejection` boundary type |

pub mod errors;
pub mod event;
pub mod identifiers;
pub mod ingest;
pub mod normalize;
pub mod signature;
pub mod store;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{IngestError, NormalizationError, Rejection, RejectionKind, StoreError};
pub use event::{Event, EventAction, StoredEvent};
pub use identifiers::{AuthorName, BranchName, DeliveryId, RecordId, RequestId};
pub use ingest::{
    Acknowledgement, IngestStage, IngestionOrchestrator, RetrievalSelection, TransportAbort,
    WebhookDelivery,
};
pub use normalize::{branch_from_ref, normalize, EventKind};
pub use signature::{sign, verify, WebhookSecret, SIGNATURE_PREFIX};
pub use store::{EventStore, RecentQuery};
pub use types::{Clock, ManualClock, SystemClock, Timestamp};
