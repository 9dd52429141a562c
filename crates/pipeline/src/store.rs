//! The event store port.
//!
//! Backends live in the `store` crate. This module owns the trait and the
//! ordering rules every backend must honour, expressed once in
//! [`RecentQuery::select`] so in-memory backends and test doubles share them.

use std::time::Duration;

use async_trait::async_trait;

use crate::{Event, StoreError, StoredEvent, Timestamp};

/// Append-only persistence for normalized events.
///
/// Implementations must be safe for concurrent callers. No uniqueness is
/// enforced on [`Event::request_id`]: a redelivered webhook is stored again.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends `event` and returns it with its assigned record id.
    ///
    /// Never drops an event silently: either the record is stored or an error
    /// is returned.
    async fn insert(&self, event: Event) -> Result<StoredEvent, StoreError>;

    /// Returns the events selected by `query`, ordered as [`RecentQuery`] describes.
    async fn query_recent(&self, query: RecentQuery) -> Result<Vec<StoredEvent>, StoreError>;

    /// Total number of stored records.
    async fn count(&self) -> Result<u64, StoreError>;
}

/// Selection of recent events relative to `now`.
///
/// - With a `window`, only events with `timestamp >= now - window` qualify.
/// - Without a `limit`, results are chronological (oldest first), ties in
///   insertion order.
/// - With a `limit`, at most that many of the most recent qualifying events
///   are returned, newest first, ties latest-inserted first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecentQuery {
    pub now: Timestamp,
    pub window: Option<Duration>,
    pub limit: Option<usize>,
}

impl RecentQuery {
    /// The last `limit` events regardless of age, newest first.
    pub fn latest(now: Timestamp, limit: usize) -> Self {
        Self {
            now,
            window: None,
            limit: Some(limit),
        }
    }

    /// Every event in the trailing `window`, oldest first.
    pub fn within(now: Timestamp, window: Duration) -> Self {
        Self {
            now,
            window: Some(window),
            limit: None,
        }
    }

    /// Caps the result at `limit` events, switching to newest-first order.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Earliest qualifying timestamp, if a window applies.
    pub fn cutoff(&self) -> Option<Timestamp> {
        self.window.map(|window| self.now.saturating_sub(window))
    }

    /// Returns `true` if results come back newest first.
    pub fn newest_first(&self) -> bool {
        self.limit.is_some()
    }

    /// Applies this query to events given in insertion order.
    pub fn select<'a>(&self, events: impl IntoIterator<Item = &'a StoredEvent>) -> Vec<StoredEvent> {
        let cutoff = self.cutoff();
        let mut selected: Vec<StoredEvent> = events
            .into_iter()
            .filter(|stored| cutoff.map_or(true, |c| stored.event.timestamp() >= c))
            .cloned()
            .collect();

        // Stable: equal timestamps keep insertion order.
        selected.sort_by_key(|stored| stored.event.timestamp());

        if let Some(limit) = self.limit {
            selected.reverse();
            selected.truncate(limit);
        }
        selected
    }
}
