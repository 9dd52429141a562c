//! In-memory event store.
//!
//! Used for local development and tests. Contents are lost on restart.

use async_trait::async_trait;
use parking_lot::RwLock;
use pipeline::{Event, EventStore, RecentQuery, RecordId, StoreError, StoredEvent};

/// Append-only event log held in process memory.
///
/// Records are kept in insertion order; the lock is held only for the length
/// of a push or a scan.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: RwLock<Vec<StoredEvent>>,
}

impl InMemoryEventStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn insert(&self, event: Event) -> Result<StoredEvent, StoreError> {
        let stored = StoredEvent::new(RecordId::new_random(), event);
        self.events.write().push(stored.clone());
        tracing::debug!(record_id = %stored.id, "stored event in memory");
        Ok(stored)
    }

    async fn query_recent(&self, query: RecentQuery) -> Result<Vec<StoredEvent>, StoreError> {
        let events = self.events.read();
        Ok(query.select(events.iter()))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.events.read().len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::{AuthorName, BranchName, RequestId, Timestamp};
    use std::sync::Arc;
    use std::time::Duration;

    fn push(request_id: &str, at: i64) -> Event {
        Event::push(
            RequestId::new(request_id).unwrap(),
            AuthorName::new("octocat").unwrap(),
            BranchName::new("main").unwrap(),
            Timestamp::from_unix_seconds(at),
        )
    }

    #[tokio::test]
    async fn duplicates_are_kept() {
        let store = InMemoryEventStore::new();
        let first = store.insert(push("abc", 1)).await.unwrap();
        let second = store.insert(push("abc", 1)).await.unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn windowed_query_is_chronological() {
        let store = InMemoryEventStore::new();
        let now = 1_000;
        for (id, at) in [("t-1", now - 1), ("t-20", now - 20), ("t-10", now - 10)] {
            store.insert(push(id, at)).await.unwrap();
        }

        let events = store
            .query_recent(RecentQuery::within(
                Timestamp::from_unix_seconds(now),
                Duration::from_secs(15),
            ))
            .await
            .unwrap();
        let ids: Vec<_> = events.iter().map(|e| e.event.request_id().as_str()).collect();
        assert_eq!(ids, ["t-10", "t-1"]);
    }

    #[tokio::test]
    async fn concurrent_inserts_are_all_recorded() {
        let store = Arc::new(InMemoryEventStore::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.insert(push(&format!("c{i}"), i)).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.count().await.unwrap(), 32);
    }
}
