//! RepoWatch event store backends.
//!
//! Implements the [`pipeline::EventStore`] trait with two backends:
//!
//! - [`InMemoryEventStore`] — a locked `Vec` in process memory. For local
//!   development and tests; nothing survives a restart.
//! - [`SqliteEventStore`] — a single SQLite file in WAL mode. Each operation
//!   opens its own connection on tokio's blocking pool.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Storage engines and their failure modes live here. The
//! [`pipeline`] crate sees only [`pipeline::EventStore`] and
//! [`pipeline::StoreError`].

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryEventStore;
pub use sqlite::SqliteEventStore;

/// Which backend a deployment uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-memory store
    Memory,
    /// SQLite database at the given path
    Sqlite(std::path::PathBuf),
}

/// Opens the configured backend.
pub fn open(
    backend: &StoreBackend,
) -> Result<std::sync::Arc<dyn pipeline::EventStore>, pipeline::StoreError> {
    match backend {
        StoreBackend::Memory => Ok(std::sync::Arc::new(InMemoryEventStore::new())),
        StoreBackend::Sqlite(path) => Ok(std::sync::Arc::new(SqliteEventStore::open(path)?)),
    }
}
