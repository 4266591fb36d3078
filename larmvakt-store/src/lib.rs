//! # Larmvakt Alert Store
//!
//! Shared, append-friendly persistent collection of alert records.
//! Concurrent writers (one per detector) interleave only at record
//! granularity; readers (aggregator, exporter) never observe a record
//! whose write has not fully completed. Queries are restartable: every
//! call re-reads the store rather than resuming a prior cursor.

pub mod document;
pub mod error;
pub mod memory;
pub mod snapshot;
pub mod store;

pub use document::DocumentStore;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use snapshot::Snapshot;
pub use store::AlertStore;
