//! Document store capability
//!
//! The core only needs collection-scoped CRUD plus an equality query. Two
//! implementations ship with the crate: [`PostgrestStore`] for the hosted
//! backend and [`MemoryStore`] for tests and local development.

mod memory;
mod postgrest;

pub use memory::MemoryStore;
pub use postgrest::PostgrestStore;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Name of the write timestamp every store assigns
pub const UPDATED_AT: &str = "updatedAt";

/// A stored document and the id the store assigned to it
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

/// Collection-scoped CRUD. Writes are independent and unversioned: the last one wins.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts `record` under a fresh id and stamps `updatedAt`.
    async fn create(&self, collection: &str, record: Value) -> Result<Document>;

    /// Writes `record` under a caller-chosen id, replacing what was there.
    async fn set(&self, collection: &str, id: &str, record: Value) -> Result<()>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Documents whose `field` equals `value`.
    async fn query(&self, collection: &str, field: &str, value: &str) -> Result<Vec<Document>>;

    /// Merges the top-level keys of `patch` and stamps `updatedAt`.
    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<()>;

    async fn delete(&self, collection: &str, id: &str) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::PlannerError;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Wraps a [`MemoryStore`], counting writes and optionally failing them.
    #[derive(Default)]
    pub struct RecordingStore {
        pub inner: MemoryStore,
        pub fail_writes: AtomicBool,
        pub writes: AtomicUsize,
    }

    impl RecordingStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_writes(&self, value: bool) {
            self.fail_writes.store(value, Ordering::SeqCst);
        }

        pub fn write_count(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        fn write(&self) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(PlannerError::store("write rejected"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl DocumentStore for RecordingStore {
        async fn create(&self, collection: &str, record: Value) -> Result<Document> {
            self.write()?;
            self.inner.create(collection, record).await
        }

        async fn set(&self, collection: &str, id: &str, record: Value) -> Result<()> {
            self.write()?;
            self.inner.set(collection, id, record).await
        }

        async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
            self.inner.get(collection, id).await
        }

        async fn query(&self, collection: &str, field: &str, value: &str) -> Result<Vec<Document>> {
            self.inner.query(collection, field, value).await
        }

        async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<()> {
            self.write()?;
            self.inner.update(collection, id, patch).await
        }

        async fn delete(&self, collection: &str, id: &str) -> Result<()> {
            self.write()?;
            self.inner.delete(collection, id).await
        }
    }
}
