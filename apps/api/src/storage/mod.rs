//! Persistence adapter: one document collection with "insert one" and "find all".
//!
//! `AppState` holds an `Arc<dyn ResumeStore>`: `PgResumeStore` when `DATABASE_URL`
//! is configured, `MemoryResumeStore` otherwise.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::record::{ParsedRecord, StoredRecord};

pub use memory::MemoryResumeStore;
pub use postgres::PgResumeStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("stored document {id} is malformed: {source}")]
    Malformed {
        id: Uuid,
        #[source]
        source: serde_json::Error,
    },

    #[error("record could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::Unavailable(e.to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

/// Stored records are immutable; there is no update or delete path.
#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Inserts one document and returns its store-assigned identifier.
    async fn insert_one(&self, record: &ParsedRecord) -> Result<Uuid, StoreError>;

    /// Returns every stored document in insertion order.
    async fn find_all(&self) -> Result<Vec<StoredRecord>, StoreError>;

    fn backend(&self) -> &'static str;
}
