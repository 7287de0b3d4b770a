use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{ResumeStore, StoreError};
use crate::models::record::{ParsedRecord, StoredRecord};

/// Process-local collection. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryResumeStore {
    records: Mutex<Vec<StoredRecord>>,
}

impl MemoryResumeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResumeStore for MemoryResumeStore {
    async fn insert_one(&self, record: &ParsedRecord) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        self.records.lock().await.push(StoredRecord {
            id,
            record: record.clone(),
        });
        Ok(id)
    }

    async fn find_all(&self) -> Result<Vec<StoredRecord>, StoreError> {
        Ok(self.records.lock().await.clone())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
