use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{ResumeStore, StoreError};
use crate::models::record::{ParsedRecord, StoredRecord};

/// Document collection backed by a `json` column. Identifiers are assigned by Postgres.
#[derive(Clone)]
pub struct PgResumeStore {
    pool: PgPool,
}

impl PgResumeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    async fn insert_one(&self, record: &ParsedRecord) -> Result<Uuid, StoreError> {
        // Sent as text into a `json` column so field order survives the round trip.
        let document = serde_json::to_string(record).map_err(StoreError::Encode)?;
        let id: Uuid =
            sqlx::query_scalar("INSERT INTO resumes (document) VALUES ($1::json) RETURNING id")
                .bind(document)
                .fetch_one(&self.pool)
                .await?;
        Ok(id)
    }

    async fn find_all(&self) -> Result<Vec<StoredRecord>, StoreError> {
        let rows: Vec<(Uuid, String)> = sqlx::query_as(
            "SELECT id, document::text FROM resumes ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, document)| {
                serde_json::from_str::<ParsedRecord>(&document)
                    .map(|record| StoredRecord { id, record })
                    .map_err(|source| StoreError::Malformed { id, source })
            })
            .collect()
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
