use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::session::SessionBatch;
use crate::storage::{ResumeStore, StoreError};

#[derive(Debug)]
pub struct SaveReport {
    pub ids: Vec<Uuid>,
}

impl SaveReport {
    pub fn saved(&self) -> usize {
        self.ids.len()
    }
}

/// A failed batch save. The first `saved` records stay persisted; nothing is rolled back.
#[derive(Debug, Error)]
#[error("saved {saved} of {total} resume(s) before the store failed: {source}")]
pub struct SaveError {
    pub saved: usize,
    pub total: usize,
    #[source]
    pub source: StoreError,
}

/// Inserts every batch entry as its own document, in batch order, with the
/// originating file name attached under `resume_file`. Stops at the first failure.
pub async fn save_batch(
    store: &dyn ResumeStore,
    batch: &SessionBatch,
) -> Result<SaveReport, SaveError> {
    let total = batch.entries.len();
    let mut ids = Vec::with_capacity(total);

    for entry in &batch.entries {
        let document = entry.record.with_source_file(&entry.file_name);
        match store.insert_one(&document).await {
            Ok(id) => ids.push(id),
            Err(source) => {
                error!(
                    "Insert of {} failed after {} of {total} saved: {source}",
                    entry.file_name,
                    ids.len()
                );
                return Err(SaveError {
                    saved: ids.len(),
                    total,
                    source,
                });
            }
        }
    }

    info!("Saved {} resume(s) to the {} store", ids.len(), store.backend());
    Ok(SaveReport { ids })
}
