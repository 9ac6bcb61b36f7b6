//! Result persistence.
//!
//! A [`ResultStore`] receives a finished [`JobBatch`] exactly once, after every resume
//! has resolved. Store failures never reach the client as errors; the batch
//! coordinator logs them and reports `job_id = null`.

pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::scoring::batch::JobBatch;
use crate::scoring::orchestrator::AnalysisResult;

pub use postgres::PgResultStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("persistence is disabled")]
    Disabled,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored row is invalid: {0}")]
    InvalidRow(String),
}

/// A persisted batch as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredJob {
    pub job_id: Uuid,
    pub jd_file_name: String,
    pub created_at: DateTime<Utc>,
    /// In upload order.
    pub results: Vec<AnalysisResult>,
}

#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Writes the job description and all results atomically, returning the new job id.
    async fn store(&self, batch: &JobBatch) -> Result<Uuid, StoreError>;

    async fn fetch(&self, job_id: Uuid) -> Result<Option<StoredJob>, StoreError>;
}

/// Used when no database is configured.
pub struct DisabledStore;

#[async_trait]
impl ResultStore for DisabledStore {
    async fn store(&self, _batch: &JobBatch) -> Result<Uuid, StoreError> {
        Err(StoreError::Disabled)
    }

    async fn fetch(&self, _job_id: Uuid) -> Result<Option<StoredJob>, StoreError> {
        Err(StoreError::Disabled)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::MemoryStore;
    use super::*;
    use crate::scoring::verdict::Verdict;

    fn batch() -> JobBatch {
        JobBatch {
            jd_file_name: "jd.pdf".to_string(),
            jd_text: Some("python".to_string()),
            results: vec![AnalysisResult {
                file_name: "cv.pdf".to_string(),
                relevance_score: 61,
                verdict: Verdict::Medium,
                missing_skills: vec!["spark".to_string()],
                feedback: "Decent.".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn test_disabled_store_rejects_everything() {
        assert!(matches!(
            DisabledStore.store(&batch()).await,
            Err(StoreError::Disabled)
        ));
        assert!(matches!(
            DisabledStore.fetch(Uuid::new_v4()).await,
            Err(StoreError::Disabled)
        ));
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::default();
        let job_id = store.store(&batch()).await.unwrap();

        let job = store.fetch(job_id).await.unwrap().unwrap();
        assert_eq!(job.job_id, job_id);
        assert_eq!(job.jd_file_name, "jd.pdf");
        assert_eq!(job.results, batch().results);
        assert_eq!(store.fetch(Uuid::new_v4()).await.unwrap(), None);
    }
}
