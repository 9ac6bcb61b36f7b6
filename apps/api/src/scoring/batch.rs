//! Runs the scorer over one job description and many resumes, then hands the
//! finished batch to the result store.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::scoring::orchestrator::{AnalysisResult, Document, ResumeScorer};
use crate::scoring::skills::SkillVocabulary;
use crate::scoring::verdict::Verdict;
use crate::storage::{ResultStore, StoreError};

/// One job description with the results for every uploaded resume, in upload order.
#[derive(Debug, Clone, PartialEq)]
pub struct JobBatch {
    pub jd_file_name: String,
    pub jd_text: Option<String>,
    pub results: Vec<AnalysisResult>,
}

impl JobBatch {
    /// True when nothing in the batch could be analyzed.
    pub fn is_failed(&self) -> bool {
        self.results.iter().all(|r| r.verdict == Verdict::Error)
    }
}

/// A batch plus the id it was stored under, if persistence succeeded.
#[derive(Debug, Clone)]
pub struct StoredBatch {
    pub batch: JobBatch,
    pub job_id: Option<Uuid>,
}

pub struct BatchCoordinator {
    scorer: Arc<ResumeScorer>,
    store: Arc<dyn ResultStore>,
    concurrency: usize,
}

impl BatchCoordinator {
    pub fn new(
        scorer: Arc<ResumeScorer>,
        store: Arc<dyn ResultStore>,
        concurrency: usize,
    ) -> Self {
        Self {
            scorer,
            store,
            concurrency: concurrency.max(1),
        }
    }

    pub fn scorer(&self) -> &ResumeScorer {
        &self.scorer
    }

    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Scores every resume against `jd` with at most `concurrency` analyses in
    /// flight. Never fails; an empty or all-Error batch is returned as is.
    pub async fn run_batch(
        &self,
        jd: &Document,
        resumes: &[Document],
        vocabulary: &SkillVocabulary,
    ) -> JobBatch {
        info!(
            jd_file_name = %jd.filename,
            resumes = resumes.len(),
            concurrency = self.concurrency,
            "Starting batch analysis"
        );

        // Futures are built up front so the stream holds no closure over borrowed
        // documents; otherwise the handler future is not provably `Send`.
        // `buffered` yields in input order regardless of completion order.
        let pending: Vec<_> = resumes
            .iter()
            .map(|resume| self.scorer.analyze(resume, jd, vocabulary))
            .collect();
        let results: Vec<AnalysisResult> = stream::iter(pending)
            .buffered(self.concurrency)
            .collect()
            .await;

        let batch = JobBatch {
            jd_file_name: jd.filename.clone(),
            jd_text: jd.text().map(str::to_owned),
            results,
        };

        let analyzed = batch
            .results
            .iter()
            .filter(|r| r.verdict != Verdict::Error)
            .count();
        info!(
            jd_file_name = %batch.jd_file_name,
            analyzed,
            failed = batch.results.len() - analyzed,
            "Batch analysis complete"
        );
        batch
    }

    /// Runs the batch and persists it. Failed batches are not stored.
    pub async fn run_and_store(
        &self,
        jd: &Document,
        resumes: &[Document],
        vocabulary: &SkillVocabulary,
    ) -> StoredBatch {
        let batch = self.run_batch(jd, resumes, vocabulary).await;

        if batch.is_failed() {
            warn!(
                jd_file_name = %batch.jd_file_name,
                "No resume could be analyzed; skipping persistence"
            );
            return StoredBatch {
                batch,
                job_id: None,
            };
        }

        let job_id = self.persist(&batch).await;
        StoredBatch { batch, job_id }
    }

    /// Store failures are logged and reported as `None`.
    pub async fn persist(&self, batch: &JobBatch) -> Option<Uuid> {
        match self.store.store(batch).await {
            Ok(job_id) => {
                info!(%job_id, results = batch.results.len(), "Batch stored");
                Some(job_id)
            }
            Err(StoreError::Disabled) => None,
            Err(e) => {
                error!(error = %e, jd_file_name = %batch.jd_file_name, "Failed to persist batch");
                None
            }
        }
    }
}
