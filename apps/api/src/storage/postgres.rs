use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::analysis::{AnalysisResultRow, JobDescriptionRow};
use crate::scoring::batch::JobBatch;
use crate::scoring::orchestrator::AnalysisResult;
use crate::storage::{ResultStore, StoreError, StoredJob};

const CREATE_JOB_DESCRIPTIONS: &str = r#"
    CREATE TABLE IF NOT EXISTS job_descriptions (
        id          UUID PRIMARY KEY,
        file_name   TEXT NOT NULL,
        content     TEXT,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

const CREATE_ANALYSIS_RESULTS: &str = r#"
    CREATE TABLE IF NOT EXISTS analysis_results (
        id                  UUID PRIMARY KEY,
        job_description_id  UUID NOT NULL REFERENCES job_descriptions(id) ON DELETE CASCADE,
        position            INTEGER NOT NULL,
        file_name           TEXT NOT NULL,
        relevance_score     SMALLINT NOT NULL,
        verdict             TEXT NOT NULL,
        missing_skills      TEXT[] NOT NULL DEFAULT '{}',
        feedback            TEXT NOT NULL,
        created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

/// Postgres-backed [`ResultStore`]. One job description row per batch, one
/// result row per resume, written in a single transaction.
pub struct PgResultStore {
    pool: PgPool,
}

impl PgResultStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_JOB_DESCRIPTIONS)
            .execute(&self.pool)
            .await?;
        sqlx::query(CREATE_ANALYSIS_RESULTS)
            .execute(&self.pool)
            .await?;
        info!("Result store schema ready");
        Ok(())
    }
}

#[async_trait]
impl ResultStore for PgResultStore {
    async fn store(&self, batch: &JobBatch) -> Result<Uuid, StoreError> {
        let job_id = Uuid::new_v4();
        // Dropping the transaction on any `?` below rolls it back.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO job_descriptions (id, file_name, content) VALUES ($1, $2, $3)",
        )
        .bind(job_id)
        .bind(&batch.jd_file_name)
        .bind(batch.jd_text.as_deref())
        .execute(&mut *tx)
        .await?;

        for (position, result) in batch.results.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO analysis_results
                    (id, job_description_id, position, file_name, relevance_score,
                     verdict, missing_skills, feedback)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(job_id)
            .bind(position as i32)
            .bind(&result.file_name)
            .bind(i16::from(result.relevance_score))
            .bind(result.verdict.as_str())
            .bind(&result.missing_skills)
            .bind(&result.feedback)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(%job_id, results = batch.results.len(), "Batch persisted");
        Ok(job_id)
    }

    async fn fetch(&self, job_id: Uuid) -> Result<Option<StoredJob>, StoreError> {
        let Some(jd) = sqlx::query_as::<_, JobDescriptionRow>(
            "SELECT * FROM job_descriptions WHERE id = $1",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let rows = sqlx::query_as::<_, AnalysisResultRow>(
            "SELECT * FROM analysis_results WHERE job_description_id = $1 ORDER BY position",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;

        let results = rows
            .into_iter()
            .map(AnalysisResult::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(StoredJob {
            job_id: jd.id,
            jd_file_name: jd.file_name,
            created_at: jd.created_at,
            results,
        }))
    }
}

impl TryFrom<AnalysisResultRow> for AnalysisResult {
    type Error = StoreError;

    fn try_from(row: AnalysisResultRow) -> Result<Self, Self::Error> {
        let relevance_score = u8::try_from(row.relevance_score)
            .ok()
            .filter(|score| *score <= 100)
            .ok_or_else(|| {
                StoreError::InvalidRow(format!(
                    "relevance_score {} out of range for {}",
                    row.relevance_score, row.id
                ))
            })?;
        let verdict = row.verdict.parse().map_err(StoreError::InvalidRow)?;

        Ok(AnalysisResult {
            file_name: row.file_name,
            relevance_score,
            verdict,
            missing_skills: row.missing_skills,
            feedback: row.feedback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::verdict::Verdict;
    use chrono::Utc;

    fn row(score: i16, verdict: &str) -> AnalysisResultRow {
        AnalysisResultRow {
            id: Uuid::new_v4(),
            job_description_id: Uuid::new_v4(),
            position: 0,
            file_name: "cv.pdf".to_string(),
            relevance_score: score,
            verdict: verdict.to_string(),
            missing_skills: vec!["aws".to_string(), "spark".to_string()],
            feedback: "Fine.".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_converts_to_result() {
        let result = AnalysisResult::try_from(row(82, "High")).unwrap();
        assert_eq!(result.relevance_score, 82);
        assert_eq!(result.verdict, Verdict::High);
        assert_eq!(result.missing_skills, vec!["aws", "spark"]);
    }

    #[test]
    fn test_corrupt_rows_are_rejected() {
        assert!(matches!(
            AnalysisResult::try_from(row(140, "High")),
            Err(StoreError::InvalidRow(_))
        ));
        assert!(matches!(
            AnalysisResult::try_from(row(-1, "Low")),
            Err(StoreError::InvalidRow(_))
        ));
        assert!(matches!(
            AnalysisResult::try_from(row(40, "Maybe")),
            Err(StoreError::InvalidRow(_))
        ));
    }
}
