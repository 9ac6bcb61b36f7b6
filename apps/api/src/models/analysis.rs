use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobDescriptionRow {
    pub id: Uuid,
    pub file_name: String,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnalysisResultRow {
    pub id: Uuid,
    pub job_description_id: Uuid,
    /// Index of the resume within its batch; preserves upload order on read.
    pub position: i32,
    pub file_name: String,
    pub relevance_score: i16,
    pub verdict: String,
    pub missing_skills: Vec<String>,
    pub feedback: String,
    pub created_at: DateTime<Utc>,
}
