use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use bytes::Bytes;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::extract_document;
use crate::scoring::orchestrator::{AnalysisResult, Document};
use crate::scoring::verdict::Verdict;
use crate::state::AppState;
use crate::storage::{StoreError, StoredJob};

const JD_FIELD: &str = "job_description";

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchAnalysisResponse {
    /// `None` when persistence is disabled or failed.
    pub job_id: Option<Uuid>,
    pub jd_file_name: String,
    pub total_analyzed: usize,
    pub results: Vec<AnalysisResult>,
}

struct UploadedFile {
    filename: String,
    bytes: Bytes,
}

#[derive(Default)]
struct AnalysisUpload {
    job_description: Option<UploadedFile>,
    resumes: Vec<UploadedFile>,
}

/// Collects the job description and resume files from a multipart form.
/// Resumes may be sent under `resumes` or `resume`; other fields are ignored.
async fn read_upload(mut multipart: Multipart) -> Result<AnalysisUpload, AppError> {
    let mut upload = AnalysisUpload::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let filename = field
            .file_name()
            .map(str::to_owned)
            .unwrap_or_else(|| name.clone());

        match name.as_str() {
            JD_FIELD => {
                if upload.job_description.is_some() {
                    return Err(AppError::Validation(
                        "Only one job_description file may be uploaded".to_string(),
                    ));
                }
                let bytes = field.bytes().await?;
                upload.job_description = Some(UploadedFile { filename, bytes });
            }
            "resumes" | "resume" => {
                let bytes = field.bytes().await?;
                upload.resumes.push(UploadedFile { filename, bytes });
            }
            other => debug!(field = other, "Ignoring unknown multipart field"),
        }
    }

    Ok(upload)
}

/// Extracts the job description and every resume, all on the blocking pool.
async fn extract_all(
    state: &AppState,
    jd: UploadedFile,
    resumes: Vec<UploadedFile>,
) -> (Document, Vec<Document>) {
    let jd = extract_document(state.text_source.clone(), jd.filename, jd.bytes);
    let resumes = join_all(
        resumes
            .into_iter()
            .map(|f| extract_document(state.text_source.clone(), f.filename, f.bytes)),
    );
    futures::join!(jd, resumes)
}

fn require_job_description(upload: &mut AnalysisUpload) -> Result<UploadedFile, AppError> {
    upload
        .job_description
        .take()
        .ok_or_else(|| AppError::Validation("A job_description file is required".to_string()))
}

/// POST /api/v1/analyze/batch
pub async fn handle_analyze_batch(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<BatchAnalysisResponse>, AppError> {
    let mut upload = read_upload(multipart).await?;
    let jd_file = require_job_description(&mut upload)?;
    if upload.resumes.is_empty() {
        return Err(AppError::Validation(
            "At least one resume file is required".to_string(),
        ));
    }

    let (jd, resumes) = extract_all(&state, jd_file, upload.resumes).await;
    let stored = state
        .coordinator
        .run_and_store(&jd, &resumes, &state.config.vocabulary)
        .await;

    if stored.batch.is_failed() {
        return Err(AppError::Validation(
            "No resumes could be analyzed.".to_string(),
        ));
    }

    Ok(Json(BatchAnalysisResponse {
        job_id: stored.job_id,
        jd_file_name: stored.batch.jd_file_name,
        total_analyzed: stored.batch.results.len(),
        results: stored.batch.results,
    }))
}

/// POST /api/v1/analyze/resume
///
/// Scores a single resume without persisting it.
pub async fn handle_analyze_resume(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisResult>, AppError> {
    let mut upload = read_upload(multipart).await?;
    let jd_file = require_job_description(&mut upload)?;
    if upload.resumes.len() != 1 {
        return Err(AppError::Validation(
            "Exactly one resume file is required".to_string(),
        ));
    }

    let (jd, mut resumes) = extract_all(&state, jd_file, upload.resumes).await;
    let resume = resumes.remove(0);

    if jd.text().is_none() {
        return Err(AppError::Validation(format!(
            "Could not parse the job description file: {}",
            jd.filename
        )));
    }

    let result = state
        .coordinator
        .scorer()
        .analyze(&resume, &jd, &state.config.vocabulary)
        .await;

    if result.verdict == Verdict::Error {
        return Err(AppError::Validation(format!(
            "Could not parse the resume file: {}",
            resume.filename
        )));
    }

    Ok(Json(result))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<StoredJob>, AppError> {
    match state.store().fetch(job_id).await {
        Ok(Some(job)) => Ok(Json(job)),
        Ok(None) => Err(AppError::NotFound(format!("Job {job_id} not found"))),
        Err(StoreError::Disabled) => Err(AppError::NotFound(
            "Result persistence is not configured".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}
