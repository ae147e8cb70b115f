use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::ingest::parse_job_description;
use crate::models::{CandidateRecord, JobDescription};
use crate::pipeline::{RunSummary, ScreeningRun};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScreeningRequest {
    pub job_description: JobDescription,
    pub candidates: Vec<CandidateRecord>,
}

#[derive(Serialize)]
pub struct ScreeningResponse {
    #[serde(flatten)]
    pub run: ScreeningRun,
    pub summary: RunSummary,
    /// Input indices of scored candidates, best first.
    pub ranking: Vec<usize>,
}

/// POST /api/v1/screenings
pub async fn handle_create_screening(
    State(state): State<AppState>,
    Json(req): Json<ScreeningRequest>,
) -> Result<Json<ScreeningResponse>, AppError> {
    if req.job_description.text.trim().is_empty() {
        return Err(AppError::Validation("job_description.text must not be empty".to_string()));
    }
    if req.candidates.is_empty() {
        return Err(AppError::Validation("candidates must not be empty".to_string()));
    }

    let job = state
        .pipeline
        .services()
        .prepare_job(with_parsed_sections(req.job_description))
        .await;
    let run = state.pipeline.run(req.candidates, job).await;

    let summary = run.summary();
    let ranking = run.ranked().iter().map(|o| o.index).collect();
    Ok(Json(ScreeningResponse { run, summary, ranking }))
}

/// Text-only job descriptions get the same section parse as JD files.
fn with_parsed_sections(job: JobDescription) -> JobDescription {
    let has_structure = job.title.is_some()
        || !job.required_skills.is_empty()
        || !job.requirements.is_empty()
        || !job.responsibilities.is_empty();
    if has_structure {
        job
    } else {
        parse_job_description(&job.text)
    }
}
