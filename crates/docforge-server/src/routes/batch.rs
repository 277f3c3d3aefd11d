//! `/batch/*` (§6.1): create, start, pause, resume, cancel, and inspect
//! batch generation jobs via the Job Scheduler.

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use docforge_core::{CommitMode, Error};
use docforge_jobs::{JobSnapshot, JobSpec};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct StartBatchRequest {
    pub document_id: String,
    pub section_ids: Vec<String>,
    pub mode: CommitMode,
    #[serde(default)]
    pub empty_only: bool,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub knowledge_collection_ids: Vec<String>,
    pub subscriber_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartBatchResponse {
    pub job_id: uuid::Uuid,
}

pub async fn start(
    State(state): State<AppState>,
    AuthUser(principal_id): AuthUser,
    Json(body): Json<StartBatchRequest>,
) -> Result<Json<StartBatchResponse>, ApiError> {
    let credential = state.credentials.get(&principal_id);
    let base_url = credential
        .as_ref()
        .and_then(|c| c.base_url.clone())
        .unwrap_or_else(|| state.config.llm_base_url.clone());
    let api_key = credential
        .map(|c| c.api_key)
        .or_else(|| state.config.llm_api_key.clone())
        .unwrap_or_default();
    let settings = state.settings.get(&principal_id);

    let spec = JobSpec {
        document_id: body.document_id,
        section_ids: body.section_ids,
        mode: body.mode,
        model: body.model.unwrap_or(settings.model),
        temperature: body.temperature.unwrap_or(settings.temperature),
        max_tokens: body.max_tokens.unwrap_or(settings.max_tokens),
        knowledge_collection_ids: body.knowledge_collection_ids,
        empty_only: body.empty_only,
        subscriber_id: body.subscriber_id,
        base_url,
        api_key,
        master_template: docforge_llm::DEFAULT_MASTER_TEMPLATE.to_string(),
    };

    let job_id = state.scheduler.create(spec)?;
    state.scheduler.start(job_id)?;
    Ok(Json(StartBatchResponse { job_id }))
}

fn parse_job_id(job: &str) -> Result<uuid::Uuid, ApiError> {
    job.parse()
        .map_err(|_| Error::Validation(format!("invalid job id {job}")).into())
}

pub async fn status(
    State(state): State<AppState>,
    AuthUser(_principal_id): AuthUser,
    Path(job): Path<String>,
) -> Result<Json<JobSnapshot>, ApiError> {
    let job_id = parse_job_id(&job)?;
    Ok(Json(state.scheduler.status(job_id)?))
}

pub async fn pause(
    State(state): State<AppState>,
    AuthUser(_principal_id): AuthUser,
    Path(job): Path<String>,
) -> Result<(), ApiError> {
    let job_id = parse_job_id(&job)?;
    state.scheduler.pause(job_id)?;
    Ok(())
}

pub async fn resume(
    State(state): State<AppState>,
    AuthUser(_principal_id): AuthUser,
    Path(job): Path<String>,
) -> Result<(), ApiError> {
    let job_id = parse_job_id(&job)?;
    state.scheduler.resume(job_id)?;
    Ok(())
}

pub async fn cancel(
    State(state): State<AppState>,
    AuthUser(_principal_id): AuthUser,
    Path(job): Path<String>,
) -> Result<(), ApiError> {
    let job_id = parse_job_id(&job)?;
    state.scheduler.cancel(job_id)?;
    Ok(())
}
