//! Job and generation-result data types (§3 Job / Generation Result),
//! plus the stream event schema (§6.3) the Stream Hub fans out.

use chrono::{DateTime, Utc};
use docforge_core::{CommitMode, Error, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A job's lifecycle state (§4.6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

/// Everything needed to create a job, gathered by the REST surface from
/// the request body plus the principal's resolved LLM credential.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub document_id: String,
    pub section_ids: Vec<String>,
    pub mode: CommitMode,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub knowledge_collection_ids: Vec<String>,
    pub empty_only: bool,
    pub subscriber_id: Option<String>,
    pub base_url: String,
    pub api_key: String,
    pub master_template: String,
}

impl JobSpec {
    /// Validates the invariants on sampling parameters and targets (§3).
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::Validation(
                "temperature must be within [0, 2]".to_string(),
            ));
        }
        if !(100..=100_000).contains(&self.max_tokens) {
            return Err(Error::Validation(
                "max_tokens must be within [100, 100000]".to_string(),
            ));
        }
        if self.section_ids.is_empty() {
            return Err(Error::Validation(
                "at least one target section is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-section outcome of a generation attempt (§3 Generation Result).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub section_id: String,
    pub section_title: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A read-only view of a job's current state, returned by status queries
/// and embedded in every stream event (§6.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub task_id: Uuid,
    pub document_id: String,
    pub status: JobStatus,
    pub mode: CommitMode,
    pub cursor: usize,
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub results: Vec<GenerationResult>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// The scheduler's mutable record for one job. Lives behind a per-job
/// `Mutex` inside [`crate::scheduler::JobScheduler`]; never exposed
/// directly outside the crate, only as a [`JobSnapshot`].
pub(crate) struct JobState {
    pub id: Uuid,
    pub document_id: String,
    pub targets: Vec<String>,
    pub mode: CommitMode,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub knowledge_collection_ids: Vec<String>,
    pub subscriber_id: Option<String>,
    pub base_url: String,
    pub api_key: String,
    pub master_template: String,
    pub status: JobStatus,
    pub cursor: usize,
    pub completed: usize,
    pub failed: usize,
    pub results: Vec<GenerationResult>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl JobState {
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            task_id: self.id,
            document_id: self.document_id.clone(),
            status: self.status,
            mode: self.mode,
            cursor: self.cursor,
            total: self.targets.len(),
            completed: self.completed,
            failed: self.failed,
            results: self.results.clone(),
            started_at: self.started_at,
            ended_at: self.ended_at,
            error: self.error.clone(),
        }
    }
}

/// Stream event schema (§6.3): a discriminated union carrying the job
/// snapshot and, for per-section events, the section payload.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    #[serde(rename = "job_started")]
    JobStarted { job: JobSnapshot },
    #[serde(rename = "section_started")]
    SectionStarted { job: JobSnapshot, section_id: String },
    #[serde(rename = "section_completed")]
    SectionCompleted {
        job: JobSnapshot,
        result: GenerationResult,
    },
    #[serde(rename = "section_failed")]
    SectionFailed {
        job: JobSnapshot,
        result: GenerationResult,
    },
    #[serde(rename = "job_paused")]
    JobPaused { job: JobSnapshot },
    #[serde(rename = "job_resumed")]
    JobResumed { job: JobSnapshot },
    #[serde(rename = "job_cancelled")]
    JobCancelled { job: JobSnapshot },
    #[serde(rename = "job_completed")]
    JobCompleted { job: JobSnapshot },
    #[serde(rename = "job_failed")]
    JobFailed { job: JobSnapshot },
}
