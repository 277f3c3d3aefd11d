//! # docforge-jobs
//!
//! Batch generation orchestration for docforge: the Job Scheduler (C6),
//! Commit Engine (C7), and Stream Hub (C8).
//!
//! A job walks its target sections strictly in order, one in flight at a
//! time, generating via `docforge-llm` and persisting via the Commit
//! Engine; the Stream Hub fans out progress events to whichever
//! WebSocket client subscribed to the job (§4.6, §4.7, §4.8).

/// Commit Engine (C7).
pub mod commit;
/// Job Scheduler (C6).
pub mod scheduler;
/// Stream Hub (C8).
pub mod stream;
/// Job, generation-result, and stream-event types (§3, §6.3).
pub mod types;

pub use commit::{CommitEngine, CommitOutcome};
pub use scheduler::JobScheduler;
pub use stream::StreamHub;
pub use types::{GenerationResult, JobSnapshot, JobSpec, JobStatus, StreamEvent};
