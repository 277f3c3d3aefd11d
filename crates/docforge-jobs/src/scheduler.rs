//! Job Scheduler (C6): creates, runs, pauses, resumes, and cancels
//! generation jobs, one cooperative task per job, sections strictly in
//! order within a job (§4.6).
//!
//! Jobs are independent of each other; only the `SectionStore` and
//! `CommitEngine` they share serialize writes to a given document.
//! Pause and cancel are observed only at section boundaries, never
//! mid-request (§4.6, §5) — a running job's loop checks both flags
//! before starting the next section and again right after the previous
//! one finishes, so a pause/cancel requested during an LLM call takes
//! effect as soon as that call returns, not before.
//!
//! Parent-content propagation (§4.6 step 2: prefer a result produced
//! earlier in this job over on-disk content) falls out of the Commit
//! Engine's contract rather than needing a separate job-local cache:
//! every commit reloads the Section Store's tree before returning, so
//! the next section's fresh `store.tree(document_id)` lookup already
//! reflects the parent's just-generated content.

use crate::commit::CommitEngine;
use crate::stream::StreamHub;
use crate::types::{GenerationResult, JobSnapshot, JobSpec, JobState, JobStatus, StreamEvent};
use chrono::Utc;
use docforge_core::store::SectionStore;
use docforge_core::{Error, Result};
use docforge_llm::{build_prompt, CompletionRequest, LlmClient, PromptInput};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

struct JobControl {
    pause_requested: AtomicBool,
    cancel_requested: AtomicBool,
}

/// Drives batch and single-section generation jobs against a shared
/// [`SectionStore`], [`CommitEngine`], and [`LlmClient`] (§4.6).
pub struct JobScheduler {
    store: Arc<SectionStore>,
    commit: Arc<CommitEngine>,
    llm: Arc<LlmClient>,
    hub: Arc<StreamHub>,
    inter_section_delay: Duration,
    jobs: RwLock<HashMap<Uuid, Arc<Mutex<JobState>>>>,
    controls: RwLock<HashMap<Uuid, Arc<JobControl>>>,
}

impl JobScheduler {
    #[must_use]
    pub fn new(
        store: Arc<SectionStore>,
        commit: Arc<CommitEngine>,
        llm: Arc<LlmClient>,
        hub: Arc<StreamHub>,
    ) -> Self {
        Self::with_inter_section_delay(store, commit, llm, hub, Duration::from_millis(500))
    }

    /// As [`Self::new`], but with an overridden inter-section delay —
    /// used by tests so pause/resume/cancel scenarios don't take
    /// wall-clock seconds per section (§4.6 step 6).
    #[must_use]
    pub fn with_inter_section_delay(
        store: Arc<SectionStore>,
        commit: Arc<CommitEngine>,
        llm: Arc<LlmClient>,
        hub: Arc<StreamHub>,
        inter_section_delay: Duration,
    ) -> Self {
        Self {
            store,
            commit,
            llm,
            hub,
            inter_section_delay,
            jobs: RwLock::new(HashMap::new()),
            controls: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a `PENDING` job, resolving `empty_only` filtering against
    /// the current tree at creation time (§4.6 Filtering).
    pub fn create(&self, spec: JobSpec) -> Result<Uuid> {
        spec.validate()?;
        let tree = self.store.tree(&spec.document_id)?;

        let targets: Vec<String> = if spec.empty_only {
            spec.section_ids
                .iter()
                .filter(|id| {
                    tree.find_by_id(id)
                        .is_some_and(docforge_core::Section::is_empty_content)
                })
                .cloned()
                .collect()
        } else {
            for id in &spec.section_ids {
                if tree.find_by_id(id).is_none() {
                    return Err(Error::NotFound(format!("section {id}")));
                }
            }
            spec.section_ids.clone()
        };

        let id = Uuid::new_v4();
        let state = JobState {
            id,
            document_id: spec.document_id,
            targets,
            mode: spec.mode,
            model: spec.model,
            temperature: spec.temperature,
            max_tokens: spec.max_tokens,
            knowledge_collection_ids: spec.knowledge_collection_ids,
            subscriber_id: spec.subscriber_id,
            base_url: spec.base_url,
            api_key: spec.api_key,
            master_template: spec.master_template,
            status: JobStatus::Pending,
            cursor: 0,
            completed: 0,
            failed: 0,
            results: Vec::new(),
            started_at: None,
            ended_at: None,
            error: None,
        };

        self.jobs
            .write()
            .expect("job map poisoned")
            .insert(id, Arc::new(Mutex::new(state)));
        self.controls.write().expect("control map poisoned").insert(
            id,
            Arc::new(JobControl {
                pause_requested: AtomicBool::new(false),
                cancel_requested: AtomicBool::new(false),
            }),
        );
        Ok(id)
    }

    /// Starts a `PENDING` job, spawning its scheduler loop.
    pub fn start(self: &Arc<Self>, job_id: Uuid) -> Result<()> {
        let job_arc = self.job(job_id)?;
        {
            let mut job = job_arc.lock().expect("job lock poisoned");
            if job.status != JobStatus::Pending {
                return Err(Error::InvalidTransition(format!(
                    "start is only valid from PENDING, job is {:?}",
                    job.status
                )));
            }
            job.status = JobStatus::Running;
            job.started_at = Some(Utc::now());
        }
        self.emit(job_id, StreamEvent::JobStarted {
            job: self.snapshot_unchecked(job_id),
        });
        let scheduler = Arc::clone(self);
        tokio::spawn(async move { scheduler.run(job_id).await });
        Ok(())
    }

    /// Requests a pause; only valid from `RUNNING` (§4.6). Takes effect
    /// at the next section boundary.
    pub fn pause(&self, job_id: Uuid) -> Result<()> {
        let job_arc = self.job(job_id)?;
        {
            let job = job_arc.lock().expect("job lock poisoned");
            if job.status != JobStatus::Running {
                return Err(Error::InvalidTransition(
                    "pause is only valid from RUNNING".to_string(),
                ));
            }
        }
        self.control(job_id)?
            .pause_requested
            .store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Requests a resume; only valid from `PAUSED` (§4.6). Re-enters the
    /// loop at the saved cursor.
    pub fn resume(self: &Arc<Self>, job_id: Uuid) -> Result<()> {
        {
            let job_arc = self.job(job_id)?;
            let mut job = job_arc.lock().expect("job lock poisoned");
            if job.status != JobStatus::Paused {
                return Err(Error::InvalidTransition(
                    "resume is only valid from PAUSED".to_string(),
                ));
            }
            job.status = JobStatus::Running;
        }
        self.control(job_id)?
            .pause_requested
            .store(false, Ordering::SeqCst);
        self.emit(job_id, StreamEvent::JobResumed {
            job: self.snapshot_unchecked(job_id),
        });
        let scheduler = Arc::clone(self);
        tokio::spawn(async move { scheduler.run(job_id).await });
        Ok(())
    }

    /// Requests cancellation; valid from `RUNNING` or `PAUSED` (§4.6). A
    /// paused job (no loop currently executing) transitions immediately;
    /// a running job's loop observes the flag at the next boundary.
    pub fn cancel(&self, job_id: Uuid) -> Result<()> {
        let job_arc = self.job(job_id)?;
        let was_paused = {
            let job = job_arc.lock().expect("job lock poisoned");
            if !matches!(job.status, JobStatus::Running | JobStatus::Paused) {
                return Err(Error::InvalidTransition(
                    "cancel is only valid from RUNNING or PAUSED".to_string(),
                ));
            }
            job.status == JobStatus::Paused
        };
        self.control(job_id)?
            .cancel_requested
            .store(true, Ordering::SeqCst);
        if was_paused {
            self.finish(job_id, JobStatus::Cancelled);
        }
        Ok(())
    }

    /// Returns a snapshot of the job's current state.
    pub fn status(&self, job_id: Uuid) -> Result<JobSnapshot> {
        Ok(self
            .job(job_id)?
            .lock()
            .expect("job lock poisoned")
            .snapshot())
    }

    fn job(&self, job_id: Uuid) -> Result<Arc<Mutex<JobState>>> {
        self.jobs
            .read()
            .expect("job map poisoned")
            .get(&job_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("job {job_id}")))
    }

    fn control(&self, job_id: Uuid) -> Result<Arc<JobControl>> {
        self.controls
            .read()
            .expect("control map poisoned")
            .get(&job_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("job {job_id}")))
    }

    fn snapshot_unchecked(&self, job_id: Uuid) -> JobSnapshot {
        self.job(job_id)
            .map(|j| j.lock().expect("job lock poisoned").snapshot())
            .unwrap_or_else(|_| JobSnapshot {
                task_id: job_id,
                document_id: String::new(),
                status: JobStatus::Failed,
                mode: docforge_core::CommitMode::Replace,
                cursor: 0,
                total: 0,
                completed: 0,
                failed: 0,
                results: Vec::new(),
                started_at: None,
                ended_at: None,
                error: Some("job missing at emit time".to_string()),
            })
    }

    /// Emits `event` to the job's subscriber, if any. Events are
    /// best-effort (§4.6 Progress events) — a missing subscriber or a
    /// job that vanished between lookups never blocks the caller.
    fn emit(&self, job_id: Uuid, event: StreamEvent) {
        let subscriber_id = self.job(job_id).ok().and_then(|job_arc| {
            job_arc
                .lock()
                .expect("job lock poisoned")
                .subscriber_id
                .clone()
        });
        if let Some(subscriber_id) = subscriber_id {
            self.hub.send(&subscriber_id, event);
        }
    }

    fn finish(&self, job_id: Uuid, status: JobStatus) {
        let Ok(job_arc) = self.job(job_id) else { return };
        let mut job = job_arc.lock().expect("job lock poisoned");
        job.status = status;
        job.ended_at = Some(Utc::now());
        let snapshot = job.snapshot();
        drop(job);
        let event = match status {
            JobStatus::Completed => StreamEvent::JobCompleted { job: snapshot },
            JobStatus::Cancelled => StreamEvent::JobCancelled { job: snapshot },
            JobStatus::Failed => StreamEvent::JobFailed { job: snapshot },
            _ => return,
        };
        self.emit(job_id, event);
    }

    fn pause_transition(&self, job_id: Uuid) {
        let Ok(job_arc) = self.job(job_id) else { return };
        let mut job = job_arc.lock().expect("job lock poisoned");
        job.status = JobStatus::Paused;
        drop(job);
        self.emit(job_id, StreamEvent::JobPaused {
            job: self.snapshot_unchecked(job_id),
        });
    }

    async fn run(self: Arc<Self>, job_id: Uuid) {
        let Ok(control) = self.control(job_id) else { return };

        loop {
            if control.cancel_requested.load(Ordering::SeqCst) {
                self.finish(job_id, JobStatus::Cancelled);
                return;
            }
            if control.pause_requested.load(Ordering::SeqCst) {
                self.pause_transition(job_id);
                return;
            }

            let Ok(job_arc) = self.job(job_id) else { return };
            let (section_id, at_end) = {
                let job = job_arc.lock().expect("job lock poisoned");
                if job.cursor >= job.targets.len() {
                    (None, true)
                } else {
                    (Some(job.targets[job.cursor].clone()), false)
                }
            };

            if at_end {
                self.finish(job_id, JobStatus::Completed);
                return;
            }
            let Some(section_id) = section_id else { return };

            self.emit(job_id, StreamEvent::SectionStarted {
                job: self.snapshot_unchecked(job_id),
                section_id: section_id.clone(),
            });

            let outcome = self.run_section(job_id, &section_id).await;

            let result = {
                let mut job = job_arc.lock().expect("job lock poisoned");
                let result = match outcome {
                    Ok((title, content, tokens)) => {
                        job.completed += 1;
                        GenerationResult {
                            section_id: section_id.clone(),
                            section_title: title,
                            success: true,
                            content: Some(content),
                            tokens_used: Some(tokens),
                            error: None,
                        }
                    }
                    Err(e) => {
                        warn!(job_id = %job_id, section_id, error = %e, "section generation failed");
                        job.failed += 1;
                        GenerationResult {
                            section_id: section_id.clone(),
                            section_title: String::new(),
                            success: false,
                            content: None,
                            tokens_used: None,
                            error: Some(e.to_string()),
                        }
                    }
                };
                job.cursor += 1;
                job.results.push(result.clone());
                result
            };

            let snapshot = self.snapshot_unchecked(job_id);
            let event = if result.success {
                StreamEvent::SectionCompleted {
                    job: snapshot,
                    result,
                }
            } else {
                StreamEvent::SectionFailed {
                    job: snapshot,
                    result,
                }
            };
            self.emit(job_id, event);

            if control.cancel_requested.load(Ordering::SeqCst) {
                self.finish(job_id, JobStatus::Cancelled);
                return;
            }
            if control.pause_requested.load(Ordering::SeqCst) {
                self.pause_transition(job_id);
                return;
            }

            tokio::time::sleep(self.inter_section_delay).await;
        }
    }

    /// Builds the prompt, calls the LLM, and commits the result for one
    /// section (§4.6 per-section step).
    async fn run_section(&self, job_id: Uuid, section_id: &str) -> Result<(String, String, u64)> {
        let job_arc = self.job(job_id)?;
        let (document_id, mode, model, temperature, max_tokens, base_url, api_key, master_template, collections) = {
            let job = job_arc.lock().expect("job lock poisoned");
            (
                job.document_id.clone(),
                job.mode,
                job.model.clone(),
                job.temperature,
                job.max_tokens,
                job.base_url.clone(),
                job.api_key.clone(),
                job.master_template.clone(),
                job.knowledge_collection_ids.clone(),
            )
        };

        let tree = self.store.tree(&document_id)?;
        let section = tree
            .find_by_id(section_id)
            .ok_or_else(|| Error::NotFound(format!("section {section_id}")))?
            .clone();

        let parent = section.parent.and_then(|idx| tree.sections.get(idx));
        let parent_content = parent.map(|p| p.content.clone());
        let parent_path = parent.map(|p| p.full_path.clone());

        let self_index = tree
            .sections
            .iter()
            .position(|s| s.section_id == section.section_id)
            .unwrap_or(0);
        let siblings: Vec<String> = tree
            .siblings_of(self_index)
            .into_iter()
            .map(|s| s.heading.clone())
            .collect();
        let outline = tree.render_outline();

        let prompt = build_prompt(&PromptInput {
            section_name: &section.heading,
            parent_context: parent_path.as_deref(),
            mode,
            master_template: &master_template,
            outline: Some(&outline),
            parent_content: parent_content.as_deref(),
            sibling_titles: &siblings,
            current_content: Some(&section.content),
            knowledge_collections: &collections,
        });

        let completion = self
            .llm
            .complete(&CompletionRequest {
                base_url,
                api_key,
                model,
                prompt,
                temperature,
                max_tokens,
                collection_ids: collections,
            })
            .await?;

        self.commit.commit(
            &self.store,
            &document_id,
            &section.full_path,
            &section.heading,
            &section.section_hash,
            &completion.content,
            mode,
        )?;

        info!(job_id = %job_id, section_id, "section committed");
        Ok((section.heading, completion.content, completion.tokens_used))
    }
}
