//! End-to-end batch scenarios straight out of the spec's testable
//! properties: empty-only filtering, pause/resume, cancel mid-batch, a
//! mid-batch upstream failure, and parent-content propagation across
//! sections in the same job. Each test stands up a real `SectionStore` +
//! `CommitEngine` against a temp directory and a `wiremock` stand-in for
//! the chat-completions endpoint, and drives the actual `JobScheduler`.

use docforge_core::storage::DocumentStorage;
use docforge_core::store::SectionStore;
use docforge_core::{BackupPolicy, CommitMode};
use docforge_jobs::{JobScheduler, JobSpec, JobStatus, StreamEvent};
use docforge_llm::LlmClient;
use docx_rs::{Docx, Paragraph, Run};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn build_docx(sections: &[(u8, &str, Option<&str>)]) -> Vec<u8> {
    let mut docx = Docx::new();
    for (level, heading, body) in sections {
        docx = docx.add_paragraph(
            Paragraph::new()
                .style(&format!("Heading{level}"))
                .add_run(Run::new().add_text(*heading)),
        );
        if let Some(body) = body {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*body)));
        }
    }
    let mut buf = Vec::new();
    docx.build().pack(&mut Cursor::new(&mut buf)).unwrap();
    buf
}

struct Harness {
    _dir: tempfile::TempDir,
    store: Arc<SectionStore>,
    scheduler: Arc<JobScheduler>,
    hub: Arc<docforge_jobs::StreamHub>,
    base_url: String,
}

async fn harness(sections: &[(u8, &str, Option<&str>)], server: &MockServer) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(DocumentStorage::new(dir.path().to_path_buf()));
    let bytes = build_docx(sections);
    storage.store_document("doc1", &bytes).unwrap();

    let store = Arc::new(SectionStore::new((*storage).clone()));
    store.load("doc1", &bytes).unwrap();

    let commit = Arc::new(CommitEngineAlias::new(Arc::clone(&storage), BackupPolicy::Never));
    let llm = Arc::new(LlmClient::new(Duration::from_secs(5)).unwrap());
    let hub = Arc::new(docforge_jobs::StreamHub::new());
    let scheduler = Arc::new(JobScheduler::with_inter_section_delay(
        Arc::clone(&store),
        commit,
        llm,
        Arc::clone(&hub),
        Duration::from_millis(10),
    ));

    Harness {
        _dir: dir,
        store,
        scheduler,
        hub,
        base_url: server.uri(),
    }
}

// Local alias so a rename of the re-exported type doesn't ripple through
// every call site below.
use docforge_jobs::CommitEngine as CommitEngineAlias;

fn spec(harness: &Harness, section_ids: Vec<String>, mode: CommitMode, empty_only: bool) -> JobSpec {
    JobSpec {
        document_id: "doc1".to_string(),
        section_ids,
        mode,
        model: "m".to_string(),
        temperature: 0.7,
        max_tokens: 512,
        knowledge_collection_ids: Vec::new(),
        empty_only,
        subscriber_id: Some("client-1".to_string()),
        base_url: harness.base_url.clone(),
        api_key: "sk-test".to_string(),
        master_template: docforge_llm::DEFAULT_MASTER_TEMPLATE.to_string(),
    }
}

fn section_id(n: usize) -> String {
    format!("doc1_section_{n}")
}

async fn wait_for_terminal(scheduler: &JobScheduler, job_id: uuid::Uuid) -> docforge_jobs::JobSnapshot {
    for _ in 0..200 {
        let snapshot = scheduler.status(job_id).unwrap();
        if matches!(
            snapshot.status,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled | JobStatus::Paused
        ) {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} never reached a terminal/paused state");
}

#[tokio::test]
async fn batch_with_empty_only_filter_skips_populated_sections() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"content": "generated"}}],
            "usage": {"total_tokens": 5}
        })))
        .mount(&server)
        .await;

    let sections = [
        (1, "A", Some("x")),
        (1, "B", None),
        (1, "C", None),
    ];
    let harness = harness(&sections, &server).await;
    let targets = vec![section_id(0), section_id(1), section_id(2)];
    let job_id = harness
        .scheduler
        .create(spec(&harness, targets, CommitMode::Replace, true))
        .unwrap();
    harness.scheduler.start(job_id).unwrap();

    let snapshot = wait_for_terminal(&harness.scheduler, job_id).await;
    assert_eq!(snapshot.status, JobStatus::Completed);
    assert_eq!(snapshot.total, 2, "A has content and is filtered out by empty_only");
    assert_eq!(snapshot.completed, 2);
    assert_eq!(snapshot.failed, 0);
    assert_eq!(snapshot.results[0].section_id, section_id(1));
    assert_eq!(snapshot.results[1].section_id, section_id(2));
}

#[tokio::test]
async fn pause_then_resume_completes_all_sections_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"content": "generated"}}],
            "usage": {"total_tokens": 1}
        })))
        .mount(&server)
        .await;

    let sections = [
        (1, "A", None),
        (1, "B", None),
        (1, "C", None),
        (1, "D", None),
    ];
    let harness = harness(&sections, &server).await;
    let mut events = harness.hub.attach("client-1");
    let targets = (0..4).map(section_id).collect();
    let job_id = harness
        .scheduler
        .create(spec(&harness, targets, CommitMode::Replace, false))
        .unwrap();
    harness.scheduler.start(job_id).unwrap();

    // Wait for the first section_completed event, then request a pause.
    loop {
        match events.recv().await.expect("stream closed early") {
            StreamEvent::SectionCompleted { .. } => break,
            _ => continue,
        }
    }
    harness.scheduler.pause(job_id).unwrap();

    let paused = wait_for_terminal(&harness.scheduler, job_id).await;
    assert_eq!(paused.status, JobStatus::Paused);
    assert_eq!(paused.completed, 1);

    harness.scheduler.resume(job_id).unwrap();
    let finished = wait_for_terminal(&harness.scheduler, job_id).await;
    assert_eq!(finished.status, JobStatus::Completed);
    assert_eq!(finished.completed, 4);
    assert_eq!(finished.failed, 0);
    assert_eq!(
        finished.results.iter().map(|r| r.section_id.clone()).collect::<Vec<_>>(),
        (0..4).map(section_id).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn cancel_mid_batch_stops_before_next_section_starts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"content": "generated"}}],
            "usage": {"total_tokens": 1}
        })))
        .mount(&server)
        .await;

    let sections = [(1, "A", None), (1, "B", None), (1, "C", None)];
    let harness = harness(&sections, &server).await;
    let mut events = harness.hub.attach("client-1");
    let targets = (0..3).map(section_id).collect();
    let job_id = harness
        .scheduler
        .create(spec(&harness, targets, CommitMode::Replace, false))
        .unwrap();
    harness.scheduler.start(job_id).unwrap();

    loop {
        match events.recv().await.expect("stream closed early") {
            StreamEvent::SectionCompleted { .. } => break,
            _ => continue,
        }
    }
    harness.scheduler.cancel(job_id).unwrap();

    let snapshot = wait_for_terminal(&harness.scheduler, job_id).await;
    assert_eq!(snapshot.status, JobStatus::Cancelled);
    assert_eq!(snapshot.completed, 1);
    assert_eq!(snapshot.failed, 0);

    // Drain remaining events; there must be no section_started for B or C.
    let mut started_sections = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let StreamEvent::SectionStarted { section_id: started, .. } = event {
            started_sections.push(started);
        }
    }
    assert!(
        started_sections.is_empty(),
        "no section_started should follow the section_completed that preceded cancel, got {started_sections:?}"
    );
}

#[tokio::test]
async fn llm_failure_mid_batch_is_recorded_and_job_continues() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/completions"))
        .and(body_string_contains("SectionB"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"content": "generated"}}],
            "usage": {"total_tokens": 1}
        })))
        .mount(&server)
        .await;

    let sections = [(1, "SectionA", None), (1, "SectionB", None), (1, "SectionC", None)];
    let harness = harness(&sections, &server).await;
    let targets = (0..3).map(section_id).collect();
    let job_id = harness
        .scheduler
        .create(spec(&harness, targets, CommitMode::Replace, false))
        .unwrap();
    harness.scheduler.start(job_id).unwrap();

    let snapshot = wait_for_terminal(&harness.scheduler, job_id).await;
    assert_eq!(snapshot.status, JobStatus::Completed);
    assert_eq!(snapshot.completed, 2);
    assert_eq!(snapshot.failed, 1);
    let failed = snapshot
        .results
        .iter()
        .find(|r| r.section_id == section_id(1))
        .unwrap();
    assert!(!failed.success);
    assert!(failed.error.as_ref().unwrap().contains("503") || !failed.error.as_ref().unwrap().is_empty());
}

#[tokio::test]
async fn parent_content_generated_earlier_in_job_flows_into_child_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/completions"))
        .and(body_string_contains("PARENT SECTION CONTENT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"content": "child-uses-parent"}}],
            "usage": {"total_tokens": 1}
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"content": "parent-text"}}],
            "usage": {"total_tokens": 1}
        })))
        .mount(&server)
        .await;

    // Heading1 "P", Heading2 "C" nested under P, both empty.
    let sections = [(1, "P", None), (2, "C", None)];
    let harness = harness(&sections, &server).await;
    let targets = vec![section_id(0), section_id(1)];
    let job_id = harness
        .scheduler
        .create(spec(&harness, targets, CommitMode::Replace, false))
        .unwrap();
    harness.scheduler.start(job_id).unwrap();

    let snapshot = wait_for_terminal(&harness.scheduler, job_id).await;
    assert_eq!(snapshot.status, JobStatus::Completed);
    assert_eq!(snapshot.completed, 2);

    let child_result = snapshot
        .results
        .iter()
        .find(|r| r.section_id == section_id(1))
        .unwrap();
    assert_eq!(child_result.content.as_deref(), Some("child-uses-parent"));

    let parent_result = snapshot
        .results
        .iter()
        .find(|r| r.section_id == section_id(0))
        .unwrap();
    assert_eq!(parent_result.content.as_deref(), Some("parent-text"));

    // Verify the parent's generated text landed in the document before
    // the child's prompt was built, not just that the response matched.
    let tree = harness.store.tree("doc1").unwrap();
    let parent = tree.find_by_path("P").unwrap();
    assert!(parent.content.contains("parent-text"));
}
