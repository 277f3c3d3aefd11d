//! Commit Engine (C7): integrates generated content into a document
//! under one of three modes while preserving heading structure (§4.7).
//!
//! A commit never touches the section's own heading paragraph. It reads
//! the current bytes, finds the section's body span with
//! [`docforge_core::locate_section_span`] (the same ancestor-stack walk
//! the parser uses, so the two never disagree about where a section
//! starts and ends), splices in the converted content, and repackages
//! the document. `REPLACE`/`REWORK` replace the whole span; `APPEND`
//! inserts immediately before the next heading, which also makes the
//! empty-content-plus-`APPEND` boundary case (§8) behave exactly like
//! `REPLACE` with no extra branching: there's nothing between the
//! heading and the next one to preserve.

use docforge_core::storage::{DocumentStorage, SaveOutcome};
use docforge_core::store::SectionStore;
use docforge_core::{markdown, parser, BackupPolicy, CommitMode, Error, Result};
use docx_rs::read_docx;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// What happened when a commit's generated content was persisted.
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    pub backup_path: Option<PathBuf>,
    pub save: SaveOutcome,
}

/// Applies generated content to a section and persists the result
/// (§4.7).
pub struct CommitEngine {
    storage: Arc<DocumentStorage>,
    backup_policy: BackupPolicy,
    /// Resolved answer for `BackupPolicy::AskOnceThenRemember`: the REST
    /// surface asks the caller once per document and passes the answer
    /// down here rather than this engine prompting anyone itself.
    remembered_answer: bool,
    save_retry_attempts: u32,
}

impl CommitEngine {
    #[must_use]
    pub fn new(storage: Arc<DocumentStorage>, backup_policy: BackupPolicy) -> Self {
        Self::with_remembered_answer(storage, backup_policy, true)
    }

    /// As [`Self::new`], but with an explicit answer to use when
    /// `backup_policy` is [`BackupPolicy::AskOnceThenRemember`].
    #[must_use]
    pub fn with_remembered_answer(
        storage: Arc<DocumentStorage>,
        backup_policy: BackupPolicy,
        remembered_answer: bool,
    ) -> Self {
        Self {
            storage,
            backup_policy,
            remembered_answer,
            save_retry_attempts: 3,
        }
    }

    fn should_backup(&self) -> bool {
        match self.backup_policy {
            BackupPolicy::Never => false,
            BackupPolicy::Always => true,
            BackupPolicy::AskOnceThenRemember => self.remembered_answer,
        }
    }

    /// Commits `content` to the section identified by `full_path` under
    /// `mode`, marks it edited in `store`, and reloads the store's tree
    /// so the next section's "on-disk" parent content reflects this
    /// commit (§4.6 step 2 relies on this happening synchronously).
    pub fn commit(
        &self,
        store: &SectionStore,
        document_id: &str,
        full_path: &str,
        heading: &str,
        section_hash: &str,
        content: &str,
        mode: CommitMode,
    ) -> Result<CommitOutcome> {
        let bytes = self.storage.read_document(document_id)?;

        let backup_path = if self.should_backup() {
            Some(self.storage.create_backup(document_id)?)
        } else {
            None
        };

        let mut docx =
            read_docx(&bytes).map_err(|e| Error::Parse(format!("invalid .docx: {e:?}")))?;
        let (start, end) = parser::locate_section_span(&docx, full_path)?;

        let elements = markdown::to_doc_elements(content, heading);
        let children = markdown::to_document_children(elements);

        match mode {
            CommitMode::Replace | CommitMode::Rework => {
                docx.document.children.splice(start + 1..end, children);
            }
            CommitMode::Append => {
                docx.document.children.splice(end..end, children);
            }
        }

        let mut buf = Vec::new();
        docx.build()
            .pack(&mut Cursor::new(&mut buf))
            .map_err(|e| Error::Storage(format!("failed to repackage document: {e:?}")))?;

        let save = self
            .storage
            .save_with_retry(document_id, &buf, self.save_retry_attempts)?;

        store.mark_edited(document_id, section_hash)?;
        store.reload(document_id)?;

        info!(
            document_id,
            section_hash,
            mode = mode.as_str(),
            "committed section content"
        );

        Ok(CommitOutcome { backup_path, save })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docforge_core::store::SectionStore;
    use docx_rs::{Docx, Paragraph, Run};

    fn two_section_docx() -> Vec<u8> {
        let mut buf = Vec::new();
        Docx::new()
            .add_paragraph(
                Paragraph::new()
                    .style("Heading1")
                    .add_run(Run::new().add_text("Intro")),
            )
            .add_paragraph(
                Paragraph::new().style("Heading1").add_run(Run::new().add_text("Details")),
            )
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Details body.")))
            .build()
            .pack(&mut Cursor::new(&mut buf))
            .unwrap();
        buf
    }

    fn setup() -> (tempfile::TempDir, Arc<DocumentStorage>, SectionStore) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(DocumentStorage::new(dir.path().to_path_buf()));
        storage.store_document("doc1", &two_section_docx()).unwrap();
        let store = SectionStore::new((*storage).clone());
        store.load("doc1", &two_section_docx()).unwrap();
        (dir, storage, store)
    }

    #[test]
    fn replace_into_empty_section_inserts_content_and_marks_edited() {
        let (_dir, storage, store) = setup();
        let engine = CommitEngine::new(Arc::clone(&storage), BackupPolicy::Never);
        let tree = store.tree("doc1").unwrap();
        let intro = tree.find_by_path("Intro").unwrap();

        engine
            .commit(
                &store,
                "doc1",
                &intro.full_path,
                &intro.heading,
                &intro.section_hash,
                "Hello **world**",
                CommitMode::Replace,
            )
            .unwrap();

        assert!(store.is_edited("doc1", &intro.section_hash).unwrap());
        let reloaded = store.tree("doc1").unwrap();
        let intro_after = reloaded.find_by_path("Intro").unwrap();
        assert!(intro_after.content.contains("Hello"));
    }

    #[test]
    fn append_preserves_existing_content() {
        let (_dir, storage, store) = setup();
        let engine = CommitEngine::new(Arc::clone(&storage), BackupPolicy::Never);
        let tree = store.tree("doc1").unwrap();
        let details = tree.find_by_path("Details").unwrap();

        engine
            .commit(
                &store,
                "doc1",
                &details.full_path,
                &details.heading,
                &details.section_hash,
                "More detail.",
                CommitMode::Append,
            )
            .unwrap();

        let reloaded = store.tree("doc1").unwrap();
        let details_after = reloaded.find_by_path("Details").unwrap();
        assert!(details_after.content.contains("Details body."));
        assert!(details_after.content.contains("More detail."));
    }

    #[test]
    fn always_policy_creates_a_backup() {
        let (dir, storage, store) = setup();
        let engine = CommitEngine::new(Arc::clone(&storage), BackupPolicy::Always);
        let tree = store.tree("doc1").unwrap();
        let intro = tree.find_by_path("Intro").unwrap();

        let outcome = engine
            .commit(
                &store,
                "doc1",
                &intro.full_path,
                &intro.heading,
                &intro.section_hash,
                "content",
                CommitMode::Replace,
            )
            .unwrap();

        let backup_path = outcome.backup_path.expect("backup expected under Always policy");
        assert!(backup_path.exists());
        assert!(backup_path.starts_with(dir.path()));
    }
}
