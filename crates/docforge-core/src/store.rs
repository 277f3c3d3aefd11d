//! Section Store (C3): the in-memory index of parsed section trees plus
//! their atomically persisted edit-state sidecars (§4.3, §6.4).
//!
//! Each document gets one [`DocumentState`] guarded by its own mutex, so
//! concurrent operations on different documents never contend, while
//! mutations of a single document's tree or edit-state are serialized.
//! The edit-state sidecar is written with [`atomic_write`] so a reader
//! never observes a half-written file.

use crate::parser::parse_document;
use crate::storage::{atomic_write, DocumentStorage};
use crate::types::{EditStateEntry, SectionTree};
use crate::{Error, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex, RwLock};
use tracing::debug;

struct DocumentState {
    tree: SectionTree,
    edit_state: HashMap<String, EditStateEntry>,
}

/// Tracks parsed section trees and edit state for every loaded document.
pub struct SectionStore {
    storage: DocumentStorage,
    documents: RwLock<HashMap<String, Arc<Mutex<DocumentState>>>>,
}

impl SectionStore {
    #[must_use]
    pub fn new(storage: DocumentStorage) -> Self {
        Self {
            storage,
            documents: RwLock::new(HashMap::new()),
        }
    }

    fn entry(&self, document_id: &str) -> Arc<Mutex<DocumentState>> {
        if let Some(existing) = self
            .documents
            .read()
            .expect("section store lock poisoned")
            .get(document_id)
        {
            return Arc::clone(existing);
        }
        let mut write_guard = self.documents.write().expect("section store lock poisoned");
        Arc::clone(
            write_guard
                .entry(document_id.to_string())
                .or_insert_with(|| {
                    Arc::new(Mutex::new(DocumentState {
                        tree: SectionTree::default(),
                        edit_state: HashMap::new(),
                    }))
                }),
        )
    }

    /// Parses `bytes` and registers the resulting tree for `document_id`,
    /// loading any existing edit-state sidecar from disk first so edit
    /// flags survive a reload.
    pub fn load(&self, document_id: &str, bytes: &[u8]) -> Result<SectionTree> {
        let tree = parse_document(document_id, bytes)?;
        let edit_state = self.load_sidecar(document_id)?;
        let state_arc = self.entry(document_id);
        let mut state = state_arc.lock().expect("document lock poisoned");
        state.tree = tree.clone();
        state.edit_state = edit_state;
        debug!(document_id, sections = tree.sections.len(), "registered section tree");
        Ok(tree)
    }

    /// Re-parses the document's current bytes, keeping edit-state entries
    /// whose `section_hash` still appears in the new tree (§4.3 reload
    /// semantics — a hash that disappeared because its heading path
    /// changed loses its edit flag, since it's effectively a new section).
    pub fn reload(&self, document_id: &str) -> Result<SectionTree> {
        let bytes = self.storage.read_document(document_id)?;
        let tree = parse_document(document_id, &bytes)?;
        let state_arc = self.entry(document_id);
        let mut state = state_arc.lock().expect("document lock poisoned");
        state.edit_state.retain(|hash, _| tree.find_by_hash(hash).is_some());
        state.tree = tree.clone();
        Ok(tree)
    }

    /// Returns a clone of the current tree for `document_id`.
    pub fn tree(&self, document_id: &str) -> Result<SectionTree> {
        let state_arc = self.entry(document_id);
        let state = state_arc.lock().expect("document lock poisoned");
        if state.tree.sections.is_empty() {
            return Err(Error::NotFound(format!("document {document_id}")));
        }
        Ok(state.tree.clone())
    }

    /// Records that `section_hash` was just committed to, persisting the
    /// sidecar atomically.
    pub fn mark_edited(&self, document_id: &str, section_hash: &str) -> Result<()> {
        let state_arc = self.entry(document_id);
        let mut state = state_arc.lock().expect("document lock poisoned");
        let path = state
            .tree
            .find_by_hash(section_hash)
            .map(|s| s.full_path.clone())
            .ok_or_else(|| Error::NotFound(format!("section {section_hash}")))?;

        state.edit_state.insert(
            section_hash.to_string(),
            EditStateEntry {
                edited: true,
                last_modified: Utc::now(),
                section_path: path,
            },
        );

        let sidecar = serde_json::to_vec_pretty(&state.edit_state)?;
        let sidecar_path = self.storage.sidecar_path(document_id);
        if let Some(parent) = sidecar_path.parent() {
            fs::create_dir_all(parent)?;
        }
        atomic_write(&sidecar_path, &sidecar)?;
        debug!(document_id, section_hash, "marked section edited");
        Ok(())
    }

    /// Whether `section_hash` has ever been committed to.
    pub fn is_edited(&self, document_id: &str, section_hash: &str) -> Result<bool> {
        let state_arc = self.entry(document_id);
        let state = state_arc.lock().expect("document lock poisoned");
        Ok(state
            .edit_state
            .get(section_hash)
            .is_some_and(|e| e.edited))
    }

    /// Forgets a document's in-memory tree and edit state entirely (§6.1
    /// `DELETE /documents/{id}`). Byte storage is the caller's
    /// responsibility to remove separately.
    pub fn remove(&self, document_id: &str) {
        self.documents
            .write()
            .expect("section store lock poisoned")
            .remove(document_id);
    }

    fn load_sidecar(&self, document_id: &str) -> Result<HashMap<String, EditStateEntry>> {
        let path = self.storage.sidecar_path(document_id);
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let bytes = fs::read(&path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_docx() -> Vec<u8> {
        use docx_rs::Docx;
        let mut buf = Vec::new();
        Docx::new()
            .add_paragraph(docx_rs::Paragraph::new().style("Heading1").add_run(
                docx_rs::Run::new().add_text("Overview"),
            ))
            .add_paragraph(docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text("Body")))
            .build()
            .pack(&mut std::io::Cursor::new(&mut buf))
            .unwrap();
        buf
    }

    #[test]
    fn load_then_mark_edited_persists_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DocumentStorage::new(dir.path().to_path_buf());
        storage.store_document("doc1", &minimal_docx()).unwrap();
        let store = SectionStore::new(storage);

        let tree = store.load("doc1", &minimal_docx()).unwrap();
        let hash = tree.sections[0].section_hash.clone();
        store.mark_edited("doc1", &hash).unwrap();

        assert!(store.is_edited("doc1", &hash).unwrap());
        assert!(dir.path().join("doc1").join("edit_state.json").exists());
    }

    #[test]
    fn reload_preserves_edit_state_for_unchanged_hash() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DocumentStorage::new(dir.path().to_path_buf());
        storage.store_document("doc1", &minimal_docx()).unwrap();
        let store = SectionStore::new(storage);

        let tree = store.load("doc1", &minimal_docx()).unwrap();
        let hash = tree.sections[0].section_hash.clone();
        store.mark_edited("doc1", &hash).unwrap();

        let reloaded = store.reload("doc1").unwrap();
        assert_eq!(reloaded.sections[0].section_hash, hash);
        assert!(store.is_edited("doc1", &hash).unwrap());
    }
}
