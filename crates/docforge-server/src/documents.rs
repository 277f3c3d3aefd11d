//! In-memory document ownership registry.
//!
//! Per §6.4, the principal/document relational store is explicitly
//! collaborator scope; this is the minimal stand-in that lets
//! `/documents` and `/documents/{id}` answer "who owns what" without a
//! real database (§12 Non-goals — byte storage beyond a local
//! filesystem tree is out of scope, and so is this table's durability).

use docforge_core::Document;
use std::collections::HashMap;
use std::sync::RwLock;

/// Tracks which principal owns each uploaded document.
#[derive(Default)]
pub struct DocumentRegistry {
    documents: RwLock<HashMap<String, Document>>,
}

impl DocumentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, document: Document) {
        self.documents
            .write()
            .expect("document registry lock poisoned")
            .insert(document.id.clone(), document);
    }

    #[must_use]
    pub fn get(&self, document_id: &str) -> Option<Document> {
        self.documents
            .read()
            .expect("document registry lock poisoned")
            .get(document_id)
            .cloned()
    }

    #[must_use]
    pub fn list_for_owner(&self, owner: &str) -> Vec<Document> {
        self.documents
            .read()
            .expect("document registry lock poisoned")
            .values()
            .filter(|d| d.owner == owner)
            .cloned()
            .collect()
    }

    pub fn remove(&self, document_id: &str) -> Option<Document> {
        self.documents
            .write()
            .expect("document registry lock poisoned")
            .remove(document_id)
    }
}
