//! # docforge-core
//!
//! Document parsing, markdown-to-richtext conversion, and section
//! tracking for the docforge generation orchestrator.
//!
//! ## Architecture
//!
//! - **Parsing**: [`parser::parse_document`] turns a `.docx` package into
//!   a [`types::SectionTree`] with stable, content-addressed section
//!   identity.
//! - **Conversion**: [`markdown::to_doc_elements`] turns an LLM's
//!   markdown response into the `docx-rs` paragraphs and tables a commit
//!   inserts into the document.
//! - **Tracking**: [`store::SectionStore`] holds the in-memory section
//!   index and persists per-section edit state atomically.
//! - **Configuration**: [`config::Config`] loads the process's runtime
//!   settings from the environment.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use docforge_core::{parser, store::SectionStore, storage::DocumentStorage};
//! use std::path::PathBuf;
//!
//! let storage = DocumentStorage::new(PathBuf::from("/tmp/docforge"));
//! let store = SectionStore::new(storage);
//! let bytes = std::fs::read("report.docx")?;
//! let tree = store.load("doc-1", &bytes)?;
//! println!("parsed {} sections", tree.sections.len());
//! # Ok::<(), docforge_core::Error>(())
//! ```

/// Runtime configuration loaded from the environment.
pub mod config;
/// Error types and the workspace-wide `Result` alias.
pub mod error;
/// Markdown → RichText Converter (C2).
pub mod markdown;
/// Document Parser (C1).
pub mod parser;
/// Section Store (C3).
pub mod store;
/// Document byte storage, backups, and atomic writes.
pub mod storage;
/// Core data types: documents, sections, edit state.
pub mod types;
/// Small string-safety helpers.
pub mod utils;

pub use config::{Config, Credential, CredentialStore, InMemoryCredentialStore};
pub use error::{Error, Result};
pub use markdown::{to_doc_elements, to_document_children, DocElement};
pub use parser::{locate_section_span, parse_document};
pub use store::SectionStore;
pub use storage::{atomic_write, DocumentStorage, SaveOutcome};
pub use types::*;
