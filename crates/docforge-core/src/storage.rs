//! Local filesystem storage for uploaded documents, their edit-state
//! sidecars, and pre-commit backups (§6.4, §11 SPEC_FULL).
//!
//! All writes that must survive a crash mid-write go through
//! [`atomic_write`]: write to a `.tmp` sibling, then rename over the
//! final path. Byte storage beyond this local tree is out of scope
//! (§12 Non-goals).

use crate::{Error, Result};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes `bytes` to `path` atomically: a temp file in the same
/// directory is written first and then renamed over the destination, so
/// a reader never observes a partially written file.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension(match path.extension() {
        Some(ext) => format!("{}.tmp", ext.to_string_lossy()),
        None => "tmp".to_string(),
    });
    fs::write(&tmp_path, bytes)
        .map_err(|e| Error::Storage(format!("failed to write {}: {e}", tmp_path.display())))?;

    #[cfg(target_os = "windows")]
    if path.exists() {
        fs::remove_file(path)
            .map_err(|e| Error::Storage(format!("failed to remove {}: {e}", path.display())))?;
    }

    fs::rename(&tmp_path, path)
        .map_err(|e| Error::Storage(format!("failed to commit {}: {e}", path.display())))?;
    Ok(())
}

/// Manages the on-disk tree for one document: its original bytes, any
/// backups taken before a commit, and the edit-state sidecar (owned by
/// the Section Store, but the path convention lives here).
#[derive(Debug, Clone)]
pub struct DocumentStorage {
    root: PathBuf,
}

impl DocumentStorage {
    /// `root` is the configured upload directory (`Config::upload_dir`).
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn document_dir(&self, document_id: &str) -> PathBuf {
        self.root.join(document_id)
    }

    /// Path to the authoritative `.docx` bytes for `document_id`.
    #[must_use]
    pub fn document_path(&self, document_id: &str) -> PathBuf {
        self.document_dir(document_id).join("document.docx")
    }

    /// Path to the edit-state sidecar for `document_id`.
    #[must_use]
    pub fn sidecar_path(&self, document_id: &str) -> PathBuf {
        self.document_dir(document_id).join("edit_state.json")
    }

    /// Stores newly uploaded document bytes, creating the document's
    /// directory if necessary. Overwrites any existing bytes at that id.
    pub fn store_document(&self, document_id: &str, bytes: &[u8]) -> Result<PathBuf> {
        let dir = self.document_dir(document_id);
        fs::create_dir_all(&dir)?;
        let path = self.document_path(document_id);
        atomic_write(&path, bytes)?;
        debug!(document_id, bytes = bytes.len(), "stored document");
        Ok(path)
    }

    /// Reads the current bytes for `document_id`.
    pub fn read_document(&self, document_id: &str) -> Result<Vec<u8>> {
        let path = self.document_path(document_id);
        fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(format!("document {document_id}"))
            } else {
                Error::Io(e)
            }
        })
    }

    /// Creates a timestamped backup copy of `document_id`'s current bytes
    /// before a commit overwrites them, per the `BackupPolicy` the
    /// caller resolved. Returns the backup path.
    pub fn create_backup(&self, document_id: &str) -> Result<PathBuf> {
        let source = self.document_path(document_id);
        let backup_dir = self.document_dir(document_id).join("backups");
        fs::create_dir_all(&backup_dir)?;
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3f");
        let backup_path = backup_dir.join(format!("document.{stamp}.docx"));
        fs::copy(&source, &backup_path).map_err(|e| {
            Error::Storage(format!("failed to back up {}: {e}", source.display()))
        })?;
        debug!(document_id, backup = %backup_path.display(), "created backup");
        Ok(backup_path)
    }

    /// Overwrites the stored document bytes with `bytes`, retrying up to
    /// `attempts` times on failure (§11 SPEC_FULL save-with-retry). A
    /// file held open by another process is the only realistic transient
    /// cause here, since writes are local.
    pub fn save_with_retry(
        &self,
        document_id: &str,
        bytes: &[u8],
        attempts: u32,
    ) -> Result<SaveOutcome> {
        let path = self.document_path(document_id);
        let mut last_err = None;
        for attempt in 0..attempts {
            match atomic_write(&path, bytes) {
                Ok(()) => return Ok(SaveOutcome::Saved { path }),
                Err(e) => {
                    debug!(document_id, attempt, error = %e, "save attempt failed");
                    last_err = Some(e);
                }
            }
        }
        Ok(SaveOutcome::Conflict {
            error: last_err
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown save failure".to_string()),
        })
    }
}

/// Result of [`DocumentStorage::save_with_retry`].
#[derive(Debug, Clone)]
pub enum SaveOutcome {
    /// The write succeeded within the retry budget.
    Saved { path: PathBuf },
    /// All attempts failed; the caller should offer a save-as choice
    /// rather than losing the generated content.
    Conflict { error: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_and_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DocumentStorage::new(dir.path().to_path_buf());
        storage.store_document("doc1", b"hello").unwrap();
        assert_eq!(storage.read_document("doc1").unwrap(), b"hello");
    }

    #[test]
    fn read_missing_document_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DocumentStorage::new(dir.path().to_path_buf());
        let err = storage.read_document("missing").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn backup_creates_timestamped_copy() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DocumentStorage::new(dir.path().to_path_buf());
        storage.store_document("doc1", b"v1").unwrap();
        let backup = storage.create_backup("doc1").unwrap();
        assert!(backup.exists());
        assert_eq!(fs::read(&backup).unwrap(), b"v1");
    }

    #[test]
    fn save_with_retry_succeeds_first_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DocumentStorage::new(dir.path().to_path_buf());
        storage.store_document("doc1", b"v1").unwrap();
        let outcome = storage.save_with_retry("doc1", b"v2", 3).unwrap();
        assert!(matches!(outcome, SaveOutcome::Saved { .. }));
        assert_eq!(storage.read_document("doc1").unwrap(), b"v2");
    }
}
