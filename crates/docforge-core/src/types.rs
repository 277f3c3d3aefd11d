//! Core data structures shared by the parser, section store, and commit
//! engine: [`Document`], [`Section`], [`EditStateEntry`], and the
//! generation modes that govern how the commit engine integrates text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A single generable span of prose in a parsed document.
///
/// Identity is split in two: `section_hash` is stable across reloads as
/// long as the heading path doesn't change, while `section_id` is only
/// valid for the lifetime of one parse (it encodes the pre-order index).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// `"<document_id>_section_<N>"`, N = pre-order traversal index.
    pub section_id: String,
    /// SHA-256 of `full_path`, stable across reparses of an unchanged path.
    pub section_hash: String,
    /// Heading level, 1–6.
    pub level: u8,
    /// Trimmed heading text.
    pub heading: String,
    /// Ancestor headings and this section's own heading, joined by `" > "`.
    pub full_path: String,
    /// Indices of this section's children within the owning tree's flat
    /// section list (pre-order). Empty for leaves.
    pub children: Vec<usize>,
    /// Index of the parent section in the owning tree's flat list, if any.
    pub parent: Option<usize>,
    /// Concatenated text of the content paragraphs currently attached to
    /// this section (joined by `\n`), as last observed on disk.
    pub content: String,
    /// Comments loosely associated with this section (§4.1, best-effort).
    pub comments: Vec<DocumentComment>,
}

impl Section {
    /// SHA-256 hex digest of a heading path, used for `section_hash`.
    #[must_use]
    pub fn hash_path(full_path: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(full_path.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Whether the section's current content is empty or whitespace-only.
    #[must_use]
    pub fn is_empty_content(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// A comment extracted from a document's comments part, loosely
/// associated with a section (§4.1 — best-effort, no ordering guarantee).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentComment {
    /// Comment author as recorded in the document.
    pub author: String,
    /// Comment body text.
    pub text: String,
    /// Comment timestamp, if the document recorded one.
    pub timestamp: Option<DateTime<Utc>>,
}

/// The flattened, pre-order section tree produced by the parser for one
/// document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SectionTree {
    /// All sections in pre-order traversal order.
    pub sections: Vec<Section>,
    /// Indices of root-level sections (parent == None), in document order.
    pub roots: Vec<usize>,
}

impl SectionTree {
    /// Depth-first lookup by `section_id`. O(n).
    #[must_use]
    pub fn find_by_id(&self, section_id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.section_id == section_id)
    }

    /// Lookup by the stable `section_hash`, used to re-bind a selection
    /// across a reload.
    #[must_use]
    pub fn find_by_hash(&self, section_hash: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.section_hash == section_hash)
    }

    /// Lookup by full heading path.
    #[must_use]
    pub fn find_by_path(&self, path: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.full_path == path)
    }

    /// Sibling sections of the section at `index` (same parent, excluding
    /// itself), in document order.
    #[must_use]
    pub fn siblings_of(&self, index: usize) -> Vec<&Section> {
        let Some(section) = self.sections.get(index) else {
            return Vec::new();
        };
        let sibling_indices: &[usize] = match section.parent {
            Some(parent) => &self.sections[parent].children,
            None => &self.roots,
        };
        sibling_indices
            .iter()
            .filter(|&&i| i != index)
            .filter_map(|&i| self.sections.get(i))
            .collect()
    }

    /// Indented pre-order rendering of every heading, for the outline
    /// the Prompt Builder attaches (§4.4 step 2).
    #[must_use]
    pub fn render_outline(&self) -> String {
        let mut out = String::new();
        for &root in &self.roots {
            self.render_outline_from(root, &mut out);
        }
        out
    }

    fn render_outline_from(&self, index: usize, out: &mut String) {
        let Some(section) = self.sections.get(index) else {
            return;
        };
        let indent = "  ".repeat((section.level.saturating_sub(1)) as usize);
        out.push_str(&format!("{indent}- {}\n", section.heading));
        for &child in &section.children {
            self.render_outline_from(child, out);
        }
    }
}

/// A parsed and tracked document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Opaque id generated on upload.
    pub id: String,
    /// Original filename as uploaded.
    pub filename: String,
    /// Path to the authoritative byte representation on disk.
    pub storage_path: String,
    /// Principal id that owns the document.
    pub owner: String,
    /// Upload timestamp.
    pub uploaded_at: DateTime<Utc>,
}

/// Per-section edit tracking, persisted as a sidecar (§6.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditStateEntry {
    /// Whether this section has ever been committed to.
    pub edited: bool,
    /// Timestamp of the most recent commit.
    pub last_modified: DateTime<Utc>,
    /// The section's path at the time of the last commit (for diagnostics
    /// when a reload changes the path and the hash no longer matches).
    pub section_path: String,
}

/// How the Commit Engine integrates generated text into a section
/// (§4.7).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum CommitMode {
    /// Remove all non-heading spans under the section and insert new ones.
    Replace,
    /// Same effect as `Replace`; distinguished in prompts only.
    Rework,
    /// Insert new spans before the next heading, keeping existing ones.
    Append,
}

impl CommitMode {
    /// Wire form used in `{operation_mode}` substitution and the REST/job
    /// JSON representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Replace => "REPLACE",
            Self::Rework => "REWORK",
            Self::Append => "APPEND",
        }
    }
}

/// Backup policy for the Commit Engine (§4.7, §11 SPEC_FULL).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackupPolicy {
    /// Never back up before a commit.
    Never,
    /// Back up before every commit.
    #[default]
    Always,
    /// Ask the caller once per document; remember the answer for the
    /// remainder of the session (modeled here as a per-document flag the
    /// caller sets explicitly — there is no interactive prompt in a REST
    /// service).
    AskOnceThenRemember,
}
