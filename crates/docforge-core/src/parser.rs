//! Document Parser (C1): turns a `.docx` package into a [`SectionTree`].
//!
//! ## Algorithm
//!
//! Walk the body paragraphs in document order. A paragraph styled
//! `HeadingN` (N in 1..=6) opens a new [`Section`] at level N; every other
//! paragraph's text is appended to the content of whichever section is
//! currently open. Section identity is two-layered (§3):
//!
//! - `section_id` — `"<document_id>_section_<N>"`, N the pre-order index.
//!   Only valid for this parse; a reload renumbers everything.
//! - `section_hash` — SHA-256 of the full ancestor-to-self heading path,
//!   stable across reparses as long as no heading text or ordering above
//!   it changed.
//!
//! A heading with no text is retained as an anonymous section rather than
//! dropped — an empty heading is still a heading. Content that appears
//! before the first heading is discarded (§4.1 edge case): there is no
//! section to attach it to. A style claiming a level outside 1..=6 is
//! treated as body content, not a heading.
//!
//! Comment extraction (§11 SPEC_FULL) reads `word/comments.xml` directly
//! from the zip container, since the docx crate's object model does not
//! expose comments. Association with a section is intentionally the
//! original tool's loose heuristic: a comment's own text mentioning a
//! section's heading is matched by substring. This is best-effort and
//! documented as such, not hardened.

use crate::types::{DocumentComment, Section, SectionTree};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use docx_rs::{read_docx, DocumentChild, ParagraphChild, RunChild};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Read;
use tracing::{debug, warn};

/// Parses `bytes` (the raw contents of a `.docx` file) into a section
/// tree, prefixing generated `section_id`s with `document_id`.
pub fn parse_document(document_id: &str, bytes: &[u8]) -> Result<SectionTree> {
    let docx = read_docx(bytes).map_err(|e| Error::Parse(format!("invalid .docx: {e:?}")))?;

    let mut tree = SectionTree::default();
    // Stack of (tree index, level) for sections still open at this point
    // in the walk; popped when a heading at an equal or shallower level
    // is seen, mirroring the original's `while stack and stack[-1].level
    // >= heading_level: stack.pop()`.
    let mut stack: Vec<(usize, u8)> = Vec::new();

    for child in &docx.document.children {
        let DocumentChild::Paragraph(paragraph) = child else {
            continue;
        };

        let text = paragraph_text(paragraph);
        let level = heading_level(paragraph);

        if let Some(level) = level {
            while stack.last().is_some_and(|&(_, top_level)| top_level >= level) {
                stack.pop();
            }

            let parent_index = stack.last().map(|&(idx, _)| idx);
            let full_path = match parent_index {
                Some(parent_idx) => format!("{} > {}", tree.sections[parent_idx].full_path, text),
                None => text.clone(),
            };

            let index = tree.sections.len();
            let section_id = format!("{document_id}_section_{index}");
            let section_hash = Section::hash_path(&full_path);

            tree.sections.push(Section {
                section_id,
                section_hash,
                level,
                heading: text,
                full_path,
                children: Vec::new(),
                parent: parent_index,
                content: String::new(),
                comments: Vec::new(),
            });

            match parent_index {
                Some(parent_idx) => tree.sections[parent_idx].children.push(index),
                None => tree.roots.push(index),
            }

            stack.push((index, level));
        } else if let Some(&(current_idx, _)) = stack.last() {
            if text.trim().is_empty() {
                continue;
            }
            let section = &mut tree.sections[current_idx];
            if section.content.is_empty() {
                section.content = text;
            } else {
                section.content.push('\n');
                section.content.push_str(&text);
            }
        }
        // Content before the first heading has no section to attach to
        // and is dropped per §4.1.
    }

    match extract_comments(bytes) {
        Ok(comments) => associate_comments(&mut tree, comments),
        Err(e) => warn!(document_id, error = %e, "comment extraction skipped"),
    }

    debug!(document_id, sections = tree.sections.len(), "parsed document");
    Ok(tree)
}

/// Locates the half-open range `[start, end)` of body-child indices a
/// section occupies in a loaded `docx_rs::Docx`: `start` is the index of
/// the section's own heading paragraph, `end` is the index of the next
/// heading paragraph at any level (or the body length, if the section is
/// last). Used by the commit engine (C7) to splice generated content in
/// without disturbing heading paragraphs, by walking the same ancestor
/// stack [`parse_document`] uses rather than re-deriving section indices
/// some other way.
pub fn locate_section_span(docx: &docx_rs::Docx, full_path: &str) -> Result<(usize, usize)> {
    let mut stack: Vec<(u8, String)> = Vec::new();
    let mut start: Option<usize> = None;

    for (index, child) in docx.document.children.iter().enumerate() {
        let DocumentChild::Paragraph(paragraph) = child else {
            continue;
        };
        let Some(level) = heading_level(paragraph) else {
            continue;
        };

        if let Some(start_index) = start {
            return Ok((start_index, index));
        }

        while stack.last().is_some_and(|(top_level, _)| *top_level >= level) {
            stack.pop();
        }
        let text = paragraph_text(paragraph);
        let path = match stack.last() {
            Some((_, parent_path)) => format!("{parent_path} > {text}"),
            None => text,
        };
        if path == full_path {
            start = Some(index);
        }
        stack.push((level, path));
    }

    start
        .map(|start_index| (start_index, docx.document.children.len()))
        .ok_or_else(|| Error::NotFound(format!("section path {full_path}")))
}

/// Concatenated run text of a paragraph, trimmed.
fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                if let RunChild::Text(t) = run_child {
                    text.push_str(&t.text);
                }
            }
        }
    }
    text.trim().to_string()
}

/// Heading level 1..=6 if the paragraph's style id is `HeadingN`, else
/// `None`. Any other style (or a `HeadingN` outside the supported range)
/// is treated as body content.
fn heading_level(paragraph: &docx_rs::Paragraph) -> Option<u8> {
    let style_id = paragraph.property.style.as_ref().map(|s| s.val.as_str())?;
    let digits = style_id.strip_prefix("Heading")?;
    let level: u8 = digits.parse().ok()?;
    (1..=6).contains(&level).then_some(level)
}

/// Reads `word/comments.xml` out of the `.docx` zip container, if
/// present, and parses it into a flat list of comments in document order.
fn extract_comments(bytes: &[u8]) -> Result<Vec<DocumentComment>> {
    let cursor = std::io::Cursor::new(bytes);
    let mut archive =
        zip::ZipArchive::new(cursor).map_err(|e| Error::Parse(format!("invalid zip: {e}")))?;

    let mut xml = String::new();
    match archive.by_name("word/comments.xml") {
        Ok(mut entry) => {
            entry
                .read_to_string(&mut xml)
                .map_err(|e| Error::Parse(format!("reading comments.xml: {e}")))?;
        }
        Err(_) => return Ok(Vec::new()),
    }

    parse_comments_xml(&xml)
}

fn parse_comments_xml(xml: &str) -> Result<Vec<DocumentComment>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut comments = Vec::new();
    let mut current_author = String::new();
    let mut current_date: Option<DateTime<Utc>> = None;
    let mut current_text = String::new();
    let mut in_comment = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if local_name(e.name().as_ref()) == "comment" => {
                in_comment = true;
                current_author.clear();
                current_text.clear();
                current_date = None;
                for attr in e.attributes().flatten() {
                    match local_name(attr.key.as_ref()) {
                        "author" => {
                            current_author = String::from_utf8_lossy(&attr.value).into_owned();
                        }
                        "date" => {
                            current_date = String::from_utf8_lossy(&attr.value)
                                .parse::<DateTime<Utc>>()
                                .ok();
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::Text(t)) if in_comment => {
                current_text.push_str(&t.unescape().unwrap_or_default());
                current_text.push(' ');
            }
            Ok(Event::End(ref e)) if local_name(e.name().as_ref()) == "comment" => {
                in_comment = false;
                comments.push(DocumentComment {
                    author: current_author.clone(),
                    text: current_text.trim().to_string(),
                    timestamp: current_date,
                });
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Parse(format!("malformed comments.xml: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    Ok(comments)
}

fn local_name(qualified: &[u8]) -> &str {
    let s = std::str::from_utf8(qualified).unwrap_or("");
    s.rsplit(':').next().unwrap_or(s)
}

/// Associates each extracted comment with the first section whose
/// heading text it mentions by substring (case-insensitive). A comment
/// that matches nothing is dropped — there is no "unassigned comments"
/// bucket in the section model.
fn associate_comments(tree: &mut SectionTree, comments: Vec<DocumentComment>) {
    for comment in comments {
        let lowered = comment.text.to_lowercase();
        if let Some(section) = tree
            .sections
            .iter_mut()
            .find(|s| !s.heading.is_empty() && lowered.contains(&s.heading.to_lowercase()))
        {
            section.comments.push(comment);
        }
    }
}
