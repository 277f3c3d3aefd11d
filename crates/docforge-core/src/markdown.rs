//! Markdown → RichText Converter (C2): turns LLM output — a restricted
//! markdown dialect — into the `docx-rs` paragraphs and tables that get
//! inserted into a section on commit.
//!
//! The dialect and its mapping to Word styles is deliberately small and
//! mirrors what a document-filling tool actually needs, not general
//! markdown: headings (`#`..`####`, deeper levels fall back to a plain
//! paragraph), bullet and numbered lists, blockquotes, fenced code
//! blocks, horizontal rules, pipe tables, and four inline spans (bold,
//! italic, inline code, strikethrough) plus `[text](url)` links rendered
//! as styled text rather than a true hyperlink field.
//!
//! Block detection is line-oriented and single-pass, matching paragraphs
//! by accumulating lines until a blank line or the start of a different
//! block type. Inline spans are parsed with one left-to-right scan per
//! line using a toggle-state machine for bold/italic, rather than a
//! nested grammar — the dialect never allows unmatched or re-ordered
//! delimiters, so toggling is sufficient.

use docx_rs::{
    Paragraph, ParagraphChild, Run, RunFonts, Table, TableCell, TableRow, TableRowChild,
};
use regex::Regex;
use std::sync::LazyLock;

static HR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([-*_])\1{2,}\s*$").unwrap());
static NUMBERED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.\s+").unwrap());

/// A unit of content ready to be inserted into a document body: either a
/// paragraph or a table. `docx-rs` does not have a common supertype for
/// the two, so the commit engine inserts each variant with its own call.
pub enum DocElement {
    Paragraph(Paragraph),
    Table(Table),
}

/// Converts `markdown` into the document elements that should replace or
/// follow a section's content. `section_heading` is the heading text the
/// section already carries in the document; if the generated markdown's
/// very first line is a heading that duplicates it (case-insensitive),
/// that line is dropped so the heading isn't doubled (§4.2 edge case).
#[must_use]
pub fn to_doc_elements(markdown: &str, section_heading: &str) -> Vec<DocElement> {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut elements = Vec::new();
    let mut i = 0;
    let mut suppressed_leading_heading = false;

    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim_end();

        if trimmed.trim().is_empty() {
            i += 1;
            continue;
        }

        if let Some((level, text)) = heading_prefix(trimmed) {
            if !suppressed_leading_heading
                && elements.is_empty()
                && text.eq_ignore_ascii_case(section_heading.trim())
            {
                suppressed_leading_heading = true;
                i += 1;
                continue;
            }
            elements.push(DocElement::Paragraph(heading_paragraph(level, &text)));
            i += 1;
            continue;
        }

        if HR_RE.is_match(trimmed) {
            elements.push(DocElement::Paragraph(horizontal_rule_paragraph()));
            i += 1;
            continue;
        }

        if let Some(stripped) = trimmed.strip_prefix("```") {
            let _lang = stripped.trim();
            i += 1;
            let mut code_lines = Vec::new();
            while i < lines.len() && !lines[i].trim_start().starts_with("```") {
                code_lines.push(lines[i]);
                i += 1;
            }
            i += 1; // consume closing fence
            for code_line in &code_lines {
                elements.push(DocElement::Paragraph(code_paragraph(code_line)));
            }
            continue;
        }

        if is_table_row(trimmed) {
            let remaining: Vec<&str> = lines[i..].iter().map(|l| l.trim_end()).collect();
            if let Some((consumed, table)) = try_parse_table(&remaining) {
                elements.push(DocElement::Table(table));
                i += consumed;
                continue;
            }
            // Malformed table (no valid separator row, or no data row):
            // falls back to literal text per §4.2.
            elements.push(DocElement::Paragraph(styled_paragraph(trimmed, "Normal")));
            i += 1;
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("> ") {
            elements.push(DocElement::Paragraph(styled_paragraph(rest, "Quote")));
            i += 1;
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("* ").or_else(|| trimmed.strip_prefix("- ")) {
            elements.push(DocElement::Paragraph(styled_paragraph(rest, "ListBullet")));
            i += 1;
            continue;
        }

        if NUMBERED_RE.is_match(trimmed) {
            let rest = NUMBERED_RE.replace(trimmed, "");
            elements.push(DocElement::Paragraph(styled_paragraph(&rest, "ListNumber")));
            i += 1;
            continue;
        }

        // Plain paragraph: accumulate until a blank line or a line that
        // starts a different block.
        let mut buf = String::from(trimmed);
        i += 1;
        while i < lines.len() {
            let next = lines[i].trim_end();
            if next.trim().is_empty()
                || heading_prefix(next).is_some()
                || HR_RE.is_match(next)
                || next.trim_start().starts_with("```")
                || next.starts_with("> ")
                || next.starts_with("* ")
                || next.starts_with("- ")
                || NUMBERED_RE.is_match(next)
                || is_table_row(next)
            {
                break;
            }
            buf.push(' ');
            buf.push_str(next.trim());
            i += 1;
        }
        elements.push(DocElement::Paragraph(styled_paragraph(&buf, "Normal")));
    }

    elements
}

fn heading_prefix(line: &str) -> Option<(u8, String)> {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    if hashes == 0 || hashes > 4 || line.as_bytes().get(hashes) != Some(&b' ') {
        return None;
    }
    Some((hashes as u8, line[hashes..].trim().to_string()))
}

fn is_table_row(line: &str) -> bool {
    let t = line.trim();
    t.starts_with('|') && t.matches('|').count() >= 2
}

fn table_cells(line: &str) -> Vec<&str> {
    line.trim().trim_matches('|').split('|').map(str::trim).collect()
}

/// A separator row's cells are `-`-only (optionally with alignment
/// colons, which this dialect ignores — it never right/center-aligns).
fn is_separator_row(line: &str) -> bool {
    is_table_row(line)
        && table_cells(line)
            .iter()
            .all(|cell| !cell.is_empty() && cell.trim_matches(':').chars().all(|c| c == '-'))
}

/// Parses a table starting at `lines[0]` if it has the required shape —
/// one header row, one `-`-only separator row, and at least one data row
/// (§4.2). Returns the number of lines consumed and the built table, or
/// `None` if the shape doesn't hold (malformed tables fall back to
/// literal text).
fn try_parse_table(lines: &[&str]) -> Option<(usize, Table)> {
    let header = *lines.first()?;
    let separator = *lines.get(1)?;
    if !is_separator_row(separator) {
        return None;
    }
    let mut data_rows = Vec::new();
    let mut idx = 2;
    while idx < lines.len() && is_table_row(lines[idx]) {
        data_rows.push(lines[idx]);
        idx += 1;
    }
    if data_rows.is_empty() {
        return None;
    }
    Some((idx, build_table(header, &data_rows)))
}

fn heading_paragraph(level: u8, text: &str) -> Paragraph {
    let mut paragraph = Paragraph::new().style(&format!("Heading{level}"));
    for run in inline_runs(text) {
        paragraph = paragraph.add_run(run);
    }
    paragraph
}

fn horizontal_rule_paragraph() -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text("\u{2014}".repeat(20)))
}

fn code_paragraph(line: &str) -> Paragraph {
    Paragraph::new().add_run(
        Run::new()
            .add_text(line)
            .fonts(RunFonts::new().ascii("Courier New"))
            .color("2E7D32"),
    )
}

fn styled_paragraph(text: &str, style: &str) -> Paragraph {
    let mut paragraph = Paragraph::new();
    if style != "Normal" {
        paragraph = paragraph.style(style);
    }
    for run in inline_runs(text) {
        paragraph = paragraph.add_run(run);
    }
    paragraph
}

fn build_table(header: &str, data_rows: &[&str]) -> Table {
    let header_row = table_row(header, true);
    let mut table_rows = vec![header_row];
    table_rows.extend(data_rows.iter().map(|row| table_row(row, false)));
    Table::new(table_rows)
}

/// Builds one table row, bolding every cell's text when `is_header` —
/// the "bolded header row" of §4.2 — on top of whatever inline
/// formatting the cell text itself carries.
fn table_row(row: &str, is_header: bool) -> TableRow {
    let cells: Vec<TableRowChild> = table_cells(row)
        .into_iter()
        .map(|cell| {
            let mut paragraph = Paragraph::new();
            for run in inline_runs(cell) {
                paragraph = paragraph.add_run(if is_header { run.bold() } else { run });
            }
            TableRowChild::TableCell(TableCell::new().add_paragraph(paragraph))
        })
        .collect();
    TableRow::new(cells)
}

/// One inline span after resolving bold/italic/code/strike/link markers.
enum Span {
    Plain(String),
    Bold(String),
    Italic(String),
    Code(String),
    Strike(String),
    Link(String, String),
}

/// Single left-to-right pass over `text`, toggling bold/italic state as
/// `**`/`__` and `*`/`_` markers are seen, and carving out `` ` `` and
/// `~~` spans and `[text](url)` links as they're encountered. This
/// mirrors the original tool's run-building loop rather than a recursive
/// descent parser: the dialect guarantees markers are well-formed and
/// non-overlapping other than bold/italic nesting.
fn parse_spans(text: &str) -> Vec<Span> {
    let chars: Vec<char> = text.chars().collect();
    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut bold = false;
    let mut italic = false;
    let mut i = 0;

    let flush_plain = |plain: &mut String, spans: &mut Vec<Span>, bold: bool, italic: bool| {
        if plain.is_empty() {
            return;
        }
        let taken = std::mem::take(plain);
        spans.push(match (bold, italic) {
            (true, true) | (true, false) => Span::Bold(taken),
            (false, true) => Span::Italic(taken),
            (false, false) => Span::Plain(taken),
        });
    };

    while i < chars.len() {
        let c = chars[i];

        if (c == '*' || c == '_') && chars.get(i + 1) == Some(&c) {
            flush_plain(&mut plain, &mut spans, bold, italic);
            bold = !bold;
            i += 2;
            continue;
        }

        if c == '`' {
            flush_plain(&mut plain, &mut spans, bold, italic);
            if let Some(end) = chars[i + 1..].iter().position(|&c| c == '`') {
                let code: String = chars[i + 1..i + 1 + end].iter().collect();
                spans.push(Span::Code(code));
                i += end + 2;
                continue;
            }
            plain.push(c);
            i += 1;
            continue;
        }

        if c == '~' && chars.get(i + 1) == Some(&'~') {
            flush_plain(&mut plain, &mut spans, bold, italic);
            if let Some(end) = find_closing(&chars, i + 2, "~~") {
                let struck: String = chars[i + 2..end].iter().collect();
                spans.push(Span::Strike(struck));
                i = end + 2;
                continue;
            }
            plain.push('~');
            plain.push('~');
            i += 2;
            continue;
        }

        if c == '[' {
            if let Some((link_text, url, consumed)) = parse_link(&chars, i) {
                flush_plain(&mut plain, &mut spans, bold, italic);
                spans.push(Span::Link(link_text, url));
                i += consumed;
                continue;
            }
        }

        if c == '*' || c == '_' {
            flush_plain(&mut plain, &mut spans, bold, italic);
            italic = !italic;
            i += 1;
            continue;
        }

        plain.push(c);
        i += 1;
    }

    flush_plain(&mut plain, &mut spans, bold, italic);
    spans
}

fn find_closing(chars: &[char], from: usize, marker: &str) -> Option<usize> {
    let marker_chars: Vec<char> = marker.chars().collect();
    let mut i = from;
    while i + marker_chars.len() <= chars.len() {
        if chars[i..i + marker_chars.len()] == marker_chars[..] {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn parse_link(chars: &[char], start: usize) -> Option<(String, String, usize)> {
    let close_bracket = chars[start..].iter().position(|&c| c == ']')? + start;
    if chars.get(close_bracket + 1) != Some(&'(') {
        return None;
    }
    let close_paren = chars[close_bracket + 2..].iter().position(|&c| c == ')')? + close_bracket + 2;
    let text: String = chars[start + 1..close_bracket].iter().collect();
    let url: String = chars[close_bracket + 2..close_paren].iter().collect();
    Some((text, url, close_paren - start + 1))
}

fn inline_runs(text: &str) -> Vec<Run> {
    parse_spans(text)
        .into_iter()
        .map(|span| match span {
            Span::Plain(t) => Run::new().add_text(t),
            Span::Bold(t) => Run::new().add_text(t).bold(),
            Span::Italic(t) => Run::new().add_text(t).italic(),
            Span::Code(t) => Run::new()
                .add_text(t)
                .fonts(RunFonts::new().ascii("Courier New"))
                .color("2E7D32"),
            Span::Strike(t) => Run::new().add_text(t).strike(),
            Span::Link(t, url) => Run::new()
                .add_text(format!("{t} ({url})"))
                .color("1565C0")
                .underline("single"),
        })
        .collect()
}

/// Converts converter output into the `docx_rs` body-child values the
/// commit engine splices directly into a document's paragraph sequence.
#[must_use]
pub fn to_document_children(elements: Vec<DocElement>) -> Vec<docx_rs::DocumentChild> {
    elements
        .into_iter()
        .map(|element| match element {
            DocElement::Paragraph(p) => docx_rs::DocumentChild::Paragraph(Box::new(p)),
            DocElement::Table(t) => docx_rs::DocumentChild::Table(Box::new(t)),
        })
        .collect()
}

/// Extracts the plain text of a built paragraph, used by tests and by
/// the section store when it needs the rendered text without caring
/// about rich formatting.
#[must_use]
pub fn paragraph_plain_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                if let docx_rs::RunChild::Text(t) = run_child {
                    text.push_str(&t.text);
                }
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(elements: &[DocElement]) -> Vec<String> {
        elements
            .iter()
            .filter_map(|e| match e {
                DocElement::Paragraph(p) => Some(paragraph_plain_text(p)),
                DocElement::Table(_) => None,
            })
            .collect()
    }

    #[test]
    fn plain_paragraphs_accumulate_until_blank_line() {
        let md = "First line\nsecond line\n\nNext paragraph.";
        let elements = to_doc_elements(md, "Unrelated Heading");
        let rendered = render(&elements);
        assert_eq!(rendered.len(), 2);
        assert!(rendered[0].contains("First line second line"));
    }

    #[test]
    fn duplicate_leading_heading_is_suppressed() {
        let md = "## Overview\nSome body text.";
        let elements = to_doc_elements(md, "Overview");
        let rendered = render(&elements);
        assert_eq!(rendered.len(), 1);
        assert!(rendered[0].contains("Some body text"));
    }

    #[test]
    fn non_matching_heading_is_kept() {
        let md = "## Background\nBody.";
        let elements = to_doc_elements(md, "Overview");
        let rendered = render(&elements);
        assert_eq!(rendered.len(), 2);
        assert!(rendered[0].contains("Background"));
    }

    #[test]
    fn bold_and_italic_toggle_correctly() {
        let spans = parse_spans("plain **bold** and *italic* text");
        let rendered: Vec<&str> = spans
            .iter()
            .map(|s| match s {
                Span::Plain(t) | Span::Bold(t) | Span::Italic(t) => t.as_str(),
                _ => "",
            })
            .collect();
        assert!(rendered.contains(&"bold"));
        assert!(rendered.contains(&"italic"));
    }

    #[test]
    fn inline_code_and_strike_and_link_are_detected() {
        let spans = parse_spans("see `code` and ~~gone~~ and [docs](https://example.com)");
        let has_code = spans.iter().any(|s| matches!(s, Span::Code(t) if t == "code"));
        let has_strike = spans.iter().any(|s| matches!(s, Span::Strike(t) if t == "gone"));
        let has_link = spans
            .iter()
            .any(|s| matches!(s, Span::Link(t, u) if t == "docs" && u == "https://example.com"));
        assert!(has_code);
        assert!(has_strike);
        assert!(has_link);
    }

    #[test]
    fn fenced_code_block_becomes_one_paragraph_per_line() {
        let md = "```rust\nlet x = 1;\nlet y = 2;\n```";
        let elements = to_doc_elements(md, "Heading");
        assert_eq!(render(&elements).len(), 2);
    }

    #[test]
    fn horizontal_rule_is_detected() {
        let md = "above\n\n---\n\nbelow";
        let elements = to_doc_elements(md, "Heading");
        assert_eq!(render(&elements).len(), 3);
    }

    #[test]
    fn table_rows_become_a_table_element() {
        let md = "| A | B |\n| - | - |\n| 1 | 2 |";
        let elements = to_doc_elements(md, "Heading");
        assert_eq!(elements.len(), 1);
        assert!(matches!(elements[0], DocElement::Table(_)));
    }

    #[test]
    fn table_without_separator_row_falls_back_to_literal_text() {
        let md = "| A | B |\n| 1 | 2 |";
        let elements = to_doc_elements(md, "Heading");
        let rendered = render(&elements);
        assert_eq!(rendered.len(), 2);
        assert!(rendered[0].contains('A') && rendered[0].contains('B'));
    }

    #[test]
    fn table_with_separator_but_no_data_row_falls_back_to_literal_text() {
        let md = "| A | B |\n| - | - |";
        let elements = to_doc_elements(md, "Heading");
        let rendered = render(&elements);
        assert_eq!(rendered.len(), 2);
    }
}
