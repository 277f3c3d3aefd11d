//! Prompt Builder (C4): assembles a single `user`-role prompt from a
//! master template, section metadata, ancestor content, sibling names,
//! and mode (§4.4).
//!
//! The builder is a pure function: the same [`PromptInput`] always
//! produces the byte-identical prompt. Every generation callsite —
//! single-section `/generate`, batch jobs, and (per §9) any future
//! regenerate-with-edited-prompt or model-comparison feature — goes
//! through this one function instead of assembling its own string.

use docforge_core::CommitMode;

/// Default master template substituted at construction step 1 (§4.4).
/// Callers may override it per job/request; the builder itself doesn't
/// care where the template came from.
pub const DEFAULT_MASTER_TEMPLATE: &str = "You are drafting the \"{section_name}\" section of a document.\nParent context: {parent_context}\nOperation mode: {operation_mode}";

/// Everything the builder needs to construct one prompt, gathered by the
/// caller (REST handler or Job Scheduler) from the Section Store.
pub struct PromptInput<'a> {
    /// The target section's own heading text.
    pub section_name: &'a str,
    /// `" > "`-joined ancestor path, or `None` for a root-level section
    /// (renders as `"Root level"`).
    pub parent_context: Option<&'a str>,
    pub mode: CommitMode,
    pub master_template: &'a str,
    /// Indented pre-order outline of the whole document, when available.
    pub outline: Option<&'a str>,
    /// The parent's content — preferring, per §4.6, a result already
    /// produced earlier in the same job over what's on disk. `None` or
    /// whitespace-only is treated as "no parent content to propagate".
    pub parent_content: Option<&'a str>,
    /// Sibling section titles, for the distinctness instruction.
    pub sibling_titles: &'a [String],
    /// The section's current content, included for `REWORK`/`APPEND`.
    pub current_content: Option<&'a str>,
    pub knowledge_collections: &'a [String],
}

/// Builds the prompt per the construction order in §4.4.
#[must_use]
pub fn build_prompt(input: &PromptInput<'_>) -> String {
    let mut prompt = input
        .master_template
        .replace("{section_name}", input.section_name)
        .replace(
            "{parent_context}",
            input.parent_context.filter(|c| !c.is_empty()).unwrap_or("Root level"),
        )
        .replace("{operation_mode}", input.mode.as_str());

    if let Some(outline) = input.outline {
        prompt.push_str("\n\nDOCUMENT OUTLINE:\n");
        prompt.push_str(outline);
    }

    if let Some(parent_content) = input.parent_content.filter(|c| !c.trim().is_empty()) {
        prompt.push_str("\n\nPARENT SECTION CONTENT:\n");
        prompt.push_str(parent_content);
        prompt.push_str(
            "\n\nAlignment instructions:\n\
             1. Expand upon the parent section's content.\n\
             2. Reuse the parent's terminology.\n\
             3. Reference concepts introduced in the parent.\n\
             4. Be a logical subdivision of the parent.\n\
             5. Do not contradict the parent.",
        );
    }

    if !input.sibling_titles.is_empty() {
        prompt.push_str("\n\nSIBLING SECTIONS (stay distinct from these): ");
        prompt.push_str(&input.sibling_titles.join(", "));
    }

    match input.mode {
        CommitMode::Replace => {
            prompt.push_str("\n\nWrite this section's content from scratch.");
        }
        CommitMode::Rework => {
            prompt.push_str("\n\nCURRENT CONTENT:\n");
            prompt.push_str(input.current_content.unwrap_or(""));
            prompt.push_str("\n\nRewrite and enhance the content above.");
        }
        CommitMode::Append => {
            prompt.push_str("\n\nCURRENT CONTENT:\n");
            prompt.push_str(input.current_content.unwrap_or(""));
            prompt.push_str("\n\nExtend the content above with additional material.");
        }
    }

    if !input.knowledge_collections.is_empty() {
        prompt.push_str("\n\nGround your response in the following knowledge collections: ");
        prompt.push_str(&input.knowledge_collections.join(", "));
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input<'a>(mode: CommitMode) -> PromptInput<'a> {
        PromptInput {
            section_name: "Child",
            parent_context: Some("Parent"),
            mode,
            master_template: DEFAULT_MASTER_TEMPLATE,
            outline: None,
            parent_content: None,
            sibling_titles: &[],
            current_content: None,
            knowledge_collections: &[],
        }
    }

    #[test]
    fn substitutes_template_placeholders() {
        let input = base_input(CommitMode::Replace);
        let prompt = build_prompt(&input);
        assert!(prompt.contains("\"Child\""));
        assert!(prompt.contains("Parent context: Parent"));
        assert!(prompt.contains("Operation mode: REPLACE"));
    }

    #[test]
    fn root_level_section_has_no_parent_context() {
        let mut input = base_input(CommitMode::Replace);
        input.parent_context = None;
        let prompt = build_prompt(&input);
        assert!(prompt.contains("Parent context: Root level"));
    }

    #[test]
    fn parent_content_triggers_alignment_block_and_marker() {
        let mut input = base_input(CommitMode::Replace);
        input.parent_content = Some("Parent prose.");
        let prompt = build_prompt(&input);
        assert!(prompt.contains("PARENT SECTION CONTENT"));
        assert!(prompt.contains("Parent prose."));
        assert!(prompt.contains("logical subdivision"));
    }

    #[test]
    fn whitespace_only_parent_content_is_treated_as_absent() {
        let mut input = base_input(CommitMode::Replace);
        input.parent_content = Some("   \n  ");
        let prompt = build_prompt(&input);
        assert!(!prompt.contains("PARENT SECTION CONTENT"));
    }

    #[test]
    fn rework_mode_includes_current_content_and_rewrite_instruction() {
        let mut input = base_input(CommitMode::Rework);
        input.current_content = Some("Old text.");
        let prompt = build_prompt(&input);
        assert!(prompt.contains("CURRENT CONTENT"));
        assert!(prompt.contains("Old text."));
        assert!(prompt.contains("Rewrite and enhance"));
    }

    #[test]
    fn append_mode_instructs_extension_not_rewrite() {
        let mut input = base_input(CommitMode::Append);
        input.current_content = Some("Old text.");
        let prompt = build_prompt(&input);
        assert!(prompt.contains("Extend the content above"));
    }

    #[test]
    fn siblings_and_collections_are_appended_when_present() {
        let siblings = vec!["Sibling A".to_string(), "Sibling B".to_string()];
        let collections = vec!["kb-1".to_string()];
        let mut input = base_input(CommitMode::Replace);
        input.sibling_titles = &siblings;
        input.knowledge_collections = &collections;
        let prompt = build_prompt(&input);
        assert!(prompt.contains("Sibling A, Sibling B"));
        assert!(prompt.contains("kb-1"));
    }

    #[test]
    fn builder_is_deterministic() {
        let input = base_input(CommitMode::Replace);
        assert_eq!(build_prompt(&input), build_prompt(&input));
    }
}
