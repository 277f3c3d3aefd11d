//! `/generate` and `/review` (§6.1): single-section generation, and the
//! out-of-scope review collaborator hook (§12 Non-goals).

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use docforge_core::{CommitMode, Error};
use docforge_llm::{build_prompt, CompletionRequest, PromptInput};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub document_id: String,
    pub section_id: String,
    pub mode: CommitMode,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub knowledge_collection_ids: Vec<String>,
    /// When `true`, the generated content is committed immediately;
    /// otherwise only returned for the caller to review first.
    #[serde(default)]
    pub commit: bool,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub content: String,
    pub tokens_used: u64,
    pub committed: bool,
}

pub async fn generate(
    State(state): State<AppState>,
    AuthUser(principal_id): AuthUser,
    Json(body): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let tree = state.store.tree(&body.document_id)?;
    let section = tree
        .find_by_id(&body.section_id)
        .ok_or_else(|| Error::NotFound(format!("section {}", body.section_id)))?
        .clone();

    let parent = section.parent.and_then(|idx| tree.sections.get(idx));
    let parent_content = parent.map(|p| p.content.clone());
    let parent_path = parent.map(|p| p.full_path.clone());

    let self_index = tree
        .sections
        .iter()
        .position(|s| s.section_id == section.section_id)
        .unwrap_or(0);
    let siblings: Vec<String> = tree
        .siblings_of(self_index)
        .into_iter()
        .map(|s| s.heading.clone())
        .collect();
    let outline = tree.render_outline();

    let credential = state.credentials.get(&principal_id);
    let base_url = credential
        .as_ref()
        .and_then(|c| c.base_url.clone())
        .unwrap_or_else(|| state.config.llm_base_url.clone());
    let api_key = credential
        .map(|c| c.api_key)
        .or_else(|| state.config.llm_api_key.clone())
        .unwrap_or_default();
    let settings = state.settings.get(&principal_id);

    let prompt = build_prompt(&PromptInput {
        section_name: &section.heading,
        parent_context: parent_path.as_deref(),
        mode: body.mode,
        master_template: docforge_llm::DEFAULT_MASTER_TEMPLATE,
        outline: Some(&outline),
        parent_content: parent_content.as_deref(),
        sibling_titles: &siblings,
        current_content: Some(&section.content),
        knowledge_collections: &body.knowledge_collection_ids,
    });

    let completion = state
        .llm
        .complete(&CompletionRequest {
            base_url,
            api_key,
            model: body.model.unwrap_or(settings.model),
            prompt,
            temperature: body.temperature.unwrap_or(settings.temperature),
            max_tokens: body.max_tokens.unwrap_or(settings.max_tokens),
            collection_ids: body.knowledge_collection_ids,
        })
        .await?;

    if body.commit {
        state.commit.commit(
            &state.store,
            &body.document_id,
            &section.full_path,
            &section.heading,
            &section.section_hash,
            &completion.content,
            body.mode,
        )?;
    }

    Ok(Json(GenerateResponse {
        content: completion.content,
        tokens_used: completion.tokens_used,
        committed: body.commit,
    }))
}

/// `/review` is out of scope (§12 Non-goals): it always returns this
/// fixed placeholder, never real scoring logic.
pub async fn review(AuthUser(_principal_id): AuthUser) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "not_implemented",
        "message": "review scoring is outside this service's scope",
    }))
}
