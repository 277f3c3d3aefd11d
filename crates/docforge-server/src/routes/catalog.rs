//! `/models` and `/collections` (§6.1): thin proxies onto the configured
//! LLM endpoint's own catalog listings.

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use docforge_core::Error;
use docforge_core::utils::safe_truncate;

async fn proxy_get(
    state: &AppState,
    principal_id: &str,
    path: &str,
) -> Result<serde_json::Value, ApiError> {
    let credential = state.credentials.get(principal_id);
    let base_url = credential
        .as_ref()
        .and_then(|c| c.base_url.clone())
        .unwrap_or_else(|| state.config.llm_base_url.clone());
    let api_key = credential
        .map(|c| c.api_key)
        .or_else(|| state.config.llm_api_key.clone())
        .unwrap_or_default();

    let url = format!("{}{path}", base_url.trim_end_matches('/'));
    let client = reqwest::Client::new();
    let response = client
        .get(&url)
        .bearer_auth(&api_key)
        .send()
        .await
        .map_err(Error::Network)?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Upstream {
            status: status.as_u16(),
            body: safe_truncate(&body, 2000).to_string(),
        }
        .into());
    }

    response.json().await.map_err(Error::Network).map_err(ApiError::from)
}

pub async fn models(
    State(state): State<AppState>,
    AuthUser(principal_id): AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(proxy_get(&state, &principal_id, "/api/models").await?))
}

pub async fn collections(
    State(state): State<AppState>,
    AuthUser(principal_id): AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        proxy_get(&state, &principal_id, "/api/collections").await?,
    ))
}
