//! `/config` (§6.1): per-principal LLM endpoint, key, model, temperature,
//! and max_tokens. `GET` never echoes the bearer token back (§11
//! SPEC_FULL config redaction).

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use docforge_core::Credential;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SetConfigRequest {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub base_url: String,
    pub api_key_configured: bool,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

pub async fn get_config(
    State(state): State<AppState>,
    AuthUser(principal_id): AuthUser,
) -> Json<ConfigResponse> {
    let credential = state.credentials.get(&principal_id);
    let settings = state.settings.get(&principal_id);
    Json(ConfigResponse {
        base_url: credential
            .as_ref()
            .and_then(|c| c.base_url.clone())
            .unwrap_or_else(|| state.config.llm_base_url.clone()),
        api_key_configured: credential.is_some() || state.config.llm_api_key.is_some(),
        model: settings.model,
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
    })
}

pub async fn set_config(
    State(state): State<AppState>,
    AuthUser(principal_id): AuthUser,
    Json(body): Json<SetConfigRequest>,
) -> Result<Json<ConfigResponse>, ApiError> {
    let mut settings = state.settings.get(&principal_id);
    if let Some(model) = body.model {
        settings.model = model;
    }
    if let Some(temperature) = body.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(docforge_core::Error::Validation(
                "temperature must be within [0, 2]".to_string(),
            )
            .into());
        }
        settings.temperature = temperature;
    }
    if let Some(max_tokens) = body.max_tokens {
        settings.max_tokens = max_tokens;
    }
    state.settings.set(&principal_id, settings.clone());

    if body.base_url.is_some() || body.api_key.is_some() {
        let existing = state.credentials.get(&principal_id);
        let api_key = body
            .api_key
            .or_else(|| existing.as_ref().map(|c| c.api_key.clone()))
            .unwrap_or_default();
        let base_url = body.base_url.or_else(|| existing.and_then(|c| c.base_url));
        state
            .credentials
            .set(&principal_id, Credential { base_url, api_key });
    }

    let credential = state.credentials.get(&principal_id);
    Ok(Json(ConfigResponse {
        base_url: credential
            .as_ref()
            .and_then(|c| c.base_url.clone())
            .unwrap_or_else(|| state.config.llm_base_url.clone()),
        api_key_configured: credential.is_some() || state.config.llm_api_key.is_some(),
        model: settings.model,
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
    }))
}
