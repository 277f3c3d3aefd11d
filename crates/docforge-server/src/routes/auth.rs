//! `/auth/*` (§6.1): register and log in against the in-memory
//! [`crate::auth::PrincipalStore`], and report the current principal.

use crate::auth::{issue_token, AuthUser};
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct PrincipalResponse {
    pub id: String,
    pub username: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<Json<PrincipalResponse>, ApiError> {
    let principal = state.principals.create(&body.username, &body.password)?;
    Ok(Json(PrincipalResponse {
        id: principal.id,
        username: principal.username,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<Json<TokenResponse>, ApiError> {
    let principal = state.principals.verify(&body.username, &body.password)?;
    let token = issue_token(&state.config.jwt_secret, &principal.id)?;
    Ok(Json(TokenResponse { token }))
}

pub async fn me(
    State(state): State<AppState>,
    AuthUser(principal_id): AuthUser,
) -> Result<Json<PrincipalResponse>, ApiError> {
    let principal = state.principals.get(&principal_id)?;
    Ok(Json(PrincipalResponse {
        id: principal.id,
        username: principal.username,
    }))
}
