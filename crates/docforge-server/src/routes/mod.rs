//! REST Surface (C9, §4.9, §6.1): thin handlers with no business logic
//! beyond input validation and authentication — everything else is
//! delegated to `docforge-core`/`docforge-llm`/`docforge-jobs`.

mod auth;
mod batch;
mod catalog;
mod config;
mod documents;
mod generate;
mod stream;

use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;

/// Builds the full router, every path exactly as listed in §6.1.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/me", get(auth::me))
        .route("/config", get(config::get_config).post(config::set_config))
        .route("/models", get(catalog::models))
        .route("/collections", get(catalog::collections))
        .route("/documents/upload", post(documents::upload))
        .route("/documents", get(documents::list))
        .route("/documents/{id}", get(documents::get).delete(documents::remove))
        .route("/documents/{id}/commit", post(documents::commit))
        .route("/documents/{id}/download", get(documents::download))
        .route("/generate", post(generate::generate))
        .route("/review", post(generate::review))
        .route("/batch/start", post(batch::start))
        .route("/batch/{job}/status", get(batch::status))
        .route("/batch/{job}/pause", post(batch::pause))
        .route("/batch/{job}/resume", post(batch::resume))
        .route("/batch/{job}/cancel", post(batch::cancel))
        .route("/ws/{client_id}", get(stream::ws_handler))
        .with_state(state)
}
