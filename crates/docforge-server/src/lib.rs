//! # docforge-server
//!
//! REST and WebSocket surface (C9, §4.9) for the docforge generation
//! orchestrator: thin HTTP handlers over `docforge-core`,
//! `docforge-llm`, and `docforge-jobs`, plus the auth stand-in that lets
//! the rest of the surface be authenticated end-to-end (§11 SPEC_FULL).

/// Auth stand-in: principals, password hashing, and bearer tokens.
pub mod auth;
/// In-memory document ownership registry.
pub mod documents;
/// HTTP error mapping (§7).
pub mod error;
/// Route handlers, grouped by resource (§6.1).
pub mod routes;
/// Per-principal generation defaults.
pub mod settings;
/// Shared application state.
pub mod state;

pub use routes::router;
pub use state::AppState;
