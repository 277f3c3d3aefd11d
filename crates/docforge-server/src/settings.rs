//! Per-principal generation defaults (model, temperature, max_tokens):
//! the non-secret half of `/config` (§6.1). The secret half — endpoint
//! and bearer token — lives in [`docforge_core::CredentialStore`]; this
//! keeps that trait scoped to what it was grounded on (a secret store)
//! rather than growing sampling-parameter fields it was never meant to
//! hold.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Sampling defaults a principal's `/generate` and `/batch/start` calls
/// fall back to when the request body doesn't override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// In-memory registry of per-principal [`GenerationSettings`].
#[derive(Default)]
pub struct SettingsStore {
    entries: RwLock<HashMap<String, GenerationSettings>>,
}

impl SettingsStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, principal_id: &str) -> GenerationSettings {
        self.entries
            .read()
            .expect("settings store lock poisoned")
            .get(principal_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set(&self, principal_id: &str, settings: GenerationSettings) {
        self.entries
            .write()
            .expect("settings store lock poisoned")
            .insert(principal_id.to_string(), settings);
    }
}
