//! Runtime configuration for the orchestrator.
//!
//! Unlike the teacher's TOML-file-layered configuration, docforge is a
//! service process and is configured the way services usually are:
//! entirely from environment variables, read once at startup (§6.5).
//!
//! ## Example
//!
//! ```rust,no_run
//! use docforge_core::Config;
//!
//! let config = Config::from_env()?;
//! println!("listening on {}:{}", config.api_host, config.api_port);
//! # Ok::<(), docforge_core::Error>(())
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::sync::RwLock;

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_api_port() -> u16 {
    8000
}

const fn default_llm_timeout_s() -> u64 {
    300
}

const fn default_max_upload_bytes() -> u64 {
    52_428_800
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://localhost:3000".to_string(),
    ]
}

/// Process-wide configuration, read once from the environment at startup
/// (§6.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Bind host for the REST/WebSocket listener. `DOCFORGE_API_HOST`.
    #[serde(default = "default_api_host")]
    pub api_host: String,
    /// Bind port. `DOCFORGE_API_PORT`.
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Directory where uploaded documents and sidecars are stored.
    /// `DOCFORGE_UPLOAD_DIR`.
    pub upload_dir: PathBuf,
    /// Base URL of the chat-completions endpoint. `DOCFORGE_LLM_BASE_URL`.
    pub llm_base_url: String,
    /// Default bearer token for the LLM endpoint, used when a principal has
    /// no credential of their own. `DOCFORGE_LLM_API_KEY`.
    pub llm_api_key: Option<String>,
    /// Per-request timeout for the LLM client, in seconds.
    /// `DOCFORGE_LLM_TIMEOUT_S`.
    #[serde(default = "default_llm_timeout_s")]
    pub llm_timeout_s: u64,
    /// Maximum accepted upload size in bytes. `DOCFORGE_MAX_UPLOAD_BYTES`.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    /// Allowed CORS origins, comma-separated in the environment.
    /// `DOCFORGE_CORS_ORIGINS`.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    /// HMAC signing secret for issued JWTs. `DOCFORGE_JWT_SECRET`.
    pub jwt_secret: String,
}

impl Config {
    /// Reads configuration from environment variables, applying the
    /// defaults documented on each field. `DOCFORGE_UPLOAD_DIR`,
    /// `DOCFORGE_LLM_BASE_URL`, and `DOCFORGE_JWT_SECRET` are required.
    pub fn from_env() -> Result<Self> {
        let api_host = env::var("DOCFORGE_API_HOST").unwrap_or_else(|_| default_api_host());
        let api_port = env::var("DOCFORGE_API_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_api_port);
        let upload_dir = env::var("DOCFORGE_UPLOAD_DIR")
            .map(PathBuf::from)
            .map_err(|_| {
                Error::Validation("DOCFORGE_UPLOAD_DIR must be set".to_string())
            })?;
        let llm_base_url = env::var("DOCFORGE_LLM_BASE_URL").map_err(|_| {
            Error::Validation("DOCFORGE_LLM_BASE_URL must be set".to_string())
        })?;
        let llm_api_key = env::var("DOCFORGE_LLM_API_KEY").ok();
        let llm_timeout_s = env::var("DOCFORGE_LLM_TIMEOUT_S")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_llm_timeout_s);
        let max_upload_bytes = env::var("DOCFORGE_MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_max_upload_bytes);
        let cors_origins = env::var("DOCFORGE_CORS_ORIGINS")
            .ok()
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_else(default_cors_origins);
        let jwt_secret = env::var("DOCFORGE_JWT_SECRET").map_err(|_| {
            Error::Validation("DOCFORGE_JWT_SECRET must be set".to_string())
        })?;

        Ok(Self {
            api_host,
            api_port,
            upload_dir,
            llm_base_url,
            llm_api_key,
            llm_timeout_s,
            max_upload_bytes,
            cors_origins,
            jwt_secret,
        })
    }

    /// A redacted view suitable for `GET /config` (§11 SPEC_FULL — the
    /// bearer token is never echoed back).
    #[must_use]
    pub fn redacted(&self) -> RedactedConfig {
        RedactedConfig {
            api_host: self.api_host.clone(),
            api_port: self.api_port,
            llm_base_url: self.llm_base_url.clone(),
            llm_api_key_configured: self.llm_api_key.is_some(),
            llm_timeout_s: self.llm_timeout_s,
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

/// The subset of [`Config`] safe to return over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactedConfig {
    pub api_host: String,
    pub api_port: u16,
    pub llm_base_url: String,
    pub llm_api_key_configured: bool,
    pub llm_timeout_s: u64,
    pub max_upload_bytes: u64,
}

/// A per-principal LLM credential: an endpoint override and bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub base_url: Option<String>,
    pub api_key: String,
}

/// Resolves LLM credentials for a principal.
///
/// This is explicitly a stand-in for an external secret store (§1
/// Non-goals); the in-memory implementation below does not persist
/// across restarts.
pub trait CredentialStore: Send + Sync {
    /// Returns the credential configured for `principal_id`, if any.
    fn get(&self, principal_id: &str) -> Option<Credential>;
    /// Sets or replaces the credential for `principal_id`.
    fn set(&self, principal_id: &str, credential: Credential);
}

/// In-memory [`CredentialStore`]. Fine for a single-process deployment or
/// tests; anything durable needs a different implementation of the trait.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    entries: RwLock<HashMap<String, Credential>>,
}

impl InMemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn get(&self, principal_id: &str) -> Option<Credential> {
        self.entries
            .read()
            .expect("credential store lock poisoned")
            .get(principal_id)
            .cloned()
    }

    fn set(&self, principal_id: &str, credential: Credential) {
        self.entries
            .write()
            .expect("credential store lock poisoned")
            .insert(principal_id.to_string(), credential);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_store_round_trip() {
        let store = InMemoryCredentialStore::new();
        assert!(store.get("alice").is_none());
        store.set(
            "alice",
            Credential {
                base_url: None,
                api_key: "sk-test".to_string(),
            },
        );
        let cred = store.get("alice").expect("credential present");
        assert_eq!(cred.api_key, "sk-test");
    }

    #[test]
    fn redacted_config_hides_key() {
        let config = Config {
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
            upload_dir: PathBuf::from("/tmp/docforge"),
            llm_base_url: "https://llm.example.com".to_string(),
            llm_api_key: Some("secret".to_string()),
            llm_timeout_s: 120,
            max_upload_bytes: 1024,
            cors_origins: vec![],
            jwt_secret: "sekret".to_string(),
        };
        let redacted = serde_json::to_value(config.redacted()).unwrap();
        assert!(redacted.get("api_key").is_none());
        assert_eq!(redacted["llm_api_key_configured"], true);
    }
}
