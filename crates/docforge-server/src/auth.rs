//! Auth stand-in (§11 SPEC_FULL): password-hashed principals and
//! HS256-signed bearer tokens.
//!
//! This is explicitly not a production identity provider — it exists so
//! every other endpoint in §6.1 can be exercised end-to-end behind a
//! real `Authorization: Bearer` check. Swapping it for a real user store
//! means implementing [`PrincipalStore`] against one.

use crate::error::ApiError;
use crate::state::AppState;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration as ChronoDuration, Utc};
use docforge_core::Error;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// A registered principal: the bits the auth surface needs plus a
/// password hash, never the plaintext.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub id: String,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
}

/// Resolves and creates principals. A stand-in for an external identity
/// provider (§1 Non-goals).
pub trait PrincipalStore: Send + Sync {
    fn create(&self, username: &str, password: &str) -> docforge_core::Result<Principal>;
    fn verify(&self, username: &str, password: &str) -> docforge_core::Result<Principal>;
    fn get(&self, id: &str) -> docforge_core::Result<Principal>;
}

/// In-memory [`PrincipalStore`]; entries do not survive a restart.
#[derive(Default)]
pub struct InMemoryPrincipalStore {
    by_username: RwLock<HashMap<String, Principal>>,
}

impl InMemoryPrincipalStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PrincipalStore for InMemoryPrincipalStore {
    fn create(&self, username: &str, password: &str) -> docforge_core::Result<Principal> {
        let mut principals = self
            .by_username
            .write()
            .expect("principal store lock poisoned");
        if principals.contains_key(username) {
            return Err(Error::Validation(format!(
                "username {username} already registered"
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Validation(format!("could not hash password: {e}")))?
            .to_string();

        let principal = Principal {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash,
        };
        principals.insert(username.to_string(), principal.clone());
        Ok(principal)
    }

    fn verify(&self, username: &str, password: &str) -> docforge_core::Result<Principal> {
        let principals = self
            .by_username
            .read()
            .expect("principal store lock poisoned");
        let principal = principals
            .get(username)
            .ok_or_else(|| Error::Unauthorized("invalid username or password".to_string()))?;

        let hash = PasswordHash::new(&principal.password_hash)
            .map_err(|e| Error::Storage(format!("corrupt password hash: {e}")))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .map_err(|_| Error::Unauthorized("invalid username or password".to_string()))?;

        Ok(principal.clone())
    }

    fn get(&self, id: &str) -> docforge_core::Result<Principal> {
        self.by_username
            .read()
            .expect("principal store lock poisoned")
            .values()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("principal {id}")))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// Issues a 24-hour bearer token for `principal_id`.
pub fn issue_token(jwt_secret: &str, principal_id: &str) -> docforge_core::Result<String> {
    let claims = Claims {
        sub: principal_id.to_string(),
        exp: (Utc::now() + ChronoDuration::hours(24)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|e| Error::Unauthorized(format!("could not issue token: {e}")))
}

fn verify_token(jwt_secret: &str, token: &str) -> docforge_core::Result<String> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| Error::Unauthorized(format!("invalid bearer token: {e}")))?;
    Ok(data.claims.sub)
}

/// The authenticated principal id for the current request, extracted
/// from the `Authorization: Bearer` header (§6.1 — unauthenticated
/// calls to a protected route return 401).
pub struct AuthUser(pub String);

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::Unauthorized("missing Authorization header".to_string()))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| Error::Unauthorized("expected a Bearer token".to_string()))?;
        let principal_id = verify_token(&app_state.config.jwt_secret, token)?;
        Ok(Self(principal_id))
    }
}
