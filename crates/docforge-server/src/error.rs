//! Maps the workspace-wide [`docforge_core::Error`] to HTTP responses
//! (§7): this is the only place in the REST surface that does so.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use docforge_core::Error;
use serde_json::json;

/// Wraps a [`docforge_core::Error`] so it can be returned directly from
/// an axum handler.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::Validation(_) | Error::Parse(_) | Error::InvalidTransition(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Upstream { .. } | Error::Network(_) => StatusCode::BAD_GATEWAY,
            Error::Io(_) | Error::Storage(_) | Error::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.0.to_string(),
            "category": self.0.category(),
        }));
        (status, body).into_response()
    }
}
