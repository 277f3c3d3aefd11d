//! Error types shared by every docforge crate.
//!
//! `docforge-core`, `docforge-llm`, and `docforge-jobs` all return
//! `Result<T, Error>`. The REST surface (`docforge-server`) is the only
//! place that maps these into HTTP status codes — see §7 of the design
//! notes for the kind → status mapping.

use thiserror::Error;

/// The error type shared across the workspace.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed (reading the uploaded document, writing a
    /// sidecar, creating a backup).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote LLM endpoint could not be reached, or the transport
    /// itself failed (DNS, TLS, timeout before a response was received).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The LLM endpoint responded with a non-2xx status. The original
    /// HTTP status is preserved so the REST surface can map it to 502.
    #[error("upstream LLM error ({status}): {body}")]
    Upstream {
        /// Status code returned by the chat-completions endpoint.
        status: u16,
        /// Response body, truncated for logging.
        body: String,
    },

    /// A `.docx` package, markdown fragment, or stored JSON could not be
    /// parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// A requested document, section, or job id does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request failed an authentication or authorization check.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The request was well-formed JSON but violated a field invariant
    /// (e.g. `temperature` out of `[0,2]`, an unknown `mode`).
    #[error("invalid input: {0}")]
    Validation(String),

    /// A local storage operation (sidecar write, backup, save) failed for
    /// reasons not covered by `Io` — e.g. a repeated file-in-use condition
    /// after exhausting retries.
    #[error("storage error: {0}")]
    Storage(String),

    /// The job scheduler hit a condition its state machine does not
    /// allow (e.g. `pause` on a job that is not `RUNNING`).
    #[error("invalid job transition: {0}")]
    InvalidTransition(String),

    /// Catch-all for `serde_json` serialization round-trips (the edit-state
    /// sidecar and stream-event payloads).
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl Error {
    /// Whether the failure is plausibly transient and worth surfacing to
    /// a caller as retryable (used by the scheduler's section-level retry
    /// decision — currently informational only, since §4.5 mandates no
    /// automatic retries).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            Self::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// A short, stable category tag for logging/metrics.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Network(_) => "network",
            Self::Upstream { .. } => "upstream",
            Self::Parse(_) => "parse",
            Self::NotFound(_) => "not_found",
            Self::Unauthorized(_) => "unauthorized",
            Self::Validation(_) => "validation",
            Self::Storage(_) => "storage",
            Self::InvalidTransition(_) => "invalid_transition",
            Self::Serialization(_) => "serialization",
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;
