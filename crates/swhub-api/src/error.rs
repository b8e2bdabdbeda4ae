use reqwest::StatusCode;
use thiserror::Error;

/// Top-level error type for the `swhub-api` crate.
///
/// Only handshake-step failures and retry exhaustion ever reach a caller
/// as an `Error`. Per-category failures are folded into error markers
/// inside [`FetchResult`](crate::FetchResult) instead.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    // ── Device ──────────────────────────────────────────────────────
    /// The switch answered with a non-success status.
    ///
    /// A `400 Bad Request` here is how the device reports that another
    /// management session still holds the exclusive lock.
    #[error("HTTP Error {}: {}", .status.as_u16(), .status.canonical_reason().unwrap_or("Unknown"))]
    Status { status: StatusCode, url: String },

    // ── Recovery ────────────────────────────────────────────────────
    /// Every attempt hit the session-conflict signature.
    #[error("switch kept refusing the session after {attempts} attempts (another session may still be active)")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<Error>,
    },
}

impl Error {
    /// Map a `reqwest` failure, separating timeouts from other transport errors.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout { timeout_secs }
        } else {
            Self::Transport(err)
        }
    }

    /// Returns `true` if this is the device's session-conflict response.
    ///
    /// The switch refuses a new login with `400 Bad Request` while a
    /// previous session is still being torn down on its side.
    pub fn is_session_conflict(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status == StatusCode::BAD_REQUEST,
            _ => false,
        }
    }

    /// Returns `true` if the switch could not be reached at all.
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_connect())
    }
}
