//! Client error types.

use thiserror::Error;

use crate::client::Method;

/// A result type using `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur while talking to the control plane.
///
/// A non-2xx status is not an error at this layer; it comes back as an
/// [`ApiResponse`](crate::ApiResponse) for the caller to classify.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No response was received (DNS, connect, reset, timeout).
    #[error("transport failure on {method} {path}: {source}")]
    Transport {
        /// Verb of the failed call.
        method: Method,
        /// Path of the failed call.
        path: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The API token is empty or cannot be sent as a header value.
    #[error("invalid API token: {0}")]
    InvalidToken(String),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

impl ClientError {
    /// Returns `true` if the call may succeed when repeated.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}
