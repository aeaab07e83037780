//! HTTP client for the managed database control plane.
//!
//! This crate provides a thin request/response facade over the provider's
//! REST API. It attaches bearer authentication, sends JSON bodies and
//! reports transport failures as errors distinct from HTTP statuses.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────┐     ┌──────────────────────┐
//! │  Orchestrators    │────▶│  ControlPlaneClient  │
//! │  (dbforge-control)│     │  (trait)             │
//! └───────────────────┘     └──────────┬───────────┘
//!                                     │
//!                         ┌───────────▼────────────┐
//!                         │ HttpControlPlaneClient │
//!                         │ (reqwest)              │
//!                         └───────────┬────────────┘
//!                                     │ HTTPS
//!                         ┌───────────▼────────────┐
//!                         │  Provider API          │
//!                         │  /v2/databases         │
//!                         └────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use dbforge_client::{ClientConfig, ControlPlaneClient, HttpControlPlaneClient, Method};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpControlPlaneClient::new(&ClientConfig::new("dop_v1_example"))?;
//!
//! let response = client.request(Method::Get, "/databases/", None).await?;
//! println!("{} {}", response.status, response.body);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::fmt;
use std::time::Duration;

pub mod client;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod scripted;

pub use client::{ApiResponse, ControlPlaneClient, HttpControlPlaneClient, Method};
pub use error::{ClientError, Result};

#[cfg(any(test, feature = "test-utils"))]
pub use scripted::{RecordedRequest, ScriptedClient};

/// Default provider API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.digitalocean.com/v2";

/// Configuration for connecting to the control plane.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the API, e.g. `https://api.digitalocean.com/v2`.
    pub base_url: String,
    /// Bearer token attached to every request.
    pub token: String,
    /// Overall per-request timeout, in seconds.
    pub request_timeout_seconds: u64,
    /// Connection establishment timeout, in seconds.
    pub connect_timeout_seconds: u64,
}

impl ClientConfig {
    /// Create a configuration for the default endpoint.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.into(),
            request_timeout_seconds: client::DEFAULT_REQUEST_TIMEOUT.as_secs(),
            connect_timeout_seconds: client::DEFAULT_CONNECT_TIMEOUT.as_secs(),
        }
    }

    /// Point the client at a different endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Get the connect timeout as a `Duration`.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("connect_timeout_seconds", &self.connect_timeout_seconds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ClientConfig::new("tok");
        assert_eq!(config.base_url, "https://api.digitalocean.com/v2");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn config_debug_redacts_token() {
        let config = ClientConfig::new("dop_v1_secret");
        assert!(!format!("{config:?}").contains("dop_v1_secret"));
    }

    #[test]
    fn invalid_token_is_not_retriable() {
        assert!(!ClientError::InvalidToken("empty".into()).is_retriable());
    }
}
