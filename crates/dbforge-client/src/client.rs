//! Request/response facade over the provider's HTTP API.
//!
//! The [`ControlPlaneClient`] trait is the only seam the orchestrators
//! depend on: one verb, one path, an optional JSON body, and back comes
//! the raw status and body text. No retries and no interpretation of the
//! status happen here.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::ClientConfig;

/// HTTP verbs used by the control plane API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl Method {
    /// The verb as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Returns true for verbs that change provider state.
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        !matches!(self, Self::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
        }
    }
}

/// Raw response from the control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, possibly empty.
    pub body: String,
}

impl ApiResponse {
    /// Create a response from a status and body.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }

    /// Decode the body leniently: `null` when empty, the raw text as a JSON
    /// string when it is not JSON.
    #[must_use]
    pub fn payload(&self) -> Value {
        if self.body.trim().is_empty() {
            return Value::Null;
        }
        serde_json::from_str(&self.body).unwrap_or_else(|_| Value::String(self.body.clone()))
    }
}

/// Trait for control plane communication.
///
/// This trait abstracts the transport, allowing scripted implementations
/// in tests.
#[async_trait]
pub trait ControlPlaneClient: Send + Sync {
    /// Perform one request.
    ///
    /// `path` is relative to the API base URL and starts with `/`. When
    /// `body` is present it is sent as JSON.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if no response was received. Any
    /// response, whatever its status, is returned as `Ok`.
    async fn request(&self, method: Method, path: &str, body: Option<&Value>)
        -> Result<ApiResponse>;
}

/// `reqwest`-backed control plane client.
///
/// Every call carries `Authorization: Bearer <token>`; calls with a body
/// also carry `Content-Type: application/json`.
#[derive(Clone)]
pub struct HttpControlPlaneClient {
    client: reqwest::Client,
    base_url: String,
    auth: HeaderValue,
}

impl HttpControlPlaneClient {
    /// Create a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidToken` if the token is empty or not a
    /// valid header value, or `ClientError::Build` if the TLS backend fails
    /// to initialise.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(ClientError::Build)?;

        Self::with_client(client, config)
    }

    /// Create a new client with a custom reqwest client.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidToken` if the token is empty or not a
    /// valid header value.
    pub fn with_client(client: reqwest::Client, config: &ClientConfig) -> Result<Self> {
        let token = config.token.trim();
        if token.is_empty() {
            return Err(ClientError::InvalidToken("token is empty".to_string()));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ClientError::InvalidToken("token contains invalid characters".to_string()))?;
        auth.set_sensitive(true);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    /// Get the base URL requests are made against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

impl fmt::Debug for HttpControlPlaneClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpControlPlaneClient")
            .field("base_url", &self.base_url)
            .field("auth", &"Bearer <redacted>")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ControlPlaneClient for HttpControlPlaneClient {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse> {
        let url = self.url(path);

        let mut request = self
            .client
            .request(method.into(), &url)
            .header(AUTHORIZATION, self.auth.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let transport = |source| ClientError::Transport {
            method,
            path: path.to_string(),
            source,
        };

        let response = request.send().await.map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport)?;

        tracing::debug!(method = %method, path, status, "Control plane responded");

        Ok(ApiResponse { status, body })
    }
}

/// Default request timeout.
pub(crate) const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connect timeout.
pub(crate) const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
