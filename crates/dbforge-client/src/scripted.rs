//! In-memory control plane client for tests.
//!
//! Responses are queued per `(method, path)`. Each call pops the next queued
//! response; the last one stays in place and is repeated, which keeps
//! listing endpoints simple to script. Every call is recorded.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::client::{ApiResponse, ControlPlaneClient, Method};
use crate::error::Result;

/// A request seen by [`ScriptedClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// Verb.
    pub method: Method,
    /// Path relative to the base URL.
    pub path: String,
    /// JSON body, if any.
    pub body: Option<Value>,
}

/// Scripted [`ControlPlaneClient`].
///
/// A call to a route with nothing scripted gets a 404 with a provider-style
/// error body.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    routes: Mutex<HashMap<(Method, String), VecDeque<ApiResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedClient {
    /// Create a client with nothing scripted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for a route.
    pub fn push(&self, method: Method, path: &str, status: u16, body: impl Into<String>) {
        self.routes
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(ApiResponse::new(status, body));
    }

    /// Queue a JSON response for a route.
    pub fn push_json(&self, method: Method, path: &str, status: u16, body: &Value) {
        self.push(method, path, status, body.to_string());
    }

    /// All recorded requests, in call order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Recorded requests that change provider state, in call order.
    #[must_use]
    pub fn mutations(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method.is_mutation())
            .cloned()
            .collect()
    }

    /// Number of calls made to a route.
    #[must_use]
    pub fn calls(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

#[async_trait]
impl ControlPlaneClient for ScriptedClient {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse> {
        self.requests.lock().push(RecordedRequest {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });

        let mut routes = self.routes.lock();
        let response = match routes.get_mut(&(method, path.to_string())) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        Ok(response.unwrap_or_else(|| {
            ApiResponse::new(
                404,
                r#"{"id":"not_found","message":"The resource you were accessing could not be found."}"#,
            )
        }))
    }
}
