//! Name → id lookups against the cluster list.
//!
//! Every lookup issues a fresh `GET /databases/` and scans it linearly.
//! Nothing is cached: a cluster renamed or deleted by someone else between
//! two steps is seen by the next lookup, at the cost of one list call per
//! step.

use std::sync::Arc;

use dbforge_client::ControlPlaneClient;
use dbforge_core::{ClusterId, ClusterListing, ClusterName, ClusterStatus};
use serde_json::Value;

use crate::error::{ControlError, Result};
use crate::policy::{self, DeletePolicy, Operation, ResponseClass};

/// Path of the list endpoint.
pub const LIST_PATH: &str = "/databases/";

/// Resolves cluster names through the list endpoint.
pub struct ClusterResolver<C: ?Sized> {
    client: Arc<C>,
}

impl<C: ?Sized> Clone for ClusterResolver<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

impl<C: ControlPlaneClient + ?Sized> ClusterResolver<C> {
    /// Create a resolver over a client.
    #[must_use]
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// Fetch every cluster visible to the token.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::Client` on transport failure,
    /// `ControlError::UnexpectedResponse` on a non-2xx status and
    /// `ControlError::MalformedResponse` if the body cannot be decoded.
    pub async fn list_clusters(&self) -> Result<ClusterListing> {
        let operation = Operation::ListClusters;
        let response = self
            .client
            .request(operation.method(), LIST_PATH, None)
            .await?;

        if policy::classify(operation, response.status, DeletePolicy::Strict)
            != ResponseClass::Success
        {
            return Err(ControlError::UnexpectedResponse {
                operation,
                status: response.status,
                body: response.body,
            });
        }

        ClusterListing::from_json(&response.body).map_err(|source| {
            ControlError::MalformedResponse {
                operation,
                body: response.body.clone(),
                source,
            }
        })
    }

    /// Look up the provider id of the named cluster.
    ///
    /// # Errors
    ///
    /// See [`list_clusters`](Self::list_clusters). A missing cluster is
    /// `Ok(None)`, not an error.
    pub async fn resolve_cluster_id(&self, name: &ClusterName) -> Result<Option<ClusterId>> {
        let listing = self.list_clusters().await?;
        Ok(listing.find(name).map(|c| c.id.clone()))
    }

    /// Look up the status of the named cluster.
    ///
    /// # Errors
    ///
    /// See [`list_clusters`](Self::list_clusters). A missing cluster is
    /// `Ok(None)`, not an error.
    pub async fn resolve_cluster_status(
        &self,
        name: &ClusterName,
    ) -> Result<Option<ClusterStatus>> {
        let listing = self.list_clusters().await?;
        Ok(listing.find(name).map(|c| c.status.clone()))
    }

    /// Fetch the raw list entry of the named cluster.
    ///
    /// # Errors
    ///
    /// See [`list_clusters`](Self::list_clusters).
    pub async fn find_cluster(&self, name: &ClusterName) -> Result<Option<Value>> {
        let listing = self.list_clusters().await?;
        Ok(listing.find_raw(name).cloned())
    }

    /// Look up the id of the named cluster, failing if it is absent.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::ClusterNotFound` if no cluster has the name,
    /// plus the errors of [`list_clusters`](Self::list_clusters).
    pub async fn require_cluster_id(&self, name: &ClusterName) -> Result<ClusterId> {
        self.resolve_cluster_id(name)
            .await?
            .ok_or_else(|| ControlError::ClusterNotFound(name.clone()))
    }
}
