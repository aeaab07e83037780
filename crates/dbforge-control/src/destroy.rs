//! The destroy workflow.

use std::sync::Arc;

use dbforge_client::ControlPlaneClient;
use dbforge_core::{ClusterId, ClusterListing, ClusterName};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ControlError, Result};
use crate::policy::{self, DeletePolicy, Operation, ResponseClass};
use crate::resolver::ClusterResolver;

/// Result of a destroy run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestroyOutcome {
    /// The delete was accepted.
    Destroyed,
    /// There was nothing to delete.
    NoOp,
}

/// What a destroy run did, and the cluster list afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DestroyReport {
    /// Outcome.
    pub outcome: DestroyOutcome,
    /// Id the name resolved to, if it resolved.
    pub cluster_id: Option<ClusterId>,
    /// Status of the delete call, if one was sent.
    pub status: Option<u16>,
    /// Full cluster list after the delete.
    pub clusters: ClusterListing,
}

/// Runs the destroy workflow.
pub struct Destroyer<C: ?Sized> {
    client: Arc<C>,
    resolver: ClusterResolver<C>,
    policy: DeletePolicy,
}

impl<C: ControlPlaneClient + ?Sized> Destroyer<C> {
    /// Create a destroyer.
    #[must_use]
    pub fn new(client: Arc<C>, policy: DeletePolicy) -> Self {
        Self {
            resolver: ClusterResolver::new(Arc::clone(&client)),
            client,
            policy,
        }
    }

    /// Delete the named cluster if it exists, then list every cluster.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::UnexpectedResponse` when the delete status is
    /// outside the policy (only possible under [`DeletePolicy::Strict`]),
    /// plus any listing or transport error.
    pub async fn destroy(&self, name: &ClusterName) -> Result<DestroyReport> {
        let operation = Operation::DeleteCluster;
        let cluster_id = self.resolver.resolve_cluster_id(name).await?;

        let (outcome, status) = match &cluster_id {
            None => {
                warn!(cluster = %name, "{}", operation.conflict_message());
                (DestroyOutcome::NoOp, None)
            }
            Some(id) => {
                let path = format!("/databases/{id}");
                let response = self.client.request(operation.method(), &path, None).await?;
                let outcome = match policy::classify(operation, response.status, self.policy) {
                    ResponseClass::AbsentOnDelete => {
                        warn!(
                            cluster = %name,
                            status = response.status,
                            "{}",
                            operation.conflict_message()
                        );
                        DestroyOutcome::NoOp
                    }
                    ResponseClass::Success => {
                        if response.is_success() {
                            info!(cluster = %name, cluster_id = %id, "Database cluster destroyed");
                        } else {
                            warn!(
                                cluster = %name,
                                status = response.status,
                                "Delete returned an error status, treating cluster as destroyed"
                            );
                        }
                        DestroyOutcome::Destroyed
                    }
                    ResponseClass::Conflict | ResponseClass::Unexpected => {
                        return Err(ControlError::UnexpectedResponse {
                            operation,
                            status: response.status,
                            body: response.body,
                        });
                    }
                };
                (outcome, Some(response.status))
            }
        };

        let clusters = self.resolver.list_clusters().await?;
        Ok(DestroyReport {
            outcome,
            cluster_id,
            status,
            clusters,
        })
    }
}
