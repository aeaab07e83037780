//! The create workflow.
//!
//! Four mutations run in a fixed order: cluster, firewall, database, user.
//! A 422 on any of them is a conflict and the workflow carries on. The
//! cluster id is re-resolved by name before every cluster-scoped step.
//! Cancellation is honoured between steps; a step already sent is not
//! rolled back.

use std::sync::Arc;

use dbforge_client::ControlPlaneClient;
use dbforge_core::{ClusterId, FirewallUpdate, StepOutcome};
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{ControlError, Result};
use crate::lifecycle::{self, ProvisionStage};
use crate::policy::{self, Operation};
use crate::resolver::ClusterResolver;
use crate::types::{ProvisionRequest, ProvisionerConfig};
use crate::waiter::{ReadinessWaiter, WaitOutcome};

/// Path of the create-cluster endpoint.
pub const CREATE_CLUSTER_PATH: &str = "/databases";

/// What a create run did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvisionReport {
    /// Outcome of the create-cluster call.
    pub cluster: StepOutcome,
    /// Current list entry of the cluster, fetched when creation conflicted.
    pub existing_cluster: Option<Value>,
    /// Readiness wait summary, absent when waiting is disabled.
    pub wait: Option<WaitOutcome>,
    /// Outcome of the firewall update.
    pub firewall: StepOutcome,
    /// Outcome of the create-database call.
    pub database: StepOutcome,
    /// Outcome of the create-user call.
    pub user: StepOutcome,
    /// Stage reached.
    pub stage: ProvisionStage,
}

impl ProvisionReport {
    /// Returns true if any step created something.
    #[must_use]
    pub fn changed(&self) -> bool {
        [&self.cluster, &self.firewall, &self.database, &self.user]
            .into_iter()
            .any(StepOutcome::is_created)
    }
}

/// Runs the create workflow.
pub struct Provisioner<C: ?Sized> {
    client: Arc<C>,
    resolver: ClusterResolver<C>,
    waiter: ReadinessWaiter<C>,
    config: ProvisionerConfig,
}

impl<C: ControlPlaneClient + ?Sized> Provisioner<C> {
    /// Create a provisioner. Nothing is sent until [`create`](Self::create).
    #[must_use]
    pub fn new(client: Arc<C>, config: ProvisionerConfig) -> Self {
        Self {
            resolver: ClusterResolver::new(Arc::clone(&client)),
            waiter: ReadinessWaiter::new(Arc::clone(&client), config.wait.clone()),
            client,
            config,
        }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ProvisionerConfig {
        &self.config
    }

    /// Ensure the cluster, its firewall rule, the database and the user
    /// exist.
    ///
    /// # Errors
    ///
    /// - `ControlError::UnexpectedResponse` if a step gets a status outside
    ///   2xx and 422; later steps are not attempted
    /// - `ControlError::ClusterNotFound` if the cluster cannot be resolved
    ///   before a cluster-scoped step
    /// - `ControlError::WaitTimeout` from the readiness wait
    /// - `ControlError::Cancelled` if `cancel` fires before a step is sent
    ///   or during the wait
    /// - `ControlError::Client` on transport failure
    pub async fn create(
        &self,
        request: &ProvisionRequest,
        cancel: &CancellationToken,
    ) -> Result<ProvisionReport> {
        let name = &request.cluster_name;
        let mut stage = ProvisionStage::Start;

        info!(
            cluster = %name,
            region = %request.region,
            engine = %self.config.engine,
            "Provisioning database cluster"
        );

        checkpoint(cancel, stage, request)?;
        let cluster = self
            .mutate(
                Operation::CreateCluster,
                CREATE_CLUSTER_PATH,
                &request.cluster_spec(&self.config),
            )
            .await?;
        let existing_cluster = if cluster == StepOutcome::AlreadyExists {
            self.resolver.find_cluster(name).await?
        } else {
            None
        };
        stage = lifecycle::validate_transition(stage, ProvisionStage::ClusterRequested)?;

        let wait = if self.config.wait_for_ready {
            Some(self.waiter.await_ready(name, cancel).await?)
        } else {
            None
        };
        stage = lifecycle::validate_transition(stage, ProvisionStage::ClusterReady)?;

        checkpoint(cancel, stage, request)?;
        let id = self.resolver.require_cluster_id(name).await?;
        let firewall = self
            .mutate(
                Operation::ConfigureFirewall,
                &scoped_path(&id, "firewall"),
                &FirewallUpdate::from(request.firewall_rule(&self.config)),
            )
            .await?;
        stage = lifecycle::validate_transition(stage, ProvisionStage::FirewallConfigured)?;

        checkpoint(cancel, stage, request)?;
        let id = self.resolver.require_cluster_id(name).await?;
        let database = self
            .mutate(
                Operation::CreateDatabase,
                &scoped_path(&id, "dbs"),
                &request.database_spec(),
            )
            .await?;
        stage = lifecycle::validate_transition(stage, ProvisionStage::DatabaseCreated)?;

        checkpoint(cancel, stage, request)?;
        let id = self.resolver.require_cluster_id(name).await?;
        let user = self
            .mutate(
                Operation::CreateUser,
                &scoped_path(&id, "users"),
                &request.user_spec(&self.config),
            )
            .await?;
        stage = lifecycle::validate_transition(stage, ProvisionStage::UserCreated)?;
        stage = lifecycle::validate_transition(stage, ProvisionStage::Complete)?;

        let report = ProvisionReport {
            cluster,
            existing_cluster,
            wait,
            firewall,
            database,
            user,
            stage,
        };
        info!(cluster = %name, changed = report.changed(), "Provisioning complete");
        Ok(report)
    }

    /// Send one mutation and map its response through the policy.
    async fn mutate<B: Serialize + ?Sized>(
        &self,
        operation: Operation,
        path: &str,
        body: &B,
    ) -> Result<StepOutcome> {
        let body = serde_json::to_value(body).map_err(ControlError::Serialization)?;
        let response = self
            .client
            .request(operation.method(), path, Some(&body))
            .await?;

        match policy::step_outcome(operation, &response) {
            StepOutcome::Failed { status, body } => Err(ControlError::UnexpectedResponse {
                operation,
                status,
                body,
            }),
            StepOutcome::AlreadyExists => {
                warn!(
                    %operation,
                    path,
                    status = response.status,
                    "{}",
                    operation.conflict_message()
                );
                Ok(StepOutcome::AlreadyExists)
            }
            created @ StepOutcome::Created { .. } => {
                info!(%operation, path, status = response.status, "Step applied");
                Ok(created)
            }
        }
    }
}

fn checkpoint(
    cancel: &CancellationToken,
    stage: ProvisionStage,
    request: &ProvisionRequest,
) -> Result<()> {
    if cancel.is_cancelled() {
        warn!(cluster = %request.cluster_name, ?stage, "Provisioning cancelled");
        return Err(ControlError::Cancelled(request.cluster_name.clone()));
    }
    Ok(())
}

fn scoped_path(id: &ClusterId, resource: &str) -> String {
    format!("{CREATE_CLUSTER_PATH}/{id}/{resource}")
}
