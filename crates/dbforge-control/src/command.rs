//! One-shot commands: create, destroy or info.

use std::sync::Arc;

use dbforge_client::ControlPlaneClient;
use dbforge_core::ClusterListing;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::destroy::{DestroyOutcome, Destroyer};
use crate::error::{ControlError, Result};
use crate::provision::{ProvisionReport, Provisioner};
use crate::resolver::ClusterResolver;
use crate::types::{Action, ProvisionRequest, ProvisionerConfig};

/// A fully specified command. Building one sends nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// What to do.
    pub action: Action,
    /// Names of the cluster and its contents.
    pub request: ProvisionRequest,
}

/// Per-action result.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// The create workflow ran.
    Provisioned(ProvisionReport),
    /// The destroy workflow ran.
    Destroyed {
        /// Whether a cluster was deleted.
        outcome: DestroyOutcome,
        /// Status of the delete call, if one was sent.
        status: Option<u16>,
    },
    /// Only the list was fetched.
    Info,
}

/// Output of a command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    /// The action that ran.
    pub action: Action,
    /// What it did.
    pub result: CommandResult,
    /// The cluster list once the action finished.
    pub clusters: ClusterListing,
}

impl CommandOutput {
    /// Returns true if the action modified anything.
    #[must_use]
    pub fn changed(&self) -> bool {
        match &self.result {
            CommandResult::Provisioned(report) => report.changed(),
            CommandResult::Destroyed { outcome, .. } => *outcome == DestroyOutcome::Destroyed,
            CommandResult::Info => false,
        }
    }

    /// The cluster list as JSON text, in the shape the provider returned it.
    #[must_use]
    pub fn to_json(&self) -> String {
        self.clusters.raw().to_string()
    }
}

impl Command {
    /// Create a command.
    #[must_use]
    pub const fn new(action: Action, request: ProvisionRequest) -> Self {
        Self { action, request }
    }

    /// Run the command against a control plane.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::InvalidConfig` if `config` does not validate,
    /// `ControlError::Cancelled` if `cancel` fires before the command
    /// finishes, and any error from the workflow that runs.
    pub async fn execute<C>(
        &self,
        client: Arc<C>,
        config: &ProvisionerConfig,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput>
    where
        C: ControlPlaneClient + ?Sized,
    {
        config.validate()?;
        info!(action = %self.action, cluster = %self.request.cluster_name, "Running command");

        // Dropping the workflow abandons any request in flight.
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                warn!(action = %self.action, cluster = %self.request.cluster_name, "Command cancelled");
                Err(ControlError::Cancelled(self.request.cluster_name.clone()))
            }
            output = self.run(client, config, cancel) => output,
        }
    }

    async fn run<C>(
        &self,
        client: Arc<C>,
        config: &ProvisionerConfig,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput>
    where
        C: ControlPlaneClient + ?Sized,
    {
        let resolver = ClusterResolver::new(Arc::clone(&client));
        let (result, clusters) = match self.action {
            Action::Create => {
                let report = Provisioner::new(client, config.clone())
                    .create(&self.request, cancel)
                    .await?;
                (CommandResult::Provisioned(report), resolver.list_clusters().await?)
            }
            Action::Destroy => {
                let report = Destroyer::new(client, config.delete_policy)
                    .destroy(&self.request.cluster_name)
                    .await?;
                (
                    CommandResult::Destroyed {
                        outcome: report.outcome,
                        status: report.status,
                    },
                    report.clusters,
                )
            }
            Action::Info => (CommandResult::Info, resolver.list_clusters().await?),
        };

        Ok(CommandOutput {
            action: self.action,
            result,
            clusters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::LIST_PATH;
    use dbforge_client::{Method, ScriptedClient};
    use dbforge_core::ClusterName;
    use serde_json::json;

    fn command(action: Action) -> Command {
        Command::new(
            action,
            ProvisionRequest {
                cluster_name: ClusterName::new("orders").unwrap(),
                region: "nyc1".to_string(),
                database: "orders".to_string(),
                user: "app".to_string(),
                allowed_source: "203.0.113.7".to_string(),
            },
        )
    }

    const LISTING: &str = r#"{"databases":[{"id":"c-1","name":"orders","status":"online"}],"links":{},"meta":{"total":1}}"#;

    #[tokio::test]
    async fn info_only_lists() {
        let client = Arc::new(ScriptedClient::new());
        client.push(Method::Get, LIST_PATH, 200, LISTING);

        let output = command(Action::Info)
            .execute(Arc::clone(&client), &ProvisionerConfig::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(output.result, CommandResult::Info);
        assert!(!output.changed());
        let written: serde_json::Value = serde_json::from_str(&output.to_json()).unwrap();
        assert_eq!(written, serde_json::from_str::<serde_json::Value>(LISTING).unwrap());
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn create_ends_with_a_listing() {
        let client = Arc::new(ScriptedClient::new());
        client.push(Method::Get, LIST_PATH, 200, LISTING);
        for (method, path) in [
            (Method::Post, "/databases"),
            (Method::Put, "/databases/c-1/firewall"),
            (Method::Post, "/databases/c-1/dbs"),
            (Method::Post, "/databases/c-1/users"),
        ] {
            client.push_json(method, path, 201, &json!({}));
        }

        let output = command(Action::Create)
            .execute(Arc::clone(&client), &ProvisionerConfig::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(output.changed());
        assert!(matches!(output.result, CommandResult::Provisioned(_)));
        assert_eq!(output.clusters.len(), 1);
        assert_eq!(client.requests().last().unwrap().path, LIST_PATH);
    }

    #[tokio::test]
    async fn destroy_reports_outcome() {
        let client = Arc::new(ScriptedClient::new());
        client.push(Method::Get, LIST_PATH, 200, LISTING);
        client.push(Method::Delete, "/databases/c-1", 404, "");

        let output = command(Action::Destroy)
            .execute(client, &ProvisionerConfig::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            output.result,
            CommandResult::Destroyed {
                outcome: DestroyOutcome::NoOp,
                status: Some(404),
            }
        );
        assert!(!output.changed());
    }

    #[tokio::test]
    async fn cancelled_destroy_sends_no_delete() {
        let client = Arc::new(ScriptedClient::new());
        client.push(Method::Get, LIST_PATH, 200, LISTING);
        client.push(Method::Delete, "/databases/c-1", 204, "");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = command(Action::Destroy)
            .execute(Arc::clone(&client), &ProvisionerConfig::default(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, ControlError::Cancelled(_)));
        assert_eq!(client.calls(Method::Delete, "/databases/c-1"), 0);
    }

    #[tokio::test]
    async fn invalid_config_sends_nothing() {
        let client = Arc::new(ScriptedClient::new());
        let config = ProvisionerConfig {
            num_nodes: 0,
            ..Default::default()
        };

        let err = command(Action::Info)
            .execute(Arc::clone(&client), &config, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ControlError::InvalidConfig(_)));
        assert!(client.requests().is_empty());
    }
}
