//! Waiting for a cluster to leave the `creating` state.
//!
//! The waiter polls the cluster list at a fixed interval with no backoff.
//! Any status other than `creating`, including "not found", ends the wait:
//! it means "proceed", not "online".

use std::sync::Arc;
use std::time::Duration;

use dbforge_client::ControlPlaneClient;
use dbforge_core::{ClusterName, ClusterStatus};
use serde::{Serialize, Serializer};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{ControlError, Result};
use crate::resolver::ClusterResolver;
use crate::types::WaitConfig;

/// Summary of a completed wait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaitOutcome {
    /// Status checks performed.
    pub attempts: u32,
    /// Last observed status. `None` if the cluster was not listed.
    pub status: Option<ClusterStatus>,
    /// Time spent waiting.
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

fn serialize_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

/// Polls cluster status until it is no longer `creating`.
pub struct ReadinessWaiter<C: ?Sized> {
    resolver: ClusterResolver<C>,
    config: WaitConfig,
}

impl<C: ?Sized> Clone for ReadinessWaiter<C> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            config: self.config.clone(),
        }
    }
}

impl<C: ControlPlaneClient + ?Sized> ReadinessWaiter<C> {
    /// Create a waiter over a client.
    #[must_use]
    pub fn new(client: Arc<C>, config: WaitConfig) -> Self {
        Self {
            resolver: ClusterResolver::new(client),
            config,
        }
    }

    /// Get the polling settings.
    #[must_use]
    pub const fn config(&self) -> &WaitConfig {
        &self.config
    }

    /// Poll until `name` is no longer creating.
    ///
    /// # Errors
    ///
    /// - `ControlError::WaitTimeout` if the deadline or the attempt budget
    ///   runs out while the cluster is still creating
    /// - `ControlError::Cancelled` if `cancel` fires
    /// - any error from listing clusters
    pub async fn await_ready(
        &self,
        name: &ClusterName,
        cancel: &CancellationToken,
    ) -> Result<WaitOutcome> {
        let interval = self.config.interval();
        let started = Instant::now();
        // A deadline past the clock's range is no deadline.
        let deadline = self
            .config
            .timeout()
            .and_then(|timeout| started.checked_add(timeout));
        let mut attempts: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(ControlError::Cancelled(name.clone()));
            }

            let status = self.resolver.resolve_cluster_status(name).await?;
            attempts += 1;

            if !status.as_ref().is_some_and(ClusterStatus::is_creating) {
                info!(
                    cluster = %name,
                    attempts,
                    status = status.as_ref().map_or("absent", ClusterStatus::as_str),
                    "Database cluster is no longer creating"
                );
                return Ok(WaitOutcome {
                    attempts,
                    status,
                    elapsed: started.elapsed(),
                });
            }

            let out_of_attempts = self.config.max_attempts.is_some_and(|max| attempts >= max);
            let past_deadline = deadline.is_some_and(|d| {
                Instant::now()
                    .checked_add(interval)
                    .is_none_or(|wake| wake > d)
            });
            if out_of_attempts || past_deadline {
                return Err(ControlError::WaitTimeout {
                    name: name.clone(),
                    attempts,
                    elapsed: started.elapsed(),
                });
            }

            info!(cluster = %name, attempts, "Waiting for database to be in online state");

            tokio::select! {
                () = cancel.cancelled() => {
                    debug!(cluster = %name, attempts, "Wait cancelled");
                    return Err(ControlError::Cancelled(name.clone()));
                }
                () = tokio::time::sleep(interval) => {}
            }
        }
    }
}
