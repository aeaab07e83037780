//! Error types for the provisioning workflows.
//!
//! Conflicts on create and "already gone" answers on delete are not errors;
//! the policy module turns them into outcomes. Everything here is surfaced
//! to the caller.

use std::time::Duration;

use dbforge_client::ClientError;
use dbforge_core::ClusterName;
use thiserror::Error;

use crate::lifecycle::ProvisionStage;
use crate::policy::Operation;

/// A result type using `ControlError`.
pub type Result<T> = std::result::Result<T, ControlError>;

/// Errors that can occur in provisioning and destruction.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The client failed before any response was received, or could not
    /// be set up.
    #[error("control plane client error: {0}")]
    Client(#[from] ClientError),

    /// The provider answered with a status the idempotency policy does not
    /// cover.
    #[error("unexpected response to {operation}: HTTP {status}: {body}")]
    UnexpectedResponse {
        /// The call that got the response.
        operation: Operation,
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// A successful response body could not be decoded.
    #[error("malformed response to {operation}: {source}")]
    MalformedResponse {
        /// The call that got the response.
        operation: Operation,
        /// Raw response body.
        body: String,
        /// Decode error.
        #[source]
        source: serde_json::Error,
    },

    /// A cluster-scoped step found no cluster with the requested name.
    #[error("cluster not found: {0}")]
    ClusterNotFound(ClusterName),

    /// The cluster was still creating when the wait budget ran out.
    #[error("timed out waiting for cluster {name} after {attempts} status checks ({elapsed:?})")]
    WaitTimeout {
        /// Cluster being waited on.
        name: ClusterName,
        /// Status checks performed.
        attempts: u32,
        /// Time spent waiting.
        elapsed: Duration,
    },

    /// The wait was cancelled.
    #[error("wait for cluster {0} was cancelled")]
    Cancelled(ClusterName),

    /// The provisioning workflow tried to move between stages out of order.
    #[error("invalid stage transition: cannot go from {from:?} to {to:?}")]
    InvalidTransition {
        /// Current stage.
        from: ProvisionStage,
        /// Requested stage.
        to: ProvisionStage,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A request body could not be encoded.
    #[error("failed to encode request body: {0}")]
    Serialization(#[source] serde_json::Error),
}

impl ControlError {
    /// Returns true if no response was received from the control plane.
    #[must_use]
    pub const fn is_transport_failure(&self) -> bool {
        matches!(self, Self::Client(ClientError::Transport { .. }))
    }

    /// Returns the process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Client(ClientError::Transport { .. }) => 3,
            Self::UnexpectedResponse { .. } | Self::MalformedResponse { .. } => 4,
            Self::WaitTimeout { .. } => 5,
            Self::Cancelled(_) => 130,
            Self::Client(_) | Self::InvalidConfig(_) => 2,
            Self::ClusterNotFound(_) | Self::InvalidTransition { .. } | Self::Serialization(_) => 1,
        }
    }

    /// Returns true if running the same command again might succeed.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        match self {
            Self::Client(e) => e.is_retriable(),
            Self::UnexpectedResponse { status, .. } => *status >= 500 || *status == 429,
            Self::WaitTimeout { .. } | Self::ClusterNotFound(_) => true,
            _ => false,
        }
    }
}
