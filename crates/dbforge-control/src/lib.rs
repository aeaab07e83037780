//! Provisioning and destruction workflows for managed database clusters.
//!
//! This crate drives a cloud provider's control plane to bring a database
//! cluster, its firewall rule, a logical database and a user into
//! existence, or to delete the cluster. Every step is idempotent: running
//! the same command twice converges on the same end state.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Command                            │
//! │              create  │  destroy  │  info                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!            ┌─────────────────┼─────────────────┐
//!            ▼                 ▼                 ▼
//!     ┌─────────────┐   ┌─────────────┐   ┌─────────────┐
//!     │ Provisioner │   │  Destroyer  │   │  Resolver   │
//!     │  + Waiter   │   │             │   │ (name → id) │
//!     └─────────────┘   └─────────────┘   └─────────────┘
//!            │                 │                 │
//!            └─────────────────┼─────────────────┘
//!                              ▼
//!                  ┌──────────────────────┐
//!                  │  ControlPlaneClient  │
//!                  └──────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use dbforge_client::{ClientConfig, HttpControlPlaneClient};
//! use dbforge_control::{Action, Command, ProvisionRequest, ProvisionerConfig};
//! use dbforge_core::ClusterName;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(HttpControlPlaneClient::new(&ClientConfig::new("token"))?);
//!
//! let request = ProvisionRequest {
//!     cluster_name: ClusterName::new("orders")?,
//!     region: "nyc1".to_string(),
//!     database: "orders".to_string(),
//!     user: "app".to_string(),
//!     allowed_source: "203.0.113.7".to_string(),
//! };
//!
//! let output = Command::new(Action::Create, request)
//!     .execute(client, &ProvisionerConfig::default(), &CancellationToken::new())
//!     .await?;
//!
//! println!("{}", output.to_json());
//! # Ok(())
//! # }
//! ```
//!
//! # Idempotency
//!
//! A 422 on any create step means the target already exists; the step is
//! recorded as [`StepOutcome::AlreadyExists`](dbforge_core::StepOutcome)
//! and the workflow continues. On delete, 404, 422 and (by default) 500
//! mean there was nothing to delete. See the [`policy`] module.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod command;
pub mod destroy;
pub mod error;
pub mod lifecycle;
pub mod policy;
pub mod provision;
pub mod resolver;
pub mod types;
pub mod waiter;

pub use command::{Command, CommandOutput, CommandResult};
pub use destroy::{DestroyOutcome, DestroyReport, Destroyer};
pub use error::{ControlError, Result};
pub use lifecycle::ProvisionStage;
pub use policy::{DeletePolicy, Operation, ResponseClass};
pub use provision::{ProvisionReport, Provisioner};
pub use resolver::ClusterResolver;
pub use types::{Action, ProvisionRequest, ProvisionerConfig, WaitConfig};
pub use waiter::{ReadinessWaiter, WaitOutcome};
