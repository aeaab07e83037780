//! Core types for dbforge.
//!
//! This crate provides the data model shared by the rest of the workspace:
//!
//! - **Identifiers**: validated cluster names and provider-assigned cluster ids
//! - **Model**: request bodies for each provisioning step, the cluster
//!   listing, cluster status and per-step outcomes
//! - **Error types**: errors raised while building the model from input
//!
//! # Example
//!
//! ```
//! use dbforge_core::{ClusterName, ClusterSpec, Engine};
//!
//! let spec = ClusterSpec {
//!     name: ClusterName::new("orders").unwrap(),
//!     engine: Engine::Mysql,
//!     version: "8".to_string(),
//!     size: "db-s-1vcpu-1gb".to_string(),
//!     region: "nyc1".to_string(),
//!     num_nodes: 1,
//! };
//!
//! let body = serde_json::to_value(&spec).unwrap();
//! assert_eq!(body["engine"], "mysql");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;
pub mod model;

pub use error::{CoreError, Result};
pub use ids::{ClusterId, ClusterName, IdError};
pub use model::{
    ClusterListing, ClusterSpec, ClusterStatus, ClusterSummary, DatabaseSpec, DatabaseUserSpec,
    Engine, FirewallRule, FirewallRuleType, FirewallUpdate, StepOutcome,
};
