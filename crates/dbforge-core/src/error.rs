//! Common error types for dbforge.
//!
//! This module provides error types shared by the client and control crates.

use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while building the core model from caller input.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An invalid identifier was provided.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] crate::ids::IdError),

    /// The engine slug is not one the provider offers.
    #[error("unknown database engine: {0}")]
    UnknownEngine(String),

    /// The firewall rule type is not one the provider offers.
    #[error("unknown firewall rule type: {0}")]
    UnknownRuleType(String),
}
