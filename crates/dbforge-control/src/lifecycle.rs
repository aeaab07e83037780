//! Provisioning stage machine.
//!
//! The create workflow moves strictly forward, one stage per step. A step
//! that finds its target already present still advances the stage.
//!
//! ```text
//!   Start
//!     │ POST /databases
//!     ▼
//!   ClusterRequested
//!     │ status != creating (or waiting disabled)
//!     ▼
//!   ClusterReady
//!     │ PUT /databases/{id}/firewall
//!     ▼
//!   FirewallConfigured
//!     │ POST /databases/{id}/dbs
//!     ▼
//!   DatabaseCreated
//!     │ POST /databases/{id}/users
//!     ▼
//!   UserCreated
//!     │
//!     ▼
//!   Complete
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, Result};

/// Where a provisioning run has got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionStage {
    /// Nothing sent yet.
    Start,
    /// Cluster creation requested or found to exist.
    ClusterRequested,
    /// Cluster has left the `creating` state.
    ClusterReady,
    /// Trusted source added.
    FirewallConfigured,
    /// Logical database created.
    DatabaseCreated,
    /// Database user created.
    UserCreated,
    /// All steps done.
    Complete,
}

impl ProvisionStage {
    /// The stage that follows this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Start => Some(Self::ClusterRequested),
            Self::ClusterRequested => Some(Self::ClusterReady),
            Self::ClusterReady => Some(Self::FirewallConfigured),
            Self::FirewallConfigured => Some(Self::DatabaseCreated),
            Self::DatabaseCreated => Some(Self::UserCreated),
            Self::UserCreated => Some(Self::Complete),
            Self::Complete => None,
        }
    }
}

/// Check if moving from `from` to `to` is allowed.
#[must_use]
pub fn is_valid_transition(from: ProvisionStage, to: ProvisionStage) -> bool {
    from.next() == Some(to)
}

/// Validates a stage transition and returns the target stage if valid.
///
/// # Errors
///
/// Returns `ControlError::InvalidTransition` if `to` does not directly
/// follow `from`.
pub fn validate_transition(from: ProvisionStage, to: ProvisionStage) -> Result<ProvisionStage> {
    if is_valid_transition(from, to) {
        Ok(to)
    } else {
        Err(ControlError::InvalidTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        use ProvisionStage::*;

        assert!(is_valid_transition(Start, ClusterRequested));
        assert!(is_valid_transition(ClusterRequested, ClusterReady));
        assert!(is_valid_transition(ClusterReady, FirewallConfigured));
        assert!(is_valid_transition(FirewallConfigured, DatabaseCreated));
        assert!(is_valid_transition(DatabaseCreated, UserCreated));
        assert!(is_valid_transition(UserCreated, Complete));
    }

    #[test]
    fn invalid_transitions() {
        use ProvisionStage::*;

        // No skipping ahead
        assert!(!is_valid_transition(Start, FirewallConfigured));
        assert!(!is_valid_transition(ClusterRequested, DatabaseCreated));
        // No going back
        assert!(!is_valid_transition(UserCreated, DatabaseCreated));
        // No self transitions
        assert!(!is_valid_transition(ClusterReady, ClusterReady));
        // Complete is final
        assert!(!is_valid_transition(Complete, Start));
    }

    #[test]
    fn validate_transition_reports_stages() {
        let err = validate_transition(ProvisionStage::Start, ProvisionStage::Complete).unwrap_err();
        assert!(matches!(
            err,
            ControlError::InvalidTransition {
                from: ProvisionStage::Start,
                to: ProvisionStage::Complete,
            }
        ));
        assert_eq!(
            validate_transition(ProvisionStage::Start, ProvisionStage::ClusterRequested).unwrap(),
            ProvisionStage::ClusterRequested
        );
    }

    #[test]
    fn walking_next_visits_every_stage_in_order() {
        let mut stage = ProvisionStage::Start;
        let mut visited = vec![stage];
        while let Some(next) = stage.next() {
            assert!(next > stage);
            stage = next;
            visited.push(stage);
        }
        assert_eq!(visited.len(), 7);
        assert_eq!(stage, ProvisionStage::Complete);
    }
}
