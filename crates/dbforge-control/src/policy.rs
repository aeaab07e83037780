//! Idempotency policy: which response codes count as "already done".
//!
//! | Operation          | Success | Recovered as                 |
//! |--------------------|---------|------------------------------|
//! | create cluster     | 2xx     | 422 → conflict               |
//! | configure firewall | 2xx     | 422 → conflict               |
//! | create database    | 2xx     | 422 → conflict               |
//! | create user        | 2xx     | 422 → conflict               |
//! | delete cluster     | 2xx     | 404, 422, 500* → absent      |
//! | list clusters      | 2xx     | -                            |
//!
//! \* only under [`DeletePolicy::Compatible`].

use std::fmt;

use dbforge_client::{ApiResponse, Method};
use dbforge_core::StepOutcome;
use serde::{Deserialize, Serialize};

/// Status the provider returns when the target already exists.
pub const CONFLICT_STATUS: u16 = 422;

/// A control plane call made by the workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// `GET /databases/`
    ListClusters,
    /// `POST /databases`
    CreateCluster,
    /// `PUT /databases/{id}/firewall`
    ConfigureFirewall,
    /// `POST /databases/{id}/dbs`
    CreateDatabase,
    /// `POST /databases/{id}/users`
    CreateUser,
    /// `DELETE /databases/{id}`
    DeleteCluster,
}

impl Operation {
    /// HTTP verb of this call.
    #[must_use]
    pub const fn method(self) -> Method {
        match self {
            Self::ListClusters => Method::Get,
            Self::CreateCluster | Self::CreateDatabase | Self::CreateUser => Method::Post,
            Self::ConfigureFirewall => Method::Put,
            Self::DeleteCluster => Method::Delete,
        }
    }

    /// Warning logged when the provider reports a conflict.
    #[must_use]
    pub const fn conflict_message(self) -> &'static str {
        match self {
            Self::CreateCluster => "Database cluster likely exists",
            Self::ConfigureFirewall => "Trusted source has already been added",
            Self::CreateDatabase => "Database likely exists",
            Self::CreateUser => "Database user likely exists",
            Self::DeleteCluster => "Database cluster likely does not exist",
            Self::ListClusters => "Unexpected conflict listing clusters",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ListClusters => "list clusters",
            Self::CreateCluster => "create cluster",
            Self::ConfigureFirewall => "configure firewall",
            Self::CreateDatabase => "create database",
            Self::CreateUser => "create user",
            Self::DeleteCluster => "delete cluster",
        })
    }
}

/// How `DELETE` responses are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// 404, 422 and 500 mean "nothing to destroy"; every other status,
    /// including non-2xx ones, means "destroyed".
    #[default]
    Compatible,
    /// 404 and 422 mean "nothing to destroy", 2xx means "destroyed", and
    /// everything else is an unexpected response.
    Strict,
}

/// Classification of a control plane response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// The call did what was asked.
    Success,
    /// The target already exists.
    Conflict,
    /// The delete target is already gone.
    AbsentOnDelete,
    /// Not covered by the policy.
    Unexpected,
}

/// Classify a response to `operation`.
#[must_use]
pub const fn classify(operation: Operation, status: u16, delete_policy: DeletePolicy) -> ResponseClass {
    let success = status >= 200 && status < 300;
    match operation {
        Operation::DeleteCluster => match (status, delete_policy) {
            (404 | 422 | 500, DeletePolicy::Compatible) | (404 | 422, DeletePolicy::Strict) => {
                ResponseClass::AbsentOnDelete
            }
            (_, DeletePolicy::Compatible) => ResponseClass::Success,
            _ if success => ResponseClass::Success,
            _ => ResponseClass::Unexpected,
        },
        Operation::ListClusters => {
            if success {
                ResponseClass::Success
            } else {
                ResponseClass::Unexpected
            }
        }
        Operation::CreateCluster
        | Operation::ConfigureFirewall
        | Operation::CreateDatabase
        | Operation::CreateUser => {
            if success {
                ResponseClass::Success
            } else if status == CONFLICT_STATUS {
                ResponseClass::Conflict
            } else {
                ResponseClass::Unexpected
            }
        }
    }
}

/// Map a response to a provisioning step onto its outcome.
#[must_use]
pub fn step_outcome(operation: Operation, response: &ApiResponse) -> StepOutcome {
    match classify(operation, response.status, DeletePolicy::Strict) {
        ResponseClass::Success => StepOutcome::Created {
            payload: response.payload(),
        },
        ResponseClass::Conflict => StepOutcome::AlreadyExists,
        ResponseClass::AbsentOnDelete | ResponseClass::Unexpected => StepOutcome::Failed {
            status: response.status,
            body: response.body.clone(),
        },
    }
}
