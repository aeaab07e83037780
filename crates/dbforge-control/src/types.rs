//! Configuration and request types for the provisioning workflows.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use dbforge_core::{
    ClusterName, ClusterSpec, DatabaseSpec, DatabaseUserSpec, Engine, FirewallRule,
    FirewallRuleType,
};
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, Result};
use crate::policy::DeletePolicy;

/// What a command does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Provision the cluster, firewall rule, database and user.
    Create,
    /// Delete the cluster.
    Destroy,
    /// Only report the cluster list.
    Info,
}

impl FromStr for Action {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "destroy" => Ok(Self::Destroy),
            "info" => Ok(Self::Info),
            other => Err(ControlError::InvalidConfig(format!(
                "unknown action {other:?}, expected create, destroy or info"
            ))),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Destroy => "destroy",
            Self::Info => "info",
        })
    }
}

/// Settings for waiting on a newly created cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitConfig {
    /// Pause between status checks, in seconds.
    #[serde(default = "WaitConfig::default_interval")]
    pub interval_seconds: u64,

    /// Give up after this many seconds. `None` waits indefinitely.
    #[serde(default = "WaitConfig::default_timeout")]
    pub timeout_seconds: Option<u64>,

    /// Give up after this many status checks. `None` means no limit.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl WaitConfig {
    const fn default_interval() -> u64 {
        15
    }

    #[allow(clippy::unnecessary_wraps)]
    const fn default_timeout() -> Option<u64> {
        Some(30 * 60)
    }

    /// Get the poll interval as a `Duration`.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    /// Get the deadline as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            interval_seconds: Self::default_interval(),
            timeout_seconds: Self::default_timeout(),
            max_attempts: None,
        }
    }
}

/// Parameters shared by every provisioning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionerConfig {
    /// Database engine.
    #[serde(default = "ProvisionerConfig::default_engine")]
    pub engine: Engine,

    /// Engine version.
    #[serde(default = "ProvisionerConfig::default_version")]
    pub version: String,

    /// Size tier slug.
    #[serde(default = "ProvisionerConfig::default_size")]
    pub size: String,

    /// Number of nodes.
    #[serde(default = "ProvisionerConfig::default_num_nodes")]
    pub num_nodes: u32,

    /// Kind of trusted source the firewall rule admits.
    #[serde(default = "ProvisionerConfig::default_rule_type")]
    pub firewall_rule_type: FirewallRuleType,

    /// Authentication plugin for the created user.
    #[serde(default = "ProvisionerConfig::default_auth_plugin")]
    pub auth_plugin: Option<String>,

    /// Wait for a new cluster to leave `creating` before configuring it.
    #[serde(default = "ProvisionerConfig::default_wait_for_ready")]
    pub wait_for_ready: bool,

    /// How delete responses are interpreted.
    #[serde(default)]
    pub delete_policy: DeletePolicy,

    /// Polling settings.
    #[serde(default)]
    pub wait: WaitConfig,
}

impl ProvisionerConfig {
    const fn default_engine() -> Engine {
        Engine::Mysql
    }

    fn default_version() -> String {
        "8".to_string()
    }

    fn default_size() -> String {
        "db-s-1vcpu-1gb".to_string()
    }

    const fn default_num_nodes() -> u32 {
        1
    }

    const fn default_rule_type() -> FirewallRuleType {
        FirewallRuleType::IpAddr
    }

    #[allow(clippy::unnecessary_wraps)]
    fn default_auth_plugin() -> Option<String> {
        Some("mysql_native_password".to_string())
    }

    const fn default_wait_for_ready() -> bool {
        true
    }

    /// Check the configuration for values the provider would reject or
    /// that would make the workflow spin.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::InvalidConfig` describing the first problem.
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(ControlError::InvalidConfig("engine version is empty".into()));
        }
        if self.size.trim().is_empty() {
            return Err(ControlError::InvalidConfig("size slug is empty".into()));
        }
        if self.num_nodes == 0 {
            return Err(ControlError::InvalidConfig("node count must be at least 1".into()));
        }
        if self.wait.interval_seconds == 0 {
            return Err(ControlError::InvalidConfig("poll interval must be at least 1 second".into()));
        }
        if self.wait.max_attempts == Some(0) {
            return Err(ControlError::InvalidConfig("max attempts must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            engine: Self::default_engine(),
            version: Self::default_version(),
            size: Self::default_size(),
            num_nodes: Self::default_num_nodes(),
            firewall_rule_type: Self::default_rule_type(),
            auth_plugin: Self::default_auth_plugin(),
            wait_for_ready: Self::default_wait_for_ready(),
            delete_policy: DeletePolicy::default(),
            wait: WaitConfig::default(),
        }
    }
}

/// Caller-supplied names for one cluster and its contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionRequest {
    /// Cluster name.
    pub cluster_name: ClusterName,
    /// Region slug.
    pub region: String,
    /// Logical database to create.
    pub database: String,
    /// Database user to create.
    pub user: String,
    /// Trusted source value, an IP or CIDR for `ip_addr` rules.
    pub allowed_source: String,
}

impl ProvisionRequest {
    /// Body of the create-cluster call.
    #[must_use]
    pub fn cluster_spec(&self, config: &ProvisionerConfig) -> ClusterSpec {
        ClusterSpec {
            name: self.cluster_name.clone(),
            engine: config.engine,
            version: config.version.clone(),
            size: config.size.clone(),
            region: self.region.clone(),
            num_nodes: config.num_nodes,
        }
    }

    /// The trusted-source rule to append.
    #[must_use]
    pub fn firewall_rule(&self, config: &ProvisionerConfig) -> FirewallRule {
        FirewallRule {
            rule_type: config.firewall_rule_type,
            value: self.allowed_source.clone(),
        }
    }

    /// Body of the create-database call.
    #[must_use]
    pub fn database_spec(&self) -> DatabaseSpec {
        DatabaseSpec {
            name: self.database.clone(),
        }
    }

    /// Body of the create-user call.
    #[must_use]
    pub fn user_spec(&self, config: &ProvisionerConfig) -> DatabaseUserSpec {
        DatabaseUserSpec {
            name: self.user.clone(),
            engine: config.engine,
            auth_plugin: config.auth_plugin.clone(),
        }
    }
}
