//! Request and response shapes for the provider's databases API.
//!
//! The spec types (`ClusterSpec`, `FirewallRule`, `DatabaseSpec`,
//! `DatabaseUserSpec`) serialize directly into request bodies. The listing
//! types decode `GET /databases/` while keeping the raw document around,
//! since the raw JSON is what callers ultimately print.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::CoreError;
use crate::ids::{ClusterId, ClusterName};

/// Database engine slug understood by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// `MySQL`.
    Mysql,
    /// `PostgreSQL`.
    Pg,
    /// Redis.
    Redis,
    /// `MongoDB`.
    Mongodb,
}

impl Engine {
    /// The slug sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mysql => "mysql",
            Self::Pg => "pg",
            Self::Redis => "redis",
            Self::Mongodb => "mongodb",
        }
    }

    /// Key of the engine-specific settings object in a user request.
    #[must_use]
    pub fn settings_key(self) -> String {
        format!("{}_settings", self.as_str())
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(Self::Mysql),
            "pg" | "postgres" | "postgresql" => Ok(Self::Pg),
            "redis" => Ok(Self::Redis),
            "mongodb" | "mongo" => Ok(Self::Mongodb),
            other => Err(CoreError::UnknownEngine(other.to_string())),
        }
    }
}

/// Desired shape of a cluster, sent as the body of `POST /databases`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSpec {
    /// Unique cluster name.
    pub name: ClusterName,
    /// Engine slug.
    pub engine: Engine,
    /// Engine major version, e.g. `"8"`.
    pub version: String,
    /// Size tier slug, e.g. `"db-s-1vcpu-1gb"`.
    pub size: String,
    /// Region slug, e.g. `"nyc1"`.
    pub region: String,
    /// Number of nodes in the cluster.
    pub num_nodes: u32,
}

/// Kind of source a firewall rule admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirewallRuleType {
    /// A single IP address or CIDR block.
    IpAddr,
    /// A droplet by id.
    Droplet,
    /// A Kubernetes cluster by id.
    K8s,
    /// All resources carrying a tag.
    Tag,
    /// An App Platform app by id.
    App,
}

impl FromStr for FirewallRuleType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ip_addr" => Ok(Self::IpAddr),
            "droplet" => Ok(Self::Droplet),
            "k8s" => Ok(Self::K8s),
            "tag" => Ok(Self::Tag),
            "app" => Ok(Self::App),
            other => Err(CoreError::UnknownRuleType(other.to_string())),
        }
    }
}

/// One trusted-source rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRule {
    /// Source kind.
    #[serde(rename = "type")]
    pub rule_type: FirewallRuleType,
    /// Source value; an IP or CIDR for [`FirewallRuleType::IpAddr`].
    pub value: String,
}

impl FirewallRule {
    /// Rule admitting a single IP address or CIDR block.
    #[must_use]
    pub fn ip(value: impl Into<String>) -> Self {
        Self {
            rule_type: FirewallRuleType::IpAddr,
            value: value.into(),
        }
    }
}

/// Body of `PUT /databases/{id}/firewall`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallUpdate {
    /// Rules to apply.
    pub rules: Vec<FirewallRule>,
}

impl From<FirewallRule> for FirewallUpdate {
    fn from(rule: FirewallRule) -> Self {
        Self { rules: vec![rule] }
    }
}

/// Logical database inside a cluster, body of `POST /databases/{id}/dbs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSpec {
    /// Database name.
    pub name: String,
}

/// Database user inside a cluster, body of `POST /databases/{id}/users`.
///
/// Serializes as `{"name": ..., "<engine>_settings": {"auth_plugin": ...}}`;
/// the settings object is left out when no plugin is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseUserSpec {
    /// User name.
    pub name: String,
    /// Engine of the owning cluster; selects the settings key.
    pub engine: Engine,
    /// Authentication plugin, e.g. `mysql_native_password`.
    pub auth_plugin: Option<String>,
}

impl Serialize for DatabaseUserSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Settings<'a> {
            auth_plugin: &'a str,
        }

        let len = if self.auth_plugin.is_some() { 2 } else { 1 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("name", &self.name)?;
        if let Some(plugin) = &self.auth_plugin {
            map.serialize_entry(&self.engine.settings_key(), &Settings { auth_plugin: plugin })?;
        }
        map.end()
    }
}

/// Cluster status as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClusterStatus {
    /// The asynchronous create job is still running.
    Creating,
    /// The cluster is serving.
    Online,
    /// Any other status (`resizing`, `migrating`, ...), kept verbatim.
    Other(String),
}

impl ClusterStatus {
    /// Returns true while the provider is still building the cluster.
    #[must_use]
    pub const fn is_creating(&self) -> bool {
        matches!(self, Self::Creating)
    }

    /// The status string as the provider spells it.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Creating => "creating",
            Self::Online => "online",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for ClusterStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "creating" => Self::Creating,
            "online" => Self::Online,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for ClusterStatus {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<ClusterStatus> for String {
    fn from(status: ClusterStatus) -> Self {
        match status {
            ClusterStatus::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fields of a listed cluster that provisioning cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSummary {
    /// Provider-assigned id.
    pub id: ClusterId,
    /// Cluster name. Not validated, other tools may use other conventions.
    pub name: String,
    /// Current status.
    pub status: ClusterStatus,
    /// Engine slug.
    #[serde(default)]
    pub engine: Option<String>,
    /// Region slug.
    #[serde(default)]
    pub region: Option<String>,
    /// Creation time. `None` if absent or not RFC 3339.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc)))
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    databases: Option<Vec<Value>>,
}

/// Decoded response of `GET /databases/`.
///
/// Holds the typed summaries used for lookups plus the untouched document.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterListing {
    raw: Value,
    clusters: Vec<ClusterSummary>,
}

impl ClusterListing {
    /// Decode a list response body.
    ///
    /// `{"databases": null}` and a missing `databases` key both decode as an
    /// empty listing. Entries without a usable `id`, `name` or `status` are
    /// left out of lookups but kept in the raw document.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not JSON or `databases` is not a list.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        let raw: Value = serde_json::from_str(body)?;
        let parsed = ListResponse::deserialize(&raw)?;
        let clusters = parsed
            .databases
            .unwrap_or_default()
            .iter()
            .filter_map(|entry| ClusterSummary::deserialize(entry).ok())
            .collect();
        Ok(Self { raw, clusters })
    }

    /// Linear scan for an exact name match.
    #[must_use]
    pub fn find(&self, name: &ClusterName) -> Option<&ClusterSummary> {
        self.clusters.iter().find(|c| c.name == name.as_str())
    }

    /// The raw JSON entry of the named cluster.
    #[must_use]
    pub fn find_raw(&self, name: &ClusterName) -> Option<&Value> {
        self.raw
            .get("databases")
            .and_then(Value::as_array)?
            .iter()
            .find(|entry| entry.get("name").and_then(Value::as_str) == Some(name.as_str()))
    }

    /// The untouched response document.
    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.raw
    }

    /// Number of listed clusters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Returns true if no clusters are listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

/// Result of a single provisioning step after applying the idempotency policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The provider accepted the mutation; carries its response payload.
    Created {
        /// Decoded response body, `null` if the body was empty.
        payload: Value,
    },
    /// The provider answered with the conflict code; nothing changed.
    AlreadyExists,
    /// The provider answered with a status the policy does not cover.
    Failed {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
}

impl StepOutcome {
    /// Returns true if this step changed provider state.
    #[must_use]
    pub const fn is_created(&self) -> bool {
        matches!(self, Self::Created { .. })
    }
}
