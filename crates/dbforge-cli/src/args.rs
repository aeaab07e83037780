//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use dbforge_client::{ClientConfig, DEFAULT_BASE_URL};
use dbforge_control::{
    Action, Command, DeletePolicy, ProvisionRequest, ProvisionerConfig, WaitConfig,
};
use dbforge_core::{ClusterName, Engine, FirewallRuleType};

/// Provision or destroy a managed database cluster.
///
/// Every flag can also be set through the environment variable shown.
#[derive(Parser, Debug)]
#[command(name = "dbforge")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Action to run: create, destroy or info.
    #[arg(long, short = 'a', env = "DBFORGE_ACTION")]
    pub action: Action,

    /// API token.
    #[arg(long, short = 't', env = "DBFORGE_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Database cluster name.
    #[arg(long, short = 's', env = "DBFORGE_SERVER_NAME")]
    pub server_name: ClusterName,

    /// Region slug, e.g. nyc1.
    #[arg(long, short = 'r', env = "DBFORGE_REGION")]
    pub region: String,

    /// Database user to create.
    #[arg(long, short = 'u', env = "DBFORGE_DATABASE_USER")]
    pub database_user: String,

    /// Database to create.
    #[arg(long, short = 'd', env = "DBFORGE_DATABASE_NAME")]
    pub database_name: String,

    /// Address allowed to connect to the cluster.
    #[arg(long, short = 'i', env = "DBFORGE_ALLOWED_IP")]
    pub allowed_ip: String,

    /// Write the cluster list here instead of stdout.
    #[arg(long, short = 'o', env = "DBFORGE_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Control plane base URL.
    #[arg(long, env = "DBFORGE_API_URL", default_value = DEFAULT_BASE_URL)]
    pub api_url: String,

    /// Database engine.
    #[arg(long, env = "DBFORGE_ENGINE")]
    pub engine: Option<Engine>,

    /// Engine version.
    #[arg(long = "engine-version", env = "DBFORGE_ENGINE_VERSION")]
    pub engine_version: Option<String>,

    /// Size slug.
    #[arg(long, env = "DBFORGE_SIZE")]
    pub size: Option<String>,

    /// Number of nodes.
    #[arg(long, env = "DBFORGE_NODES")]
    pub nodes: Option<u32>,

    /// Trusted source type for the firewall rule.
    #[arg(long, env = "DBFORGE_RULE_TYPE")]
    pub rule_type: Option<FirewallRuleType>,

    /// Authentication plugin for the database user.
    #[arg(long, env = "DBFORGE_AUTH_PLUGIN")]
    pub auth_plugin: Option<String>,

    /// Seconds between status checks while the cluster is creating.
    #[arg(long, env = "DBFORGE_POLL_INTERVAL")]
    pub poll_interval: Option<u64>,

    /// Seconds to wait for the cluster before giving up. 0 waits forever.
    #[arg(long, env = "DBFORGE_WAIT_TIMEOUT")]
    pub wait_timeout: Option<u64>,

    /// Status checks before giving up.
    #[arg(long, env = "DBFORGE_MAX_ATTEMPTS")]
    pub max_attempts: Option<u32>,

    /// Configure the cluster without waiting for it to leave `creating`.
    #[arg(long, env = "DBFORGE_NO_WAIT")]
    pub no_wait: bool,

    /// Treat a 500 on delete as an error instead of "already gone".
    #[arg(long, env = "DBFORGE_STRICT_DELETE")]
    pub strict_delete: bool,

    /// Per-request timeout in seconds.
    #[arg(long, env = "DBFORGE_REQUEST_TIMEOUT")]
    pub request_timeout: Option<u64>,
}

impl Args {
    /// Client settings.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(self.token.clone()).with_base_url(self.api_url.clone());
        if let Some(seconds) = self.request_timeout {
            config.request_timeout_seconds = seconds;
        }
        config
    }

    /// Workflow settings, with defaults for anything not given.
    #[must_use]
    pub fn provisioner_config(&self) -> ProvisionerConfig {
        let defaults = ProvisionerConfig::default();
        let wait_defaults = WaitConfig::default();

        ProvisionerConfig {
            engine: self.engine.unwrap_or(defaults.engine),
            version: self.engine_version.clone().unwrap_or(defaults.version),
            size: self.size.clone().unwrap_or(defaults.size),
            num_nodes: self.nodes.unwrap_or(defaults.num_nodes),
            firewall_rule_type: self.rule_type.unwrap_or(defaults.firewall_rule_type),
            auth_plugin: self.auth_plugin.clone().or(defaults.auth_plugin),
            wait_for_ready: !self.no_wait,
            delete_policy: if self.strict_delete {
                DeletePolicy::Strict
            } else {
                DeletePolicy::Compatible
            },
            wait: WaitConfig {
                interval_seconds: self.poll_interval.unwrap_or(wait_defaults.interval_seconds),
                timeout_seconds: match self.wait_timeout {
                    Some(0) => None,
                    Some(seconds) => Some(seconds),
                    None => wait_defaults.timeout_seconds,
                },
                max_attempts: self.max_attempts,
            },
        }
    }

    /// The command to run.
    #[must_use]
    pub fn command(&self) -> Command {
        Command::new(
            self.action,
            ProvisionRequest {
                cluster_name: self.server_name.clone(),
                region: self.region.clone(),
                database: self.database_name.clone(),
                user: self.database_user.clone(),
                allowed_source: self.allowed_ip.clone(),
            },
        )
    }
}
