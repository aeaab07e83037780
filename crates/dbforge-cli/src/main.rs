//! dbforge - provision and destroy managed database clusters.
//!
//! This is the entry point for the `dbforge` binary. Logs go to stderr;
//! stdout carries only the JSON cluster list, so it can be piped.
//!
//! # Exit codes
//!
//! | Code | Meaning                                  |
//! |------|------------------------------------------|
//! | 0    | Success, including "already exists"      |
//! | 1    | Other failure                            |
//! | 2    | Invalid arguments or configuration       |
//! | 3    | Control plane unreachable                |
//! | 4    | Unexpected or malformed response         |
//! | 5    | Timed out waiting for the cluster        |
//! | 130  | Interrupted                              |

mod args;
mod output;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use dbforge_client::HttpControlPlaneClient;
use dbforge_control::ControlError;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dbforge=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Command failed");
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let client_config = args.client_config();
    let config = args.provisioner_config();

    tracing::info!(
        action = %args.action,
        cluster = %args.server_name,
        region = %args.region,
        api_url = %client_config.base_url,
        output = ?args.output,
        "Configuration loaded"
    );

    let client =
        Arc::new(HttpControlPlaneClient::new(&client_config).map_err(ControlError::from)?);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling");
            trigger.cancel();
        }
        // A second interrupt does not wait for the workflow to unwind.
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Second interrupt received, exiting");
            std::process::exit(130);
        }
    });

    let finished = args.command().execute(client, &config, &cancel).await?;

    tracing::info!(
        action = %finished.action,
        changed = finished.changed(),
        clusters = finished.clusters.len(),
        "Command finished"
    );

    output::write(&finished.to_json(), args.output.as_deref())
}

/// Map an error onto the process exit code.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<ControlError>()
        .map_or(1, ControlError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbforge_client::ClientError;
    use dbforge_core::ClusterName;

    #[test]
    fn exit_codes_follow_control_errors() {
        let timeout = anyhow::Error::new(ControlError::WaitTimeout {
            name: ClusterName::new("orders").unwrap(),
            attempts: 3,
            elapsed: std::time::Duration::from_secs(30),
        });
        assert_eq!(exit_code(&timeout), 5);

        let token = anyhow::Error::new(ControlError::from(ClientError::InvalidToken(
            "empty".into(),
        )));
        assert_eq!(exit_code(&token), 2);

        let io = anyhow::anyhow!("disk full");
        assert_eq!(exit_code(&io), 1);
    }

    #[test]
    fn context_does_not_hide_the_exit_code() {
        let err = anyhow::Error::new(ControlError::Cancelled(ClusterName::new("orders").unwrap()))
            .context("create failed");
        assert_eq!(exit_code(&err), 130);
    }
}
