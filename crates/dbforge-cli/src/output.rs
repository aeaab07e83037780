//! Writing the cluster list.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;

/// Write `json` to `path`, or to stdout when no path is given.
pub fn write(json: &str, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("failed to write output to {}", path.display()))?;
            tracing::debug!(path = %path.display(), bytes = json.len(), "Output written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}").context("failed to write output to stdout")?;
            stdout.flush().context("failed to flush stdout")?;
        }
    }
    Ok(())
}
