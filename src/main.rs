// ABOUTME: Entry point for the upstream-relay CLI application.
// ABOUTME: Dials the destination and relays a command or shell through local stdio.

mod cli;

use clap::Parser;
use cli::Cli;
use russh::keys::load_secret_key;
use russh::keys::ssh_key::PrivateKey;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use upstream_relay::config::Target;
use upstream_relay::error::{Error, Result};
use upstream_relay::ssh::{Combined, PtyRequest, Upstream};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(status) => std::process::exit(status),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(255);
        }
    }
}

/// Relay the requested command or shell; returns the local exit code.
async fn run(cli: Cli) -> Result<i32> {
    let target = Target::parse(&cli.destination)?.with_port(cli.port);
    let timeout = (cli.inactivity_timeout > 0).then(|| Duration::from_secs(cli.inactivity_timeout));
    let config = target.dial_config(cli.trust_on_first_use, cli.known_hosts.clone(), timeout)?;
    let key = load_identity(cli.identity.as_deref())?;

    let upstream = Upstream::dial(&config, &[key]).await?;
    tracing::debug!(%upstream, "connected");

    let local = Combined::new(tokio::io::stdin(), tokio::io::stdout());
    let result = if cli.command.is_empty() {
        let term = cli
            .term
            .or_else(|| std::env::var("TERM").ok())
            .unwrap_or_else(|| "xterm".to_string());
        let pty = PtyRequest::new(term, cli.cols, cli.rows);
        match upstream.pipe_shell(local, Some(&pty)).await {
            Ok(()) => Ok(0),
            Err(upstream_relay::ssh::Error::Exited(status)) => Ok(status as i32),
            Err(e) => Err(e),
        }
    } else {
        let command = cli.command.join(" ");
        upstream
            .pipe_command(local, &command)
            .await
            .map(|status| status as i32)
    };

    // Closing is best effort; the relay result is what the user cares about.
    if let Err(e) = upstream.close().await {
        tracing::warn!("failed to close {}: {}", upstream, e);
    }

    Ok(result?)
}

/// Load the given identity, or the first default key that loads.
fn load_identity(path: Option<&Path>) -> Result<Arc<PrivateKey>> {
    if let Some(path) = path {
        let key = load_secret_key(path, None).map_err(|e| Error::KeyLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        return Ok(Arc::new(key));
    }

    let home = std::env::var("HOME").map_err(|_| Error::NoIdentity)?;
    ["id_ed25519", "id_rsa", "id_ecdsa"]
        .iter()
        .map(|name| PathBuf::from(&home).join(".ssh").join(name))
        .find_map(|path| load_secret_key(&path, None).ok())
        .map(Arc::new)
        .ok_or(Error::NoIdentity)
}
