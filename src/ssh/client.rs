// ABOUTME: SSH connection setup using russh.
// ABOUTME: Dials a host, verifies its key against known_hosts and authenticates with given keys.

use super::error::{Error, Result};
use russh::client::{self, Config, Handle};
use russh::keys::known_hosts::{
    check_known_hosts, check_known_hosts_path, learn_known_hosts, learn_known_hosts_path,
};
use russh::keys::{PrivateKeyWithHashAlg, ssh_key};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Where and as whom to connect.
#[derive(Debug, Clone)]
pub struct DialConfig {
    /// Remote host to connect to.
    pub host: String,
    /// SSH port (default: 22).
    pub port: u16,
    /// Username for authentication.
    pub user: String,
    /// Accept and record unknown host keys instead of refusing them.
    pub trust_on_first_use: bool,
    /// known_hosts file; `None` means ~/.ssh/known_hosts.
    pub known_hosts_path: Option<PathBuf>,
    /// Drop the connection after this long without traffic (default: 30s).
    pub inactivity_timeout: Option<Duration>,
}

impl DialConfig {
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            user: user.into(),
            trust_on_first_use: false,
            known_hosts_path: None,
            inactivity_timeout: Some(Duration::from_secs(30)),
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn trust_on_first_use(mut self, tofu: bool) -> Self {
        self.trust_on_first_use = tofu;
        self
    }

    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    pub fn inactivity_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.inactivity_timeout = timeout;
        self
    }

    /// `host:port` as dialed.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// What to do with a server's host key after the known_hosts lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostKeyVerdict {
    Accept,
    /// Accept and record it in known_hosts.
    Learn,
    Reject,
}

fn host_key_verdict(
    known: std::result::Result<bool, russh::keys::Error>,
    trust_on_first_use: bool,
) -> HostKeyVerdict {
    match known {
        Ok(true) => HostKeyVerdict::Accept,
        Err(russh::keys::Error::KeyChanged { .. }) => HostKeyVerdict::Reject,
        Ok(false) if trust_on_first_use => HostKeyVerdict::Learn,
        // Unreadable known_hosts: trust the key for this connection only.
        Err(_) if trust_on_first_use => HostKeyVerdict::Accept,
        Ok(false) | Err(_) => HostKeyVerdict::Reject,
    }
}

/// russh client handler verifying the server's host key.
pub struct ClientHandler {
    host: String,
    port: u16,
    trust_on_first_use: bool,
    known_hosts_path: Option<PathBuf>,
}

impl ClientHandler {
    pub fn new(config: &DialConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            trust_on_first_use: config.trust_on_first_use,
            known_hosts_path: config.known_hosts_path.clone(),
        }
    }

    fn learn(&self, key: &ssh_key::PublicKey) {
        let learned = match &self.known_hosts_path {
            Some(path) => learn_known_hosts_path(&self.host, self.port, key, path),
            None => learn_known_hosts(&self.host, self.port, key),
        };
        if let Err(e) = learned {
            tracing::warn!("Failed to save host key to known_hosts: {}", e);
        }
    }
}

impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let known = match &self.known_hosts_path {
            Some(path) => check_known_hosts_path(&self.host, self.port, server_public_key, path),
            None => check_known_hosts(&self.host, self.port, server_public_key),
        };

        if let Err(russh::keys::Error::KeyChanged { .. }) = &known {
            tracing::error!(host = %self.host, port = self.port, "host key changed");
        }

        match host_key_verdict(known, self.trust_on_first_use) {
            HostKeyVerdict::Accept => Ok(true),
            HostKeyVerdict::Learn => {
                tracing::warn!(
                    "Trust-On-First-Use: accepting unknown host key for {}:{}",
                    self.host,
                    self.port
                );
                self.learn(server_public_key);
                Ok(true)
            }
            HostKeyVerdict::Reject => Ok(false),
        }
    }
}

/// Dial `config` and authenticate with the first of `keys` the server accepts.
pub async fn connect(
    config: &DialConfig,
    keys: &[Arc<ssh_key::PrivateKey>],
) -> Result<Handle<ClientHandler>> {
    if keys.is_empty() {
        return Err(Error::AuthenticationFailed);
    }

    let russh_config = Config {
        inactivity_timeout: config.inactivity_timeout,
        ..Default::default()
    };

    let mut handle = client::connect(
        Arc::new(russh_config),
        (config.host.as_str(), config.port),
        ClientHandler::new(config),
    )
    .await
    .map_err(|e| {
        if e.to_string().contains("Connection refused") {
            Error::Connection(format!(
                "connection refused to {}:{}",
                config.host, config.port
            ))
        } else {
            Error::Connection(e.to_string())
        }
    })?;

    let hash_alg = handle
        .best_supported_rsa_hash()
        .await
        .map_err(Error::Protocol)?
        .flatten();

    for key in keys {
        let result = handle
            .authenticate_publickey(
                &config.user,
                PrivateKeyWithHashAlg::new(Arc::clone(key), hash_alg),
            )
            .await
            .map_err(Error::Protocol)?;
        if result.success() {
            tracing::debug!(addr = %config.addr(), user = %config.user, "authenticated");
            return Ok(handle);
        }
    }

    Err(Error::AuthenticationFailed)
}
