// ABOUTME: Relay target configuration.
// ABOUTME: Parses destinations like "host", "user@host", "host:port", "user@host:port".

use crate::error::{Error, Result};
use crate::ssh::DialConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Remote endpoint to relay to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
}

impl Target {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidTarget("destination cannot be empty".to_string()));
        }

        // Parse format: [user@]host[:port]
        let (user_part, rest) = match s.find('@') {
            Some(at_pos) => (Some(&s[..at_pos]), &s[at_pos + 1..]),
            None => (None, s),
        };

        let (host, port) = match rest.rfind(':') {
            Some(colon_pos) => {
                let port_str = &rest[colon_pos + 1..];
                let port = port_str
                    .parse::<u16>()
                    .map_err(|_| Error::InvalidTarget(format!("invalid port: {}", port_str)))?;
                (&rest[..colon_pos], port)
            }
            None => (rest, 22),
        };

        if host.is_empty() {
            return Err(Error::InvalidTarget("hostname cannot be empty".to_string()));
        }
        if user_part.is_some_and(str::is_empty) {
            return Err(Error::InvalidTarget("username cannot be empty".to_string()));
        }

        Ok(Target {
            host: host.to_string(),
            port,
            user: user_part.map(|s| s.to_string()),
        })
    }

    /// Override the port parsed from the destination.
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    /// Username to log in as, falling back to `$USER`.
    pub fn user_or_env(&self) -> Result<String> {
        match &self.user {
            Some(user) => Ok(user.clone()),
            None => std::env::var("USER").map_err(|_| {
                Error::InvalidTarget("no user in destination and USER not set".to_string())
            }),
        }
    }

    pub fn dial_config(
        &self,
        trust_on_first_use: bool,
        known_hosts: Option<PathBuf>,
        inactivity_timeout: Option<Duration>,
    ) -> Result<DialConfig> {
        let mut config = DialConfig::new(&self.host, self.user_or_env()?)
            .port(self.port)
            .trust_on_first_use(trust_on_first_use)
            .inactivity_timeout(inactivity_timeout);
        if let Some(path) = known_hosts {
            config = config.known_hosts_path(path);
        }
        Ok(config)
    }
}
