// ABOUTME: Application-wide error types for upstream-relay.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid destination: {0}")]
    InvalidTarget(String),

    #[error("failed to load key from {path}: {reason}")]
    KeyLoadFailed { path: PathBuf, reason: String },

    #[error("no identity given and no default key found in ~/.ssh")]
    NoIdentity,

    #[error(transparent)]
    Ssh(#[from] crate::ssh::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
