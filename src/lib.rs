// ABOUTME: Library root for upstream-relay - exposes the upstream session API.
// ABOUTME: The command-line relay is in main.rs.

pub mod config;
pub mod error;
pub mod ssh;
