// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines the destination, identity and terminal options.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "upstream-relay")]
#[command(about = "Relay a remote command or shell over SSH through local stdin and stdout")]
#[command(version)]
pub struct Cli {
    /// Remote destination as [user@]host[:port]
    pub destination: String,

    /// Command to run; starts an interactive shell when omitted
    #[arg(trailing_var_arg = true)]
    pub command: Vec<String>,

    /// Private key file (default: ~/.ssh/id_ed25519, id_rsa, id_ecdsa)
    #[arg(short, long)]
    pub identity: Option<PathBuf>,

    /// Port, overriding the one in the destination
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Accept and remember unknown host keys
    #[arg(long)]
    pub trust_on_first_use: bool,

    /// known_hosts file (default: ~/.ssh/known_hosts)
    #[arg(long)]
    pub known_hosts: Option<PathBuf>,

    /// Seconds without traffic before the connection is dropped
    #[arg(long, default_value_t = 30)]
    pub inactivity_timeout: u64,

    /// TERM sent with the shell's pty request (default: $TERM or xterm)
    #[arg(long)]
    pub term: Option<String>,

    /// Terminal width sent with the shell's pty request
    #[arg(long, default_value_t = 80)]
    pub cols: u32,

    /// Terminal height sent with the shell's pty request
    #[arg(long, default_value_t = 24)]
    pub rows: u32,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
