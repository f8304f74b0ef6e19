//! Command-line argument parsing for the rondo client
//!
//! Uses clap for the client's own flags. Everything after them is a rondo
//! command line, parsed later by the command table.

use clap::Parser;
use std::path::PathBuf;

/// Command run when none is given
pub const DEFAULT_COMMAND: &str = "new-session";

/// rondo - terminal session multiplexer client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Custom socket path
    ///
    /// Override the default Unix socket path for connecting to the server.
    #[arg(long, short = 'S')]
    pub socket: Option<PathBuf>,

    /// Session to run the command against
    ///
    /// When omitted the server uses the attached session, then the most
    /// recently active one.
    #[arg(long, short = 's', env = "RONDO_SESSION")]
    pub session: Option<String>,

    /// Disable automatic server startup
    #[arg(long, default_value_t = false)]
    pub no_auto_start: bool,

    /// Server startup timeout in milliseconds
    #[arg(long, default_value_t = 2000)]
    pub server_timeout: u64,

    /// Command and its arguments, e.g. `swap-window -d work 1`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl Args {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Check if auto-start is enabled
    pub fn auto_start_enabled(&self) -> bool {
        !self.no_auto_start
    }

    /// The command argv, defaulting to `new-session`
    pub fn argv(&self) -> Vec<String> {
        if self.command.is_empty() {
            vec![DEFAULT_COMMAND.to_string()]
        } else {
            self.command.clone()
        }
    }
}
