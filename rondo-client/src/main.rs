//! rondo client - command-line front end
//!
//! Parses one command locally, starts the server if needed, sends the
//! command and follows the replies. Exit status is 0 on success and 1 when
//! parsing or the command failed.

use std::path::PathBuf;
use std::process::ExitCode;

use tokio::io::BufReader;

use rondo_cmd::{pack, parse_argv, CmdTable};
use rondo_utils::{init_logging_with_config, LogConfig, Result, RondoError};

mod attach;
mod auto_start;
mod cli;
mod connection;

use attach::{drive, Outcome, Output};
use auto_start::{AutoStartConfig, Launcher, ServerStartResult};
use cli::Args;
use connection::Connection;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse_args();

    if let Err(e) = init_logging_with_config(LogConfig::client()) {
        eprintln!("rondo: logging disabled: {}", e);
    }
    tracing::debug!("CLI args: {:?}", args);

    match run(args).await {
        Ok(Outcome::Success) => ExitCode::SUCCESS,
        Ok(Outcome::Failure) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("rondo client error: {}", e);
            eprintln!("rondo: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<Outcome> {
    let table = CmdTable::new();

    // Bad arguments never reach the server.
    let cmd = match parse_argv(&table, &args.argv()) {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(Outcome::Failure);
        }
    };

    let socket = args.socket.clone().unwrap_or_else(rondo_utils::socket_path);
    let auto_start_config = AutoStartConfig {
        enabled: args.auto_start_enabled(),
        timeout_ms: args.server_timeout,
        ..Default::default()
    };

    let launcher = Launcher::new(&socket, auto_start_config);
    match launcher.ensure_running().await? {
        ServerStartResult::AlreadyRunning => tracing::debug!("Server already running"),
        ServerStartResult::Started => tracing::info!("Server started automatically"),
        ServerStartResult::NotRunning => {
            return Err(RondoError::ServerNotRunning { path: socket });
        }
    }

    let mut connection = connect(socket).await?;
    connection
        .send_command(pack(&cmd, args.session.as_deref()))
        .await?;

    let mut output = Output {
        out: std::io::stdout(),
        err: std::io::stderr(),
    };
    drive(
        &mut connection,
        &table,
        BufReader::new(tokio::io::stdin()),
        &mut output,
    )
    .await
}

async fn connect(socket: PathBuf) -> Result<Connection> {
    match Connection::connect(&socket).await {
        Err(e) if e.is_server_unavailable() => Err(RondoError::ServerNotRunning { path: socket }),
        other => other,
    }
}
