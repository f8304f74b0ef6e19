//! The client side of a command's lifetime
//!
//! A one-shot client prints what the server sends until it is told to exit.
//! If the command attaches it instead, the client stays connected: status
//! redraws are shown and command lines typed on stdin are sent back over
//! the same connection.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use rondo_cmd::{pack, CmdError, CmdTable};
use rondo_protocol::{CommandMessage, ServerMessage};
use rondo_utils::{Result, RondoError};

use crate::connection::Connection;

/// How the client finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// Where output goes
pub struct Output<O, E> {
    pub out: O,
    pub err: E,
}

impl<O: Write, E: Write> Output<O, E> {
    fn line(&mut self, line: &str) -> Result<()> {
        writeln!(self.out, "{}", line)?;
        self.out.flush()?;
        Ok(())
    }

    fn error(&mut self, line: &str) -> Result<()> {
        writeln!(self.err, "{}", line)?;
        Ok(())
    }
}

/// Parse one typed command line; blank lines yield nothing
pub fn parse_line(
    table: &CmdTable,
    line: &str,
    session: Option<&str>,
) -> std::result::Result<Option<CommandMessage>, CmdError> {
    let cmd = rondo_cmd::parse_line(table, line)?;
    Ok(cmd.map(|cmd| pack(&cmd, session)))
}

/// Follow the server's replies to a command that has already been sent
pub async fn drive<R, O, E>(
    connection: &mut Connection,
    table: &CmdTable,
    input: R,
    output: &mut Output<O, E>,
) -> Result<Outcome>
where
    R: AsyncBufRead + Unpin,
    O: Write,
    E: Write,
{
    let mut failed = false;

    // One-shot phase: stdin is not read until the server attaches us.
    let session = loop {
        match connection.recv().await? {
            Some(ServerMessage::Print { line }) => output.line(&line)?,
            Some(ServerMessage::Error { message }) => {
                output.error(&message)?;
                failed = true;
            }
            Some(ServerMessage::Exit) => {
                return Ok(if failed {
                    Outcome::Failure
                } else {
                    Outcome::Success
                });
            }
            Some(ServerMessage::Attached { session }) => break session,
            Some(other) => tracing::debug!("Ignoring {:?} before attach", other),
            None => return Err(RondoError::ConnectionClosed),
        }
    };

    tracing::info!("Attached to {}", session);
    attached(connection, table, input, output).await
}

async fn attached<R, O, E>(
    connection: &mut Connection,
    table: &CmdTable,
    input: R,
    output: &mut Output<O, E>,
) -> Result<Outcome>
where
    R: AsyncBufRead + Unpin,
    O: Write,
    E: Write,
{
    let mut lines = input.lines();

    loop {
        tokio::select! {
            message = connection.recv() => match message? {
                Some(ServerMessage::Redraw { status }) => {
                    if !status.is_empty() {
                        output.line(&status)?;
                    }
                }
                Some(ServerMessage::Print { line }) => output.line(&line)?,
                Some(ServerMessage::Error { message }) => output.error(&message)?,
                Some(ServerMessage::Attached { session }) => {
                    tracing::info!("Switched to {}", session);
                }
                Some(ServerMessage::Detached) => {
                    output.line("[detached]")?;
                    return Ok(Outcome::Success);
                }
                Some(ServerMessage::Exit) => {
                    output.line("[exited]")?;
                    return Ok(Outcome::Success);
                }
                Some(ServerMessage::Connected { .. }) => {}
                None => {
                    output.error("[lost server]")?;
                    return Ok(Outcome::Failure);
                }
            },
            line = lines.next_line() => match line? {
                Some(line) => match parse_line(table, &line, None) {
                    Ok(Some(msg)) => connection.send_command(msg).await?,
                    Ok(None) => {}
                    Err(e) => output.error(&e.to_string())?,
                },
                None => {
                    tracing::debug!("Input closed, leaving session");
                    return Ok(Outcome::Success);
                }
            },
        }
    }
}
