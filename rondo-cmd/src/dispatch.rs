//! The descriptor table and the paths an instance takes through it
//!
//! Remote path: [`parse_argv`] on the client, [`pack`] into a
//! [`CommandMessage`], [`unpack`] on the server, then [`run`]. Local path:
//! [`run_line`], which never touches the transport.

use std::collections::HashMap;

use rondo_protocol::{Buffer, CommandMessage, WireError};
use tracing::debug;

use crate::commands::{Cmd, ENTRIES};
use crate::context::CmdCtx;
use crate::entry::CmdEntry;
use crate::error::CmdError;

/// Immutable name and alias index over every command descriptor
#[derive(Debug)]
pub struct CmdTable {
    by_name: HashMap<&'static str, &'static CmdEntry>,
}

impl CmdTable {
    /// Build the table once; names and aliases must all be distinct
    pub fn new() -> Self {
        let mut by_name = HashMap::with_capacity(ENTRIES.len() * 2);
        for &entry in ENTRIES {
            for key in std::iter::once(entry.name).chain(entry.alias) {
                let previous = by_name.insert(key, entry);
                debug_assert!(previous.is_none(), "duplicate command name: {}", key);
            }
        }
        Self { by_name }
    }

    /// Find a descriptor by exact name or alias
    pub fn lookup(&self, name: &str) -> Option<&'static CmdEntry> {
        self.by_name.get(name).copied()
    }

    /// Every descriptor, in registration order
    pub fn entries(&self) -> impl Iterator<Item = &'static CmdEntry> {
        ENTRIES.iter().copied()
    }
}

impl Default for CmdTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Look up `argv[0]` and parse the rest
pub fn parse_argv(table: &CmdTable, argv: &[String]) -> Result<Cmd, CmdError> {
    let (name, args) = argv.split_first().ok_or(CmdError::Empty)?;
    let entry = table
        .lookup(name)
        .ok_or_else(|| CmdError::UnknownCommand(name.clone()))?;
    Ok((entry.parse)(args)?)
}

/// Serialise an instance for the server
///
/// `session` is the context session the client asks for, if any.
pub fn pack(cmd: &Cmd, session: Option<&str>) -> CommandMessage {
    let mut buf = Buffer::new();
    cmd.send(&mut buf);

    CommandMessage {
        name: cmd.entry().name.to_string(),
        session: session.map(String::from),
        payload: buf.into_vec(),
    }
}

/// Rebuild an instance from a received message
///
/// Any failure is a protocol violation; the payload must be consumed
/// exactly.
pub fn unpack(table: &CmdTable, msg: &CommandMessage) -> Result<Cmd, WireError> {
    let entry = table
        .lookup(&msg.name)
        .ok_or_else(|| WireError::UnknownCommand(msg.name.clone()))?;

    let mut buf = Buffer::from_slice(&msg.payload);
    let cmd = (entry.recv)(&mut buf)?;
    buf.finish()?;
    Ok(cmd)
}

/// Execute an instance
///
/// Commands that act on an attached client are refused without one.
pub fn run(cmd: &Cmd, ctx: &mut CmdCtx<'_>) {
    let entry = cmd.entry();
    if entry.requires_client && ctx.curclient.is_none() {
        ctx.error(format!("{} requires an attached client", entry.name));
        return;
    }

    debug!(command = entry.name, "executing command");
    cmd.exec(ctx);
}

/// Parse a typed command line, split into words with shell quoting rules
///
/// A line with no words yields `None`.
pub fn parse_line(table: &CmdTable, line: &str) -> Result<Option<Cmd>, CmdError> {
    let argv = shell_words::split(line).map_err(|_| CmdError::UnterminatedQuote)?;
    if argv.is_empty() {
        return Ok(None);
    }
    parse_argv(table, &argv).map(Some)
}

/// Parse and execute a command line locally
pub fn run_line(table: &CmdTable, line: &str, ctx: &mut CmdCtx<'_>) -> Result<(), CmdError> {
    let cmd = parse_line(table, line)?.ok_or(CmdError::Empty)?;
    run(&cmd, ctx);
    Ok(())
}
