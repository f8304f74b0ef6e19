//! Command descriptors and the per-command lifecycle

use rondo_protocol::{Buffer, WireError};

use crate::commands::Cmd;
use crate::context::CmdCtx;
use crate::error::ArgError;

/// The lifecycle every command kind implements
///
/// An instance is created by [`parse`](Command::parse) or
/// [`recv`](Command::recv) and owned outright by whichever side holds it;
/// release is its `Drop`.
pub trait Command: Sized + Into<Cmd> {
    /// Size of the fixed-size fields written ahead of any strings
    const HEADER_LEN: usize;

    /// Build an instance from the words following the command name
    ///
    /// Either a fully initialised instance is returned or nothing survives.
    fn parse(args: &[String]) -> Result<Self, ArgError>;

    /// Run against live state
    ///
    /// Every lookup happens before the first mutation; failures are reported
    /// through the context and leave state untouched.
    fn exec(&self, ctx: &mut CmdCtx<'_>);

    /// Append fixed fields in declaration order, then strings
    fn send(&self, buf: &mut Buffer);

    /// Read back what [`send`](Command::send) wrote
    fn recv(buf: &mut Buffer) -> Result<Self, WireError>;
}

/// Static descriptor of one command kind
#[derive(Debug)]
pub struct CmdEntry {
    pub name: &'static str,
    pub alias: Option<&'static str>,
    pub usage: &'static str,
    /// The command acts on the invoker's attached client
    pub requires_client: bool,
    pub parse: fn(&[String]) -> Result<Cmd, ArgError>,
    pub recv: fn(&mut Buffer) -> Result<Cmd, WireError>,
}

impl CmdEntry {
    /// Whether `name` is this entry's name or alias
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.alias == Some(name)
    }
}

/// Parse step of an entry, erased to [`Cmd`]
pub fn parse_as<C: Command>(args: &[String]) -> Result<Cmd, ArgError> {
    C::parse(args).map(Into::into)
}

/// Receive step of an entry, erased to [`Cmd`]
///
/// A payload shorter than the fixed header is rejected before any field is
/// read.
pub fn recv_as<C: Command>(buf: &mut Buffer) -> Result<Cmd, WireError> {
    buf.require(C::HEADER_LEN)?;
    C::recv(buf).map(Into::into)
}
