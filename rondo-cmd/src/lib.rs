//! rondo-cmd: the command layer of rondo
//!
//! Every user-facing command is a value type implementing [`Command`]:
//! it is parsed from argv, executed against a [`CmdCtx`], and written to or
//! read from a [`Buffer`](rondo_protocol::Buffer) so a client can hand it to
//! the server. [`CmdTable`] maps names and aliases to the static
//! [`CmdEntry`] descriptors, and [`dispatch`] threads an instance through
//! the local and remote paths.

pub mod args;
pub mod commands;
pub mod context;
pub mod dispatch;
pub mod entry;
pub mod error;
pub mod slot;

pub use commands::{Cmd, ENTRIES};
pub use context::{CmdCtx, CmdHost};
pub use dispatch::{pack, parse_argv, parse_line, run, run_line, unpack, CmdTable};
pub use entry::{CmdEntry, Command};
pub use error::{ArgError, CmdError};
pub use slot::Slot;
