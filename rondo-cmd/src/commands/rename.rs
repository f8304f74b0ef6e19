//! rename-window and rename-session

use rondo_protocol::{Buffer, WireError};

use super::scan;
use crate::context::CmdCtx;
use crate::entry::{parse_as, recv_as, CmdEntry, Command};
use crate::error::ArgError;
use crate::slot::Slot;

pub static RENAME_WINDOW: CmdEntry = CmdEntry {
    name: "rename-window",
    alias: Some("renamew"),
    usage: "[-i index] new-name",
    requires_client: false,
    parse: parse_as::<RenameWindow>,
    recv: recv_as::<RenameWindow>,
};

pub static RENAME_SESSION: CmdEntry = CmdEntry {
    name: "rename-session",
    alias: Some("rename"),
    usage: "new-name",
    requires_client: false,
    parse: parse_as::<RenameSession>,
    recv: recv_as::<RenameSession>,
};

/// Rename a window everywhere it is shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameWindow {
    pub index: Slot,
    pub new_name: String,
}

impl Command for RenameWindow {
    const HEADER_LEN: usize = 4;

    fn parse(args: &[String]) -> Result<Self, ArgError> {
        let args = scan(args, "i:", 1, &RENAME_WINDOW)?;
        let index = Slot::parse_opt(args.value('i'))?;
        let [new_name] = args.positional() else {
            return Err(ArgError::usage(&RENAME_WINDOW));
        };
        Ok(Self {
            index,
            new_name: new_name.clone(),
        })
    }

    fn exec(&self, ctx: &mut CmdCtx<'_>) {
        let Some(session) = ctx.target_session() else {
            return;
        };
        let Some((_, window)) = ctx.find_winlink(session, self.index) else {
            return;
        };

        ctx.sessions.rename_window(window, &self.new_name);
        for shown in ctx.sessions.sessions_with_window(window) {
            ctx.host.redraw_session(shown);
        }

        ctx.finish();
    }

    fn send(&self, buf: &mut Buffer) {
        buf.write_i32(self.index.to_wire());
        buf.write_string(&self.new_name);
    }

    fn recv(buf: &mut Buffer) -> Result<Self, WireError> {
        let index = Slot::from_wire(buf.read_i32()?);
        let new_name = buf.read_string()?;
        Ok(Self { index, new_name })
    }
}

/// Rename the context session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameSession {
    pub new_name: String,
}

impl Command for RenameSession {
    const HEADER_LEN: usize = 0;

    fn parse(args: &[String]) -> Result<Self, ArgError> {
        let args = scan(args, "", 1, &RENAME_SESSION)?;
        let [new_name] = args.positional() else {
            return Err(ArgError::usage(&RENAME_SESSION));
        };
        Ok(Self {
            new_name: new_name.clone(),
        })
    }

    fn exec(&self, ctx: &mut CmdCtx<'_>) {
        let Some(session) = ctx.target_session() else {
            return;
        };
        if let Err(e) = ctx.sessions.rename_session(session, &self.new_name) {
            ctx.error(e.to_string());
            return;
        }
        ctx.host.redraw_session(session);
        ctx.finish();
    }

    fn send(&self, buf: &mut Buffer) {
        buf.write_string(&self.new_name);
    }

    fn recv(buf: &mut Buffer) -> Result<Self, WireError> {
        Ok(Self {
            new_name: buf.read_string()?,
        })
    }
}
