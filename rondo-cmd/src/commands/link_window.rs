//! link-window and unlink-window: share a window between sessions

use rondo_protocol::{Buffer, WireError};
use rondo_session::MAX_INDEX;
use tracing::debug;

use super::scan;
use crate::context::CmdCtx;
use crate::entry::{parse_as, recv_as, CmdEntry, Command};
use crate::error::ArgError;
use crate::slot::Slot;

pub static LINK_WINDOW: CmdEntry = CmdEntry {
    name: "link-window",
    alias: Some("linkw"),
    usage: "[-dk] [-i index] name index",
    requires_client: false,
    parse: parse_as::<LinkWindow>,
    recv: recv_as::<LinkWindow>,
};

pub static UNLINK_WINDOW: CmdEntry = CmdEntry {
    name: "unlink-window",
    alias: Some("unlinkw"),
    usage: "[-i index]",
    requires_client: false,
    parse: parse_as::<UnlinkWindow>,
    recv: recv_as::<UnlinkWindow>,
};

/// Link the window in slot `src_index` of `src_name` into the context
/// session at `dst_index`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkWindow {
    /// Unset means the first free slot
    pub dst_index: Slot,
    pub src_index: Slot,
    pub src_name: String,
    pub detached: bool,
    /// Replace whatever the destination slot shows
    pub kill: bool,
}

impl Command for LinkWindow {
    const HEADER_LEN: usize = 4 + 4 + 1 + 1;

    fn parse(args: &[String]) -> Result<Self, ArgError> {
        let args = scan(args, "dki:", 2, &LINK_WINDOW)?;
        let dst_index = Slot::parse_opt(args.value('i'))?;
        let [src_name, src_index] = args.positional() else {
            return Err(ArgError::usage(&LINK_WINDOW));
        };

        Ok(Self {
            dst_index,
            src_index: Slot::parse(src_index)?,
            src_name: src_name.clone(),
            detached: args.has('d'),
            kill: args.has('k'),
        })
    }

    fn exec(&self, ctx: &mut CmdCtx<'_>) {
        let Some(src) = ctx.find_session(&self.src_name) else {
            return;
        };
        let Some((_, window)) = ctx.find_winlink(src, self.src_index) else {
            return;
        };
        let Some(dst) = ctx.target_session() else {
            return;
        };

        let Some(session) = ctx.sessions.session(dst) else {
            return;
        };
        let Some(index) = self
            .dst_index
            .index()
            .or_else(|| session.first_free_index(ctx.base_index))
        else {
            ctx.error(format!("index in use: {}", MAX_INDEX));
            return;
        };
        let shown = session.window_at(index);

        let linked = match shown {
            Some(existing) if existing == window => {
                ctx.error("window already linked");
                return;
            }
            Some(_) if !self.kill => {
                ctx.error(format!("index in use: {}", index));
                return;
            }
            Some(_) => ctx.sessions.replace_window(dst, index, window),
            None => ctx.sessions.link_window(dst, index, window),
        };
        if let Err(e) = linked {
            ctx.error(e.to_string());
            return;
        }
        debug!(index, "linked window");

        if !self.detached {
            ctx.sessions.select_window(dst, index);
        }
        ctx.host.redraw_session(dst);

        ctx.finish();
    }

    fn send(&self, buf: &mut Buffer) {
        buf.write_i32(self.dst_index.to_wire());
        buf.write_i32(self.src_index.to_wire());
        buf.write_flag(self.detached);
        buf.write_flag(self.kill);
        buf.write_string(&self.src_name);
    }

    fn recv(buf: &mut Buffer) -> Result<Self, WireError> {
        let dst_index = Slot::from_wire(buf.read_i32()?);
        let src_index = Slot::from_wire(buf.read_i32()?);
        let detached = buf.read_flag()?;
        let kill = buf.read_flag()?;
        let src_name = buf.read_string()?;

        Ok(Self {
            dst_index,
            src_index,
            src_name,
            detached,
            kill,
        })
    }
}

/// Remove a slot from the context session, keeping the window alive elsewhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlinkWindow {
    pub index: Slot,
}

impl Command for UnlinkWindow {
    const HEADER_LEN: usize = 4;

    fn parse(args: &[String]) -> Result<Self, ArgError> {
        let args = scan(args, "i:", 0, &UNLINK_WINDOW)?;
        Ok(Self {
            index: Slot::parse_opt(args.value('i'))?,
        })
    }

    fn exec(&self, ctx: &mut CmdCtx<'_>) {
        let Some(session) = ctx.target_session() else {
            return;
        };
        let Some((index, window)) = ctx.find_winlink(session, self.index) else {
            return;
        };

        let references = ctx.sessions.window(window).map_or(0, |w| w.references());
        if references <= 1 {
            ctx.error("window is not linked elsewhere");
            return;
        }

        match ctx.sessions.unlink_window(session, index) {
            Ok(true) => ctx.host.redraw_session(session),
            Ok(false) => {}
            Err(e) => {
                ctx.error(e.to_string());
                return;
            }
        }

        ctx.finish();
    }

    fn send(&self, buf: &mut Buffer) {
        buf.write_i32(self.index.to_wire());
    }

    fn recv(buf: &mut Buffer) -> Result<Self, WireError> {
        Ok(Self {
            index: Slot::from_wire(buf.read_i32()?),
        })
    }
}
