//! swap-window: exchange the windows shown in two slots

use rondo_protocol::{Buffer, WireError};
use tracing::debug;

use super::scan;
use crate::context::CmdCtx;
use crate::entry::{parse_as, recv_as, CmdEntry, Command};
use crate::error::ArgError;
use crate::slot::Slot;

pub static SWAP_WINDOW: CmdEntry = CmdEntry {
    name: "swap-window",
    alias: Some("swapw"),
    usage: "[-d] [-i index] name index",
    requires_client: false,
    parse: parse_as::<SwapWindow>,
    recv: recv_as::<SwapWindow>,
};

/// Swap slot `src_index` of session `src_name` with slot `dst_index` of the
/// context session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapWindow {
    pub dst_index: Slot,
    pub src_index: Slot,
    pub src_name: String,
    /// Leave the current slots alone
    pub detached: bool,
}

impl Command for SwapWindow {
    const HEADER_LEN: usize = 4 + 4 + 1;

    fn parse(args: &[String]) -> Result<Self, ArgError> {
        let args = scan(args, "di:", 2, &SWAP_WINDOW)?;
        let dst_index = Slot::parse_opt(args.value('i'))?;
        let [src_name, src_index] = args.positional() else {
            return Err(ArgError::usage(&SWAP_WINDOW));
        };

        Ok(Self {
            dst_index,
            src_index: Slot::parse(src_index)?,
            src_name: src_name.clone(),
            detached: args.has('d'),
        })
    }

    fn exec(&self, ctx: &mut CmdCtx<'_>) {
        let Some(src) = ctx.find_session(&self.src_name) else {
            return;
        };
        let Some((src_index, _)) = ctx.find_winlink(src, self.src_index) else {
            return;
        };
        let Some(dst) = ctx.target_session() else {
            return;
        };
        let Some((dst_index, _)) = ctx.find_winlink(dst, self.dst_index) else {
            return;
        };

        debug!(src_index, dst_index, "swapping windows");
        if let Err(e) = ctx.sessions.swap_windows((src, src_index), (dst, dst_index)) {
            ctx.error(e.to_string());
            return;
        }

        if !self.detached {
            ctx.sessions.select_window(dst, dst_index);
            if src != dst {
                ctx.sessions.select_window(src, src_index);
            }
        }
        ctx.host.redraw_session(src);
        if src != dst {
            ctx.host.redraw_session(dst);
        }

        ctx.finish();
    }

    fn send(&self, buf: &mut Buffer) {
        buf.write_i32(self.dst_index.to_wire());
        buf.write_i32(self.src_index.to_wire());
        buf.write_flag(self.detached);
        buf.write_string(&self.src_name);
    }

    fn recv(buf: &mut Buffer) -> Result<Self, WireError> {
        let dst_index = Slot::from_wire(buf.read_i32()?);
        let src_index = Slot::from_wire(buf.read_i32()?);
        let detached = buf.read_flag()?;
        let src_name = buf.read_string()?;

        Ok(Self {
            dst_index,
            src_index,
            src_name,
            detached,
        })
    }
}
