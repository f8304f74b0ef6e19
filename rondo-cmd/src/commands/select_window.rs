//! Window selection: select-window, next-window, previous-window, last-window

use rondo_protocol::{Buffer, WireError};
use rondo_session::{SessionId, SessionManager};

use super::scan;
use crate::context::CmdCtx;
use crate::entry::{parse_as, recv_as, CmdEntry, Command};
use crate::error::ArgError;
use crate::slot::Slot;

pub static SELECT_WINDOW: CmdEntry = CmdEntry {
    name: "select-window",
    alias: Some("selectw"),
    usage: "index",
    requires_client: false,
    parse: parse_as::<SelectWindow>,
    recv: recv_as::<SelectWindow>,
};

pub static NEXT_WINDOW: CmdEntry = CmdEntry {
    name: "next-window",
    alias: Some("next"),
    usage: "",
    requires_client: false,
    parse: parse_as::<NextWindow>,
    recv: recv_as::<NextWindow>,
};

pub static PREVIOUS_WINDOW: CmdEntry = CmdEntry {
    name: "previous-window",
    alias: Some("prev"),
    usage: "",
    requires_client: false,
    parse: parse_as::<PreviousWindow>,
    recv: recv_as::<PreviousWindow>,
};

pub static LAST_WINDOW: CmdEntry = CmdEntry {
    name: "last-window",
    alias: Some("last"),
    usage: "",
    requires_client: false,
    parse: parse_as::<LastWindow>,
    recv: recv_as::<LastWindow>,
};

/// Make a slot current in the context session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectWindow {
    pub index: Slot,
}

impl Command for SelectWindow {
    const HEADER_LEN: usize = 4;

    fn parse(args: &[String]) -> Result<Self, ArgError> {
        let args = scan(args, "", 1, &SELECT_WINDOW)?;
        let [index] = args.positional() else {
            return Err(ArgError::usage(&SELECT_WINDOW));
        };
        Ok(Self {
            index: Slot::parse(index)?,
        })
    }

    fn exec(&self, ctx: &mut CmdCtx<'_>) {
        let Some(session) = ctx.target_session() else {
            return;
        };
        let Some((index, _)) = ctx.find_winlink(session, self.index) else {
            return;
        };

        if ctx.sessions.select_window(session, index) {
            ctx.host.redraw_session(session);
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

/// Move the context session's current slot with `step`, reporting `missing`
/// when there is nowhere to go
fn step_window(
    ctx: &mut CmdCtx<'_>,
    step: fn(&mut SessionManager, SessionId) -> Option<u32>,
    missing: &str,
) {
    let Some(session) = ctx.target_session() else {
        return;
    };
    if step(ctx.sessions, session).is_none() {
        ctx.error(missing);
        return;
    }
    ctx.host.redraw_session(session);
    ctx.finish();
}

macro_rules! step_command {
    ($name:ident, $entry:ident, $step:path, $missing:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name;

        impl Command for $name {
            const HEADER_LEN: usize = 0;

            fn parse(args: &[String]) -> Result<Self, ArgError> {
                scan(args, "", 0, &$entry)?;
                Ok(Self)
            }

            fn exec(&self, ctx: &mut CmdCtx<'_>) {
                step_window(ctx, $step, $missing);
            }

            fn send(&self, _buf: &mut Buffer) {}

            fn recv(_buf: &mut Buffer) -> Result<Self, WireError> {
                Ok(Self)
            }
        }
    };
}

step_command!(NextWindow, NEXT_WINDOW, SessionManager::next_window, "no next window");
step_command!(
    PreviousWindow,
    PREVIOUS_WINDOW,
    SessionManager::previous_window,
    "no previous window"
);
step_command!(LastWindow, LAST_WINDOW, SessionManager::last_window, "no last window");
