//! list-sessions and list-windows

use chrono::{DateTime, Local};
use rondo_protocol::{Buffer, WireError};

use super::scan;
use crate::context::CmdCtx;
use crate::entry::{parse_as, recv_as, CmdEntry, Command};
use crate::error::ArgError;

pub static LIST_SESSIONS: CmdEntry = CmdEntry {
    name: "list-sessions",
    alias: Some("ls"),
    usage: "",
    requires_client: false,
    parse: parse_as::<ListSessions>,
    recv: recv_as::<ListSessions>,
};

pub static LIST_WINDOWS: CmdEntry = CmdEntry {
    name: "list-windows",
    alias: Some("lsw"),
    usage: "",
    requires_client: false,
    parse: parse_as::<ListWindows>,
    recv: recv_as::<ListWindows>,
};

/// ctime-style timestamp
const CREATED_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSessions;

impl Command for ListSessions {
    const HEADER_LEN: usize = 0;

    fn parse(args: &[String]) -> Result<Self, ArgError> {
        scan(args, "", 0, &LIST_SESSIONS)?;
        Ok(Self)
    }

    fn exec(&self, ctx: &mut CmdCtx<'_>) {
        let lines: Vec<String> = ctx
            .sessions
            .list_sessions()
            .into_iter()
            .map(|session| {
                let created: DateTime<Local> = session.created_at().into();
                format!(
                    "{}: {} windows (created {}){}",
                    session.name(),
                    session.window_count(),
                    created.format(CREATED_FORMAT),
                    if session.attached_clients() > 0 {
                        " [attached]"
                    } else {
                        ""
                    }
                )
            })
            .collect();

        for line in lines {
            ctx.host.print(line);
        }
        ctx.finish();
    }

    fn send(&self, _buf: &mut Buffer) {}

    fn recv(_buf: &mut Buffer) -> Result<Self, WireError> {
        Ok(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListWindows;

impl Command for ListWindows {
    const HEADER_LEN: usize = 0;

    fn parse(args: &[String]) -> Result<Self, ArgError> {
        scan(args, "", 0, &LIST_WINDOWS)?;
        Ok(Self)
    }

    fn exec(&self, ctx: &mut CmdCtx<'_>) {
        let Some(id) = ctx.target_session() else {
            return;
        };
        let Some(session) = ctx.sessions.session(id) else {
            return;
        };

        let mut lines = Vec::with_capacity(session.window_count());
        for (index, window_id) in session.winlinks() {
            let Some(window) = ctx.sessions.window(window_id) else {
                continue;
            };
            let flag = if session.current_index() == Some(index) {
                "*"
            } else if session.last_index() == Some(index) {
                "-"
            } else {
                ""
            };
            let linked = if window.references() > 1 { " (linked)" } else { "" };
            lines.push(format!("{}: {}{}{}", index, window.name(), flag, linked));
        }

        for line in lines {
            ctx.host.print(line);
        }
        ctx.finish();
    }

    fn send(&self, _buf: &mut Buffer) {}

    fn recv(_buf: &mut Buffer) -> Result<Self, WireError> {
        Ok(Self)
    }
}
