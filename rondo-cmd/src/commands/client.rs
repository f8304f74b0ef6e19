//! Commands acting on clients: attach-session, detach-client, refresh-client

use rondo_protocol::{Buffer, WireError};

use super::scan;
use crate::context::CmdCtx;
use crate::entry::{parse_as, recv_as, CmdEntry, Command};
use crate::error::ArgError;

pub static ATTACH_SESSION: CmdEntry = CmdEntry {
    name: "attach-session",
    alias: Some("attach"),
    usage: "[-d]",
    requires_client: false,
    parse: parse_as::<AttachSession>,
    recv: recv_as::<AttachSession>,
};

pub static DETACH_CLIENT: CmdEntry = CmdEntry {
    name: "detach-client",
    alias: Some("detach"),
    usage: "",
    requires_client: true,
    parse: parse_as::<DetachClient>,
    recv: recv_as::<DetachClient>,
};

pub static REFRESH_CLIENT: CmdEntry = CmdEntry {
    name: "refresh-client",
    alias: Some("refresh"),
    usage: "",
    requires_client: true,
    parse: parse_as::<RefreshClient>,
    recv: recv_as::<RefreshClient>,
};

/// Attach the invoker to the context session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachSession {
    /// Detach every other client attached to the session
    pub detach_others: bool,
}

impl Command for AttachSession {
    const HEADER_LEN: usize = 1;

    fn parse(args: &[String]) -> Result<Self, ArgError> {
        let args = scan(args, "d", 0, &ATTACH_SESSION)?;
        Ok(Self {
            detach_others: args.has('d'),
        })
    }

    fn exec(&self, ctx: &mut CmdCtx<'_>) {
        let Some(session) = ctx.target_session() else {
            return;
        };
        let Some(client) = ctx.invoker() else {
            ctx.error("no client to attach");
            return;
        };

        if self.detach_others {
            ctx.host.detach_session_clients(session, Some(client));
        }
        ctx.host.attach_client(client, session);
    }

    fn send(&self, buf: &mut Buffer) {
        buf.write_flag(self.detach_others);
    }

    fn recv(buf: &mut Buffer) -> Result<Self, WireError> {
        Ok(Self {
            detach_others: buf.read_flag()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachClient;

impl Command for DetachClient {
    const HEADER_LEN: usize = 0;

    fn parse(args: &[String]) -> Result<Self, ArgError> {
        scan(args, "", 0, &DETACH_CLIENT)?;
        Ok(Self)
    }

    fn exec(&self, ctx: &mut CmdCtx<'_>) {
        if let Some(client) = ctx.curclient {
            ctx.host.detach_client(client);
        }
    }

    fn send(&self, _buf: &mut Buffer) {}

    fn recv(_buf: &mut Buffer) -> Result<Self, WireError> {
        Ok(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshClient;

impl Command for RefreshClient {
    const HEADER_LEN: usize = 0;

    fn parse(args: &[String]) -> Result<Self, ArgError> {
        scan(args, "", 0, &REFRESH_CLIENT)?;
        Ok(Self)
    }

    fn exec(&self, ctx: &mut CmdCtx<'_>) {
        if let Some(session) = ctx.target_session() {
            ctx.host.redraw_session(session);
        }
    }

    fn send(&self, _buf: &mut Buffer) {}

    fn recv(_buf: &mut Buffer) -> Result<Self, WireError> {
        Ok(Self)
    }
}
