//! kill-window, kill-session and kill-server

use rondo_protocol::{Buffer, WireError};
use tracing::{debug, info};

use super::scan;
use crate::context::CmdCtx;
use crate::entry::{parse_as, recv_as, CmdEntry, Command};
use crate::error::ArgError;
use crate::slot::Slot;

pub static KILL_WINDOW: CmdEntry = CmdEntry {
    name: "kill-window",
    alias: Some("killw"),
    usage: "[-i index]",
    requires_client: false,
    parse: parse_as::<KillWindow>,
    recv: recv_as::<KillWindow>,
};

pub static KILL_SESSION: CmdEntry = CmdEntry {
    name: "kill-session",
    alias: None,
    usage: "",
    requires_client: false,
    parse: parse_as::<KillSession>,
    recv: recv_as::<KillSession>,
};

pub static KILL_SERVER: CmdEntry = CmdEntry {
    name: "kill-server",
    alias: None,
    usage: "",
    requires_client: false,
    parse: parse_as::<KillServer>,
    recv: recv_as::<KillServer>,
};

/// Destroy a window in every session that shows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillWindow {
    pub index: Slot,
}

impl Command for KillWindow {
    const HEADER_LEN: usize = 4;

    fn parse(args: &[String]) -> Result<Self, ArgError> {
        let args = scan(args, "i:", 0, &KILL_WINDOW)?;
        Ok(Self {
            index: Slot::parse_opt(args.value('i'))?,
        })
    }

    fn exec(&self, ctx: &mut CmdCtx<'_>) {
        let Some(session) = ctx.target_session() else {
            return;
        };
        let Some((_, window)) = ctx.find_winlink(session, self.index) else {
            return;
        };

        let survivors = ctx.sessions.kill_window(window);
        debug!(touched = survivors.len(), "killed window");
        for survivor in survivors {
            ctx.host.redraw_session(survivor);
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

/// Destroy the context session
///
/// Clients attached to it are told to exit once the command completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillSession;

impl Command for KillSession {
    const HEADER_LEN: usize = 0;

    fn parse(args: &[String]) -> Result<Self, ArgError> {
        scan(args, "", 0, &KILL_SESSION)?;
        Ok(Self)
    }

    fn exec(&self, ctx: &mut CmdCtx<'_>) {
        let Some(session) = ctx.target_session() else {
            return;
        };
        if let Some(destroyed) = ctx.sessions.destroy_session(session) {
            info!(session = destroyed.name(), "killed session");
        }
        ctx.finish();
    }

    fn send(&self, _buf: &mut Buffer) {}

    fn recv(_buf: &mut Buffer) -> Result<Self, WireError> {
        Ok(Self)
    }
}

/// Stop the server; every client is told to exit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillServer;

impl Command for KillServer {
    const HEADER_LEN: usize = 0;

    fn parse(args: &[String]) -> Result<Self, ArgError> {
        scan(args, "", 0, &KILL_SERVER)?;
        Ok(Self)
    }

    fn exec(&self, ctx: &mut CmdCtx<'_>) {
        ctx.host.shutdown();
    }

    fn send(&self, _buf: &mut Buffer) {}

    fn recv(_buf: &mut Buffer) -> Result<Self, WireError> {
        Ok(Self)
    }
}

#[cfg(test)]
mod tests {
    use rondo_protocol::ClientId;
    use rondo_session::SessionManager;

    use crate::context::testing::{run_argv, Effect};

    #[test]
    fn test_kill_window_redraws_each_survivor_once() {
        let mut sessions = SessionManager::new();
        let a = sessions.create_session(Some("a"), Some("doomed"), 0).unwrap();
        sessions.new_window(a, None, Some("keep"), 0).unwrap();
        let b = sessions.create_session(Some("b"), Some("b0"), 0).unwrap();
        let window = sessions.session(a).unwrap().window_at(0).unwrap();
        sessions.link_window(b, 1, window).unwrap();
        sessions.link_window(b, 2, window).unwrap();

        let host = run_argv(&mut sessions, Some("a"), &["kill-window", "-i", "0"]);

        assert_eq!(host.redraws(), vec![a, b]);
        assert!(sessions.window(window).is_none());
        assert_eq!(sessions.session(b).unwrap().window_count(), 1);
    }

    #[test]
    fn test_kill_last_window_destroys_session() {
        let mut sessions = SessionManager::new();
        sessions.create_session(Some("solo"), None, 0).unwrap();

        let host = run_argv(&mut sessions, Some("solo"), &["killw"]);

        assert!(host.redraws().is_empty());
        assert_eq!(sessions.session_count(), 0);
        assert_eq!(host.effects, vec![Effect::Exit(ClientId::new(1))]);
    }

    #[test]
    fn test_kill_session() {
        let mut sessions = SessionManager::new();
        sessions.create_session(Some("doomed"), None, 0).unwrap();
        sessions.create_session(Some("other"), None, 0).unwrap();

        let host = run_argv(&mut sessions, Some("doomed"), &["kill-session"]);

        assert!(host.errors().is_empty());
        assert!(sessions.find_session("doomed").is_none());
        assert_eq!(sessions.session_count(), 1);
    }

    #[test]
    fn test_kill_server() {
        let mut sessions = SessionManager::new();

        let host = run_argv(&mut sessions, None, &["kill-server"]);

        assert_eq!(host.effects, vec![Effect::Shutdown]);
    }
}
